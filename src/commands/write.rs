//! Write command implementation
//!
//! One run: wake the PROM, identify it, erase-before-write the image,
//! verify, then release the pins so the FPGA boots.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use promflash_core::flash::{FlashController, Sector, VerifyOutcome, WriteProgress, WriteStats};
use promflash_core::programmer::{BitLink, BitbangPins};
use promflash_core::spi::ADDRESS_SPACE;
use std::time::Duration;

use crate::error::FlashError;

/// What the user asked for besides the image itself
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Flash address of the first image byte
    pub address: u32,
    /// Compare only this many bytes; `None` compares the whole image
    pub verify_bytes: Option<usize>,
    /// Skip the verify step
    pub no_verify: bool,
    /// Flash even if the ID looks like an empty bus
    pub force: bool,
}

/// Final verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Image written and verified (or verify skipped)
    Pass,
    /// Verify found a difference
    Fail,
}

/// Progress reporter using indicatif progress bars
struct IndicatifProgress {
    multi: MultiProgress,
    current_bar: Option<ProgressBar>,
    total: usize,
}

impl IndicatifProgress {
    fn new(total: usize) -> Self {
        Self {
            multi: MultiProgress::new(),
            current_bar: None,
            total,
        }
    }

    fn bar(&mut self) -> &ProgressBar {
        self.current_bar.get_or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(self.total as u64));
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb.set_message("Writing");
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        })
    }
}

impl WriteProgress for IndicatifProgress {
    fn erasing(&mut self, sector: Sector) {
        self.bar().set_message(format!("Erasing sector {}", sector.index));
    }

    fn write_progress(&mut self, _percent: u8, bytes_written: usize) {
        let pb = self.bar();
        pb.set_message("Writing");
        pb.set_position(bytes_written as u64);
    }

    fn complete(&mut self, stats: &WriteStats) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_with_message("Write complete");
        }
        println!(
            "Wrote {} bytes in {} pages, {} sectors erased",
            stats.bytes_written,
            stats.pages_programmed,
            stats.sectors_erased.len()
        );
    }
}

fn describe_done(done: Option<bool>) -> &'static str {
    match done {
        Some(true) => "high",
        Some(false) => "low",
        None => "not wired",
    }
}

/// Check the image against the device and the 3-byte address space
fn check_fits(data: &[u8], start: u32, capacity: Option<u64>) -> Result<(), FlashError> {
    let end = start as u64 + data.len() as u64;
    let limit = capacity.map_or(ADDRESS_SPACE as u64, |c| c.min(ADDRESS_SPACE as u64));
    if end > limit {
        return Err(FlashError::ImageTooLarge {
            size: data.len(),
            start,
            capacity: limit,
        });
    }
    Ok(())
}

/// Run the write command
///
/// Takes the link by value: it is released when this returns, on the error
/// paths too.
pub fn run_write<P: BitbangPins>(
    link: BitLink<P>,
    data: &[u8],
    opts: &WriteOptions,
) -> Result<RunOutcome, FlashError> {
    log::info!("FPGA done signal: {}", describe_done(link.done_signal()));

    let mut flash = FlashController::new(link);

    flash.release_power_down()?;

    let id = flash.read_id()?;
    println!("Found: {}", id);
    if id.is_plausible() {
        check_fits(data, opts.address, id.capacity_bytes())?;
    } else if opts.force {
        log::warn!("PROM ID looks wrong, continuing because of --force");
        check_fits(data, opts.address, None)?;
    } else {
        return Err(FlashError::implausible(&id));
    }

    if data.is_empty() {
        log::warn!("Image is empty, nothing to write");
    }

    println!(
        "Writing {} bytes at 0x{:06x}",
        data.len(),
        opts.address
    );
    let mut progress = IndicatifProgress::new(data.len());
    flash.write_file_to_mem(data, opts.address, &mut progress)?;

    let outcome = if opts.no_verify {
        println!("Skipping verify");
        RunOutcome::Pass
    } else {
        let count = opts.verify_bytes.unwrap_or(data.len());
        println!("Verifying {} bytes", count);
        match flash.verify(data, opts.address, opts.verify_bytes)? {
            VerifyOutcome::Pass => {
                println!("Verify PASSED");
                RunOutcome::Pass
            }
            VerifyOutcome::Mismatch {
                address,
                read,
                expected,
            } => {
                eprintln!(
                    "Mismatch at 0x{:06x}: read 0x{:02x}, expected 0x{:02x}",
                    address, read, expected
                );
                eprintln!("Verify FAILED");
                RunOutcome::Fail
            }
        }
    };

    let mut link = flash.into_inner();
    link.release();

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use promflash_core::programmer::LinkConfig;
    use promflash_sim::{ReleaseWatch, SimConfig, SimFlash, SimPins};

    fn sim_link(config: SimConfig) -> BitLink<SimPins> {
        watched_link(config).0
    }

    fn watched_link(config: SimConfig) -> (BitLink<SimPins>, ReleaseWatch) {
        let pins = SimPins::new(SimFlash::new(config));
        let watch = pins.release_watch();
        let link = BitLink::new(pins, LinkConfig::default().with_half_period_ns(0));
        (link, watch)
    }

    fn image(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_run_passes_on_sim() {
        let opts = WriteOptions {
            address: 0x1_0000,
            ..Default::default()
        };
        let (link, watch) = watched_link(SimConfig::default());
        let outcome = run_write(link, &image(1000), &opts).unwrap();
        assert_eq!(outcome, RunOutcome::Pass);
        assert!(watch.is_released());
    }

    #[test]
    fn test_verify_mismatch_fails_and_releases() {
        let config = SimConfig {
            stuck_at_zero: Some(0x1_0005),
            ..Default::default()
        };
        let opts = WriteOptions {
            address: 0x1_0000,
            ..Default::default()
        };
        let data = image(64);
        assert_ne!(data[5], 0x00);

        let (link, watch) = watched_link(config);
        let outcome = run_write(link, &data, &opts).unwrap();
        assert_eq!(outcome, RunOutcome::Fail);
        assert!(watch.is_released());
    }

    #[test]
    fn test_mismatch_outside_verify_window_passes() {
        let config = SimConfig {
            stuck_at_zero: Some(0x20),
            ..Default::default()
        };
        let opts = WriteOptions {
            verify_bytes: Some(0x20),
            ..Default::default()
        };
        let (link, watch) = watched_link(config);
        assert_eq!(run_write(link, &image(64), &opts).unwrap(), RunOutcome::Pass);
        assert!(watch.is_released());
    }

    #[test]
    fn test_silent_bus_is_refused() {
        let config = SimConfig {
            manufacturer_id: 0xFF,
            ..Default::default()
        };
        let (link, watch) = watched_link(config);
        let err = run_write(link, &image(16), &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, FlashError::ImplausibleDevice([0xFF, 0xBA, 0x18])));
        assert!(watch.is_released());
    }

    #[test]
    fn test_force_overrides_plausibility() {
        let config = SimConfig {
            manufacturer_id: 0x00,
            ..Default::default()
        };
        let opts = WriteOptions {
            force: true,
            ..Default::default()
        };
        assert_eq!(
            run_write(sim_link(config), &image(16), &opts).unwrap(),
            RunOutcome::Pass
        );
    }

    #[test]
    fn test_image_larger_than_device() {
        let config = SimConfig {
            capacity_exponent: 0x10,
            ..Default::default()
        };
        let opts = WriteOptions {
            address: 0xFF00,
            ..Default::default()
        };
        let err = run_write(sim_link(config), &image(512), &opts).unwrap_err();
        assert!(matches!(
            err,
            FlashError::ImageTooLarge {
                size: 512,
                start: 0xFF00,
                capacity: 0x1_0000
            }
        ));
    }

    #[test]
    fn test_verify_bytes_past_image() {
        let opts = WriteOptions {
            verify_bytes: Some(17),
            ..Default::default()
        };
        let err = run_write(sim_link(SimConfig::default()), &image(16), &opts).unwrap_err();
        assert!(matches!(
            err,
            FlashError::Flash(promflash_core::Error::LengthExceedsImage { .. })
        ));
    }

    #[test]
    fn test_check_fits() {
        assert!(check_fits(&[0; 16], 0xFF_FFF0, None).is_ok());
        assert!(check_fits(&[0; 17], 0xFF_FFF0, None).is_err());
        assert!(check_fits(&[0; 16], 0, Some(1 << 40)).is_ok());
    }
}
