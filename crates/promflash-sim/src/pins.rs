//! Pin-level front end for [`SimFlash`]
//!
//! Decodes clock edges the same way the PROM does in SPI mode 0: MOSI is
//! latched on the rising edge, MISO changes after the falling edge.

use core::time::Duration;
use std::cell::Cell;
use std::rc::Rc;

use promflash_core::programmer::BitbangPins;

use crate::SimFlash;

/// Everything clocked in during one chip-select assertion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameTrace {
    /// Whole bytes seen on MOSI
    pub mosi: Vec<u8>,
    /// Rising clock edges while selected
    pub clocks: u32,
}

/// Shared view of whether a [`SimPins`] has been released
///
/// Stays readable after the pins (and the link owning them) are dropped.
#[derive(Debug, Clone)]
pub struct ReleaseWatch(Rc<Cell<bool>>);

impl ReleaseWatch {
    /// Whether the pins were released
    pub fn is_released(&self) -> bool {
        self.0.get()
    }
}

/// Simulated pin driver wired straight to a [`SimFlash`]
pub struct SimPins {
    flash: SimFlash,
    cs_active: bool,
    sck: bool,
    mosi: bool,
    miso: bool,
    in_shift: u8,
    in_bits: u8,
    out_shift: u8,
    out_bits: u8,
    reset_asserted: bool,
    released: Rc<Cell<bool>>,
    frames: Vec<FrameTrace>,
    clocks_while_deselected: u32,
    delayed: Duration,
}

impl SimPins {
    /// Wire up a simulated device
    pub fn new(flash: SimFlash) -> Self {
        Self {
            flash,
            cs_active: false,
            sck: false,
            mosi: false,
            miso: true,
            in_shift: 0,
            in_bits: 0,
            out_shift: 0,
            out_bits: 0,
            reset_asserted: false,
            released: Rc::new(Cell::new(false)),
            frames: Vec::new(),
            clocks_while_deselected: 0,
            delayed: Duration::ZERO,
        }
    }

    /// The device behind the pins
    pub fn flash(&self) -> &SimFlash {
        &self.flash
    }

    /// Mutable access to the device behind the pins
    pub fn flash_mut(&mut self) -> &mut SimFlash {
        &mut self.flash
    }

    /// One entry per chip-select assertion so far
    pub fn frames(&self) -> &[FrameTrace] {
        &self.frames
    }

    /// Rising clock edges seen with chip select inactive
    pub fn clocks_while_deselected(&self) -> u32 {
        self.clocks_while_deselected
    }

    /// Whether chip select is currently asserted
    pub fn cs_active(&self) -> bool {
        self.cs_active
    }

    /// Whether the FPGA reset line is currently asserted
    pub fn reset_asserted(&self) -> bool {
        self.reset_asserted
    }

    /// Whether [`BitbangPins::release`] has been called
    pub fn is_released(&self) -> bool {
        self.released.get()
    }

    /// Handle that reports release even after these pins are gone
    pub fn release_watch(&self) -> ReleaseWatch {
        ReleaseWatch(Rc::clone(&self.released))
    }

    /// Sum of all requested delays
    pub fn total_delay(&self) -> Duration {
        self.delayed
    }

    fn rising_edge(&mut self) {
        if !self.cs_active {
            self.clocks_while_deselected += 1;
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.clocks += 1;
        }

        self.in_shift = (self.in_shift << 1) | self.mosi as u8;
        self.in_bits += 1;
        if self.in_bits == 8 {
            let byte = self.in_shift;
            self.in_bits = 0;
            self.in_shift = 0;
            if let Some(frame) = self.frames.last_mut() {
                frame.mosi.push(byte);
            }
            self.flash.shift_in(byte);
        }
    }

    fn falling_edge(&mut self) {
        if !self.cs_active {
            return;
        }

        if self.in_bits == 0 {
            match self.flash.output_byte() {
                Some(byte) => {
                    self.out_shift = byte;
                    self.out_bits = 8;
                }
                None => self.out_bits = 0,
            }
        }

        if self.out_bits > 0 {
            self.miso = self.out_shift & 0x80 != 0;
            self.out_shift <<= 1;
            self.out_bits -= 1;
        } else {
            // Nobody drives the line; the pull-up wins
            self.miso = true;
        }
    }
}

impl BitbangPins for SimPins {
    fn set_cs(&mut self, active: bool) {
        if active == self.cs_active {
            return;
        }
        self.cs_active = active;

        if active {
            self.in_shift = 0;
            self.in_bits = 0;
            self.out_bits = 0;
            self.miso = true;
            self.frames.push(FrameTrace::default());
            self.flash.begin_frame();
        } else {
            if self.in_bits != 0 {
                log::warn!("sim: frame ended mid-byte after {} bits", self.in_bits);
            }
            self.flash.end_frame();
        }
    }

    fn set_sck(&mut self, high: bool) {
        if high == self.sck {
            return;
        }
        self.sck = high;
        if high {
            self.rising_edge();
        } else {
            self.falling_edge();
        }
    }

    fn set_mosi(&mut self, high: bool) {
        self.mosi = high;
    }

    fn get_miso(&self) -> bool {
        self.miso
    }

    fn set_reset(&mut self, asserted: bool) {
        self.reset_asserted = asserted;
    }

    fn get_done(&self) -> Option<bool> {
        Some(!self.reset_asserted)
    }

    fn delay(&mut self, duration: Duration) {
        self.delayed += duration;
    }

    fn release(&mut self) {
        self.released.set(true);
        self.reset_asserted = false;
        self.cs_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimConfig;
    use promflash_core::flash::{FlashController, NoProgress, VerifyOutcome};
    use promflash_core::programmer::{BitLink, LinkConfig};
    use promflash_core::spi::opcodes;

    fn link() -> BitLink<SimPins> {
        BitLink::new(
            SimPins::new(SimFlash::new_default()),
            LinkConfig::default().with_half_period_ns(0),
        )
    }

    #[test]
    fn test_rdid_over_pins() {
        let mut link = link();
        assert!(!link.pins().cs_active());

        let rx = link.transfer(&[opcodes::RDID], 17);
        assert_eq!(rx.len(), 17);
        assert_eq!(rx[..3], [0x20, 0xBA, 0x18]);

        let frames = link.pins().frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].mosi[0], opcodes::RDID);
        assert_eq!(frames[0].clocks, 18 * 8);
        assert!(!link.pins().cs_active());
        assert_eq!(link.pins().clocks_while_deselected(), 0);
    }

    #[test]
    fn test_fpga_held_in_reset_until_release() {
        let mut link = link();
        assert!(link.pins().reset_asserted());
        assert_eq!(link.done_signal(), Some(false));

        link.release();
        assert!(link.pins().is_released());
        assert!(!link.pins().reset_asserted());
        assert_eq!(link.done_signal(), Some(true));
    }

    #[test]
    fn test_release_watch_outlives_link() {
        let link = link();
        let watch = link.pins().release_watch();
        assert!(!watch.is_released());
        drop(link);
        assert!(watch.is_released());
    }

    #[test]
    fn test_unanswered_read_floats_high() {
        let mut link = link();
        let rx = link.transfer(&[opcodes::WREN], 2);
        assert_eq!(rx, vec![0xFF, 0xFF]);
    }

    #[test]
    fn test_write_and_verify_over_pins() {
        let mut flash = FlashController::new(link());
        let id = flash.read_id().unwrap();
        assert!(id.is_plausible());

        // Straddles the boundary between sectors 0 and 1
        let data: Vec<u8> = (0..600u32).map(|i| (i * 7 + 3) as u8).collect();
        let start = 0xFF00;
        let stats = flash.write_file_to_mem(&data, start, &mut NoProgress).unwrap();
        assert_eq!(stats.sectors_erased.len(), 2);

        assert_eq!(flash.verify(&data, start, None).unwrap(), VerifyOutcome::Pass);

        let sim = flash.master().pins().flash();
        assert_eq!(&sim.data()[start as usize..start as usize + 600], &data[..]);
        assert_eq!(sim.sector_erases(), vec![0x0000, 0x1_0000]);
        assert_eq!(sim.rejected(), 0);
        assert_eq!(flash.master().pins().clocks_while_deselected(), 0);
    }

    #[test]
    fn test_half_period_reaches_pins() {
        let mut link = BitLink::new(
            SimPins::new(SimFlash::new(SimConfig::default())),
            LinkConfig::default().with_half_period_ns(1000),
        );
        link.transfer(&[opcodes::RDSR], 1);
        // 16 bits at two half periods each, plus three around chip select
        assert_eq!(link.pins().total_delay(), Duration::from_nanos(35 * 1000));
    }
}
