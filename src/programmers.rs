//! Link construction from the command line
//!
//! Resolves `--board`/`--board-file`/`--gpiochip` into a pin driver and
//! wraps it in a [`BitLink`]. The `sim` board swaps the GPIO driver for the
//! pin-level PROM simulator so the whole stack can run without hardware.

use promflash_core::programmer::{BitLink, LinkConfig};
use promflash_gpio::{BoardPins, GpioPins};
use promflash_sim::{SimFlash, SimPins};

use crate::cli::{Cli, SIM_BOARD};
use crate::error::FlashError;

/// A link over whichever pins the user selected
pub enum Link {
    /// Real GPIO lines
    Gpio(BitLink<GpioPins>),
    /// Simulated PROM
    Sim(BitLink<SimPins>),
}

/// Resolve the board arguments into pin assignments
///
/// Returns `None` for the simulator.
pub fn resolve_board(cli: &Cli) -> Result<Option<BoardPins>, FlashError> {
    let board = match &cli.board_file {
        Some(path) => BoardPins::from_toml_file(path)?,
        None if cli.board == SIM_BOARD => {
            if cli.gpiochip.is_some() {
                log::warn!("--gpiochip has no effect with the {} board", SIM_BOARD);
            }
            return Ok(None);
        }
        None => BoardPins::lookup(&cli.board)?,
    };

    Ok(Some(match &cli.gpiochip {
        Some(chip) => board.with_chip(chip),
        None => board,
    }))
}

/// Claim the pins and build the link
pub fn open_link(cli: &Cli) -> Result<Link, FlashError> {
    let config = LinkConfig::default().with_half_period_ns(cli.half_period_ns);

    match resolve_board(cli)? {
        Some(board) => {
            let pins = GpioPins::open(&board)?;
            Ok(Link::Gpio(BitLink::new(pins, config)))
        }
        None => {
            log::info!("Using simulated PROM");
            let pins = SimPins::new(SimFlash::new_default());
            Ok(Link::Sim(BitLink::new(pins, config)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("promflash").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_sim_board_has_no_pins() {
        assert!(resolve_board(&cli(&["-b", "sim", "top.bin"]))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_default_board() {
        let board = resolve_board(&cli(&["top.bin"])).unwrap().unwrap();
        assert_eq!(board.name, "ice_zero_proto");
    }

    #[test]
    fn test_gpiochip_override() {
        let board = resolve_board(&cli(&["--gpiochip", "1", "top.bin"]))
            .unwrap()
            .unwrap();
        assert_eq!(board.chip, "/dev/gpiochip1");
    }

    #[test]
    fn test_unknown_board_is_a_config_error() {
        let err = resolve_board(&cli(&["-b", "nope", "top.bin"])).unwrap_err();
        assert!(matches!(
            err,
            FlashError::Gpio(promflash_gpio::GpioError::UnknownBoard { .. })
        ));
    }

    #[test]
    fn test_sim_link_opens() {
        let link = open_link(&cli(&["-b", "sim", "--half-period-ns", "0", "top.bin"])).unwrap();
        assert!(matches!(link, Link::Sim(_)));
    }
}
