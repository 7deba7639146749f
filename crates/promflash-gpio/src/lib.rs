//! promflash-gpio - Linux GPIO pins for promflash
//!
//! This crate drives the PROM's SPI lines and the FPGA's reset line through
//! the Linux GPIO character device (gpiocdev), and holds the table of known
//! board wirings.
//!
//! # Example
//!
//! ```no_run
//! use promflash_core::flash::FlashController;
//! use promflash_core::programmer::{BitLink, LinkConfig};
//! use promflash_gpio::{BoardPins, GpioPins};
//!
//! let board = BoardPins::lookup("ice_zero_proto")?;
//! let pins = GpioPins::open(&board)?;
//! let mut flash = FlashController::new(BitLink::new(pins, LinkConfig::default()));
//! println!("{}", flash.read_id()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Wiring
//!
//! | Role     | Direction | Description                           |
//! |----------|-----------|---------------------------------------|
//! | reset    | output    | FPGA reset, held low while flashing   |
//! | select   | output    | PROM chip select, active low          |
//! | clock    | output    | SPI clock, idles low                  |
//! | data_out | output    | Host to PROM (MOSI)                   |
//! | data_in  | input     | PROM to host (MISO)                   |
//! | done     | input     | FPGA configuration done, optional     |
//!
//! Holding reset low keeps the FPGA off the flash bus. When the lines are
//! released at the end of a run the FPGA leaves reset and boots from the
//! new image.
//!
//! # System Requirements
//!
//! - Linux kernel 4.8+ with GPIO character device support (kernel 5.5+ for v2 API)
//! - Access to `/dev/gpiochipN` devices (may require root or udev rules)

pub mod board;
pub mod device;
pub mod error;

pub use board::{BoardPins, BUILTIN_BOARDS, DEFAULT_CHIP};
pub use device::GpioPins;
pub use error::{GpioError, Result};
