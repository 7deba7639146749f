//! Errors surfaced by the promflash binary

use std::path::PathBuf;

use promflash_core::flash::DeviceIdentity;
use thiserror::Error;

/// Anything that stops a flashing run before a verify verdict
#[derive(Debug, Error)]
pub enum FlashError {
    #[error("Failed to read image '{}': {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Gpio(#[from] promflash_gpio::GpioError),

    #[error(transparent)]
    Flash(#[from] promflash_core::Error),

    #[error("PROM ID {0:02x?} looks like an empty bus; check the wiring or pass --force")]
    ImplausibleDevice([u8; 3]),

    #[error(
        "Image of {size} bytes at 0x{start:06x} does not fit in a {capacity} byte PROM"
    )]
    ImageTooLarge {
        size: usize,
        start: u32,
        capacity: u64,
    },
}

impl FlashError {
    /// Error for an identity that fails the plausibility check
    pub fn implausible(id: &DeviceIdentity) -> Self {
        Self::ImplausibleDevice([id.manufacturer, id.device, id.capacity_exponent])
    }
}
