//! Error types for promflash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // SPI errors
    /// The link returned a different number of bytes than requested
    SpiTransferFailed {
        /// Number of bytes requested
        expected: usize,
        /// Number of bytes actually returned
        actual: usize,
    },

    // Device errors
    /// The write-in-progress bit did not clear within the poll budget
    DeviceNotReady {
        /// Number of status reads issued before giving up
        polls: u32,
    },

    /// The link's pins were already released
    LinkReleased,

    // Address/size errors
    /// Address does not fit the 3-byte address phase
    AddressOutOfBounds {
        /// Offending address
        addr: u32,
    },
    /// Requested verify length is longer than the source image
    LengthExceedsImage {
        /// Requested byte count
        requested: usize,
        /// Length of the source image
        available: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransferFailed { expected, actual } => write!(
                f,
                "SPI transfer failed: expected {} bytes, got {}",
                expected, actual
            ),
            Self::DeviceNotReady { polls } => write!(
                f,
                "device not ready in time: still busy after {} status polls",
                polls
            ),
            Self::LinkReleased => write!(f, "transfer on a link whose pins were released"),
            Self::AddressOutOfBounds { addr } => {
                write!(f, "address 0x{:08X} out of 24-bit range", addr)
            }
            Self::LengthExceedsImage {
                requested,
                available,
            } => write!(
                f,
                "cannot verify {} bytes against a {} byte image",
                requested, available
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
