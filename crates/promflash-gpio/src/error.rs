//! Error types for board configuration and GPIO line access

use std::path::PathBuf;

use thiserror::Error;

/// Board and GPIO errors
///
/// All of these happen before the first clock edge; none of them leave the
/// PROM half written.
#[derive(Debug, Error)]
pub enum GpioError {
    /// Board name not in the built-in table
    #[error("Unknown board '{name}' (known boards: {known})")]
    UnknownBoard { name: String, known: String },

    /// Board file could not be read
    #[error("Failed to read board file '{}': {source}", .path.display())]
    BoardFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Board file is not valid TOML or is missing a pin
    #[error("Invalid board file: {0}")]
    BoardFileParse(#[source] toml::de::Error),

    /// Two roles share one line
    #[error("Line {offset} is assigned to both {first} and {second}")]
    DuplicateLine {
        offset: u32,
        first: &'static str,
        second: &'static str,
    },

    /// Failed to request GPIO lines
    #[error("Failed to request GPIO lines on '{chip}': {source}")]
    LineRequestFailed {
        chip: String,
        #[source]
        source: gpiocdev::Error,
    },
}

/// Result type for GPIO operations
pub type Result<T> = std::result::Result<T, GpioError>;
