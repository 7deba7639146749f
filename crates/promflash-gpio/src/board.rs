//! Board pin assignments
//!
//! A board maps the six roles the flasher needs onto line offsets of one
//! gpiochip. Boards are either built in (looked up by name) or loaded from
//! a TOML file:
//!
//! ```toml
//! [board]
//! name = "my_hat"
//! chip = "/dev/gpiochip0"
//!
//! [pins]
//! reset = 26
//! clock = 16
//! select = 12
//! data_in = 6    # PROM output, sampled by the host
//! data_out = 13  # host output, PROM input
//! done = 5       # optional
//! ```

use std::fs;
use std::path::Path;

use gpiocdev::line::Offset;
use serde::Deserialize;

use crate::error::{GpioError, Result};

/// Default character device when a board does not name one
pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

/// Line offsets for each role, plus the chip they live on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardPins {
    /// Board name, for logging
    pub name: String,
    /// GPIO character device path
    pub chip: String,
    /// FPGA reset, active low
    pub reset: Offset,
    /// SPI clock
    pub clock: Offset,
    /// PROM chip select, active low
    pub select: Offset,
    /// PROM data output, read by the host
    pub data_in: Offset,
    /// PROM data input, driven by the host
    pub data_out: Offset,
    /// FPGA configuration done, if wired
    pub done: Option<Offset>,
}

/// Names of the built-in boards
pub const BUILTIN_BOARDS: &[&str] = &["ice_zero_proto"];

impl BoardPins {
    /// Look up a built-in board by name
    pub fn lookup(name: &str) -> Result<Self> {
        match name {
            // iCE Zero on a Raspberry Pi header. BCM offsets; header pins
            // 37/36/32/31/33. Header pin 39 is ground on the Pi, so the
            // board has no usable done line.
            "ice_zero_proto" => Ok(Self {
                name: name.to_string(),
                chip: DEFAULT_CHIP.to_string(),
                reset: 26,
                clock: 16,
                select: 12,
                data_in: 6,
                data_out: 13,
                done: None,
            }),
            _ => Err(GpioError::UnknownBoard {
                name: name.to_string(),
                known: BUILTIN_BOARDS.join(", "),
            }),
        }
    }

    /// Load a board from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| GpioError::BoardFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut board = Self::from_toml_str(&content)?;
        if board.name.is_empty() {
            board.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(board)
    }

    /// Parse a board from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlBoardFile = toml::from_str(content).map_err(GpioError::BoardFileParse)?;
        let meta = file.board.unwrap_or_default();

        let board = Self {
            name: meta.name.unwrap_or_default(),
            chip: meta.chip.unwrap_or_else(|| DEFAULT_CHIP.to_string()),
            reset: file.pins.reset,
            clock: file.pins.clock,
            select: file.pins.select,
            data_in: file.pins.data_in,
            data_out: file.pins.data_out,
            done: file.pins.done,
        };
        board.validate()?;
        Ok(board)
    }

    /// Point the board at a different gpiochip
    ///
    /// Accepts either a device path or a bare chip number.
    pub fn with_chip(mut self, chip: &str) -> Self {
        self.chip = if chip.chars().all(|c| c.is_ascii_digit()) {
            format!("/dev/gpiochip{}", chip)
        } else {
            chip.to_string()
        };
        self
    }

    /// Every assigned line with its role name
    pub fn roles(&self) -> Vec<(&'static str, Offset)> {
        let mut roles = vec![
            ("reset", self.reset),
            ("clock", self.clock),
            ("select", self.select),
            ("data_in", self.data_in),
            ("data_out", self.data_out),
        ];
        if let Some(done) = self.done {
            roles.push(("done", done));
        }
        roles
    }

    /// Reject boards that put two roles on the same line
    pub fn validate(&self) -> Result<()> {
        let roles = self.roles();
        for (i, &(first, offset)) in roles.iter().enumerate() {
            if let Some(&(second, _)) = roles[i + 1..].iter().find(|(_, o)| *o == offset) {
                return Err(GpioError::DuplicateLine {
                    offset,
                    first,
                    second,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlBoardFile {
    board: Option<TomlBoardMeta>,
    pins: TomlPins,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlBoardMeta {
    name: Option<String>,
    chip: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlPins {
    reset: Offset,
    clock: Offset,
    select: Offset,
    data_in: Offset,
    data_out: Offset,
    #[serde(default)]
    done: Option<Offset>,
}
