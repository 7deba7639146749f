//! SPI types and command structures
//!
//! This module provides the command frame, the 3-byte address encoding,
//! the status register bits and the fixed opcode table.

mod address;
mod command;
pub mod opcodes;
mod status;

pub use address::{encode_3b, ADDRESS_BYTES, ADDRESS_SPACE};
pub use command::SpiCommand;
pub use opcodes::*;
pub use status::StatusRegister;
