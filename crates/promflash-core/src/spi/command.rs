//! SPI command structure

use super::address::{encode_3b, ADDRESS_BYTES};
use crate::error::Result;
use alloc::vec::Vec;

/// A single command frame: opcode, optional 3-byte address, payload
///
/// Built fresh for every transfer and never modified afterwards.
/// The lifetime parameter `'a` ties the command to the payload it borrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// Address (if any), sent as 3 big-endian bytes
    pub address: Option<u32>,

    /// Data to write after opcode/address
    pub payload: &'a [u8],
}

impl<'a> SpiCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN, RDSR)
    pub const fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            payload: &[],
        }
    }

    /// Create an addressed command with no payload (e.g., READ, SE)
    pub const fn addressed(opcode: u8, addr: u32) -> Self {
        Self {
            opcode,
            address: Some(addr),
            payload: &[],
        }
    }

    /// Create an addressed command carrying a payload (e.g., PP)
    pub const fn write(opcode: u8, addr: u32, payload: &'a [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            payload,
        }
    }

    /// Number of bytes before the payload
    pub fn header_len(&self) -> usize {
        1 + if self.address.is_some() {
            ADDRESS_BYTES
        } else {
            0
        }
    }

    /// Serialize into the outbound byte sequence
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.header_len() + self.payload.len());
        out.push(self.opcode);
        if let Some(addr) = self.address {
            out.extend_from_slice(&encode_3b(addr)?);
        }
        out.extend_from_slice(self.payload);
        Ok(out)
    }
}
