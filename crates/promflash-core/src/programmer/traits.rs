//! Programmer trait definitions

use crate::error::{Error, Result};
use crate::spi::SpiCommand;
use alloc::vec::Vec;

/// SPI master trait
///
/// This trait represents anything that can clock a command frame out to the
/// flash and read a response back: the GPIO [`BitLink`](super::BitLink) on
/// real hardware, or an in-memory device model in tests.
///
/// A transfer is one chip-select framed exchange: all of `outbound` is sent,
/// then `inbound_len` bytes are read. Implementations must return exactly
/// `inbound_len` bytes.
pub trait SpiMaster {
    /// Perform one framed transfer
    fn transfer(&mut self, outbound: &[u8], inbound_len: usize) -> Result<Vec<u8>>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl<M: SpiMaster + ?Sized> SpiMaster for &mut M {
    fn transfer(&mut self, outbound: &[u8], inbound_len: usize) -> Result<Vec<u8>> {
        (**self).transfer(outbound, inbound_len)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// Encode `cmd`, run it through `master` and check the response length.
///
/// Every protocol function goes through here so a short read from a
/// misbehaving link is reported instead of silently truncating data.
pub fn execute<M: SpiMaster + ?Sized>(
    master: &mut M,
    cmd: &SpiCommand<'_>,
    read_len: usize,
) -> Result<Vec<u8>> {
    let outbound = cmd.encode()?;
    let response = master.transfer(&outbound, read_len)?;
    if response.len() != read_len {
        return Err(Error::SpiTransferFailed {
            expected: read_len,
            actual: response.len(),
        });
    }
    Ok(response)
}
