//! 3-byte address encoding

use crate::error::{Error, Result};

/// Number of address bytes following an address-bearing opcode
pub const ADDRESS_BYTES: usize = 3;

/// One past the highest address reachable with a 3-byte address (16 MiB)
pub const ADDRESS_SPACE: u32 = 1 << 24;

/// Encode an address as 3 big-endian bytes
///
/// Fails if the address does not fit in 24 bits.
pub fn encode_3b(addr: u32) -> Result<[u8; ADDRESS_BYTES]> {
    if addr >= ADDRESS_SPACE {
        return Err(Error::AddressOutOfBounds { addr });
    }
    Ok([(addr >> 16) as u8, (addr >> 8) as u8, addr as u8])
}
