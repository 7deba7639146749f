//! Status register bits

use bitflags::bitflags;

bitflags! {
    /// Status register as returned by RDSR
    ///
    /// Only `WIP` drives the flashing algorithm; the rest is decoded for
    /// diagnostics.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister: u8 {
        /// Write In Progress - an erase or program is still executing
        const WIP  = 1 << 0;
        /// Write Enable Latch
        const WEL  = 1 << 1;
        /// Block protect bits BP0-BP2
        const BP   = 0b0001_1100;
        /// Top/Bottom protect
        const TB   = 1 << 5;
        /// Block protect bit BP3
        const BP3  = 1 << 6;
        /// Status Register Write Disable
        const SRWD = 1 << 7;
    }
}

impl StatusRegister {
    /// True while the device is executing an erase or program
    pub fn busy(self) -> bool {
        self.contains(Self::WIP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_bit() {
        assert!(StatusRegister::from_bits_retain(0x03).busy());
        assert!(!StatusRegister::from_bits_retain(0x02).busy());
        assert!(!StatusRegister::from_bits_retain(0xFE).busy());
    }
}
