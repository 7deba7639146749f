//! Device identification decoding

use core::fmt;

/// Manufacturer code of Micron Technology
pub const MICRON: u8 = 0x20;
/// Device type code of the N25Q128A
pub const N25Q128A: u8 = 0xBA;

/// Identity bytes returned by RDID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Byte 0: JEDEC manufacturer code
    pub manufacturer: u8,
    /// Byte 1: device type
    pub device: u8,
    /// Byte 2: log2 of the capacity in bytes
    pub capacity_exponent: u8,
}

impl DeviceIdentity {
    /// Decode the first three RDID bytes
    pub const fn from_bytes(id: [u8; 3]) -> Self {
        Self {
            manufacturer: id[0],
            device: id[1],
            capacity_exponent: id[2],
        }
    }

    /// Manufacturer name, or the code as two hex digits
    pub fn manufacturer_name(&self) -> Name {
        match self.manufacturer {
            MICRON => Name::Known("Micron"),
            code => Name::Unknown(code),
        }
    }

    /// Device name, or the code as two hex digits
    pub fn device_name(&self) -> Name {
        match self.device {
            N25Q128A => Name::Known("N25Q128A"),
            code => Name::Unknown(code),
        }
    }

    /// Capacity in bytes (`2^exponent`), `None` if it does not fit a u64
    pub fn capacity_bytes(&self) -> Option<u64> {
        1u64.checked_shl(self.capacity_exponent as u32)
    }

    /// Capacity in MiB, truncated
    pub fn capacity_mb(&self) -> u64 {
        self.capacity_bytes().map_or(0, |bytes| bytes / (1024 * 1024))
    }

    /// False when the bytes look like an idle bus rather than a device
    ///
    /// With nothing driving MISO the link reads all zeros or all ones.
    pub fn is_plausible(&self) -> bool {
        !matches!(self.manufacturer, 0x00 | 0xFF) && self.capacity_bytes().is_some()
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} MBytes",
            self.manufacturer_name(),
            self.device_name(),
            self.capacity_mb()
        )
    }
}

/// A lookup result that prints as the name or as the raw code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Name {
    /// Code found in the lookup table
    Known(&'static str),
    /// Code not in the table
    Unknown(u8),
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(name) => f.write_str(name),
            Self::Unknown(code) => write!(f, "{:02x}", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_micron_n25q128a() {
        let id = DeviceIdentity::from_bytes([0x20, 0xBA, 0x18]);
        assert_eq!(id.manufacturer_name(), Name::Known("Micron"));
        assert_eq!(id.device_name(), Name::Known("N25Q128A"));
        assert_eq!(id.capacity_bytes(), Some(16 * 1024 * 1024));
        assert_eq!(id.capacity_mb(), 16);
        assert_eq!(id.to_string(), "Micron N25Q128A 16 MBytes");
        assert!(id.is_plausible());
    }

    #[test]
    fn test_unknown_codes_render_as_hex() {
        let id = DeviceIdentity::from_bytes([0x01, 0x0A, 0x14]);
        assert_eq!(id.manufacturer_name().to_string(), "01");
        assert_eq!(id.device_name().to_string(), "0a");
        assert_eq!(id.capacity_mb(), 1);
    }

    #[test]
    fn test_small_capacity_truncates() {
        let id = DeviceIdentity::from_bytes([0x20, 0xBA, 0x10]);
        assert_eq!(id.capacity_bytes(), Some(65536));
        assert_eq!(id.capacity_mb(), 0);
    }

    #[test]
    fn test_idle_bus_is_implausible() {
        assert!(!DeviceIdentity::from_bytes([0xFF, 0xFF, 0xFF]).is_plausible());
        assert!(!DeviceIdentity::from_bytes([0x00, 0x00, 0x00]).is_plausible());
    }
}
