//! SPI flash opcodes
//!
//! The fixed command set of the Micron N25Q family PROMs found next to
//! Lattice iCE40 FPGAs. Only these opcodes are ever put on the wire.

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer, device type, capacity, extended bytes)
pub const RDID: u8 = 0x9F;
/// Number of bytes requested after RDID (3 ID bytes + extended ID + UID)
pub const RDID_RESPONSE_LEN: usize = 17;

// ============================================================================
// Read / program
// ============================================================================

/// Read Data with 3-byte address
pub const READ: u8 = 0x03;
/// Page Program with 3-byte address
pub const PP: u8 = 0x02;

// ============================================================================
// Status register and write control
// ============================================================================

/// Read Status Register
pub const RDSR: u8 = 0x05;
/// Write Enable - required before any program/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears the write enable latch
pub const WRDI: u8 = 0x04;

// ============================================================================
// Power management
// ============================================================================

/// Release from Deep Power Down
pub const RDP: u8 = 0xAB;

// ============================================================================
// Erase
// ============================================================================

/// Subsector Erase (4 KiB)
pub const SSE: u8 = 0x20;
/// Sector Erase (64 KiB)
pub const SE: u8 = 0xD8;
/// Bulk Erase (entire device)
pub const BE: u8 = 0xC7;

// ============================================================================
// Geometry
// ============================================================================

/// Largest payload of a single Page Program command
pub const PAGE_SIZE: usize = 256;
/// Erase granularity of Sector Erase
pub const SECTOR_SIZE: u32 = 64 * 1024;
/// Erase granularity of Subsector Erase
pub const SUBSECTOR_SIZE: u32 = 4 * 1024;

// A page-aligned chunk can never cross a sector boundary.
const _: () = assert!(SECTOR_SIZE as usize % PAGE_SIZE == 0);
const _: () = assert!(SECTOR_SIZE % SUBSECTOR_SIZE == 0);
