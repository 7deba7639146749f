//! Sector geometry and erase bookkeeping

use crate::spi::opcodes::SECTOR_SIZE;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;

/// Index of the 64 KiB sector containing `addr`
pub const fn sector_of(addr: u32) -> u32 {
    addr / SECTOR_SIZE
}

/// Start address of sector `sector`, `None` if it does not fit a u32
pub const fn address_of(sector: u32) -> Option<u32> {
    sector.checked_mul(SECTOR_SIZE)
}

/// A 64 KiB erase sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sector {
    /// Sector index, counted from address 0
    pub index: u32,
}

impl Sector {
    /// The sector that contains `addr`
    pub const fn containing(addr: u32) -> Self {
        Self {
            index: sector_of(addr),
        }
    }

    /// First address of the sector
    ///
    /// Sectors built with [`Sector::containing`] always fit; a hand-built
    /// index past the u32 range wraps.
    pub const fn start(&self) -> u32 {
        self.index.wrapping_mul(SECTOR_SIZE)
    }

    /// Last address of the sector (inclusive)
    pub const fn end(&self) -> u32 {
        self.start() + (SECTOR_SIZE - 1)
    }

    /// Whether `addr` falls inside this sector
    pub const fn contains(&self, addr: u32) -> bool {
        sector_of(addr) == self.index
    }
}

/// Sectors erased during one write session
///
/// Scoped to a single image write and never persisted: an interrupted run
/// has to start over and erase everything it touches again.
#[derive(Debug, Clone, Default)]
pub struct EraseTracker {
    erased: BTreeSet<u32>,
}

impl EraseTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `sector` still has to be erased before it is programmed
    pub fn needs_erase(&self, sector: Sector) -> bool {
        !self.erased.contains(&sector.index)
    }

    /// Record `sector` as erased. Returns false if it was already recorded.
    pub fn mark_erased(&mut self, sector: Sector) -> bool {
        self.erased.insert(sector.index)
    }

    /// Number of sectors erased so far
    pub fn len(&self) -> usize {
        self.erased.len()
    }

    /// True if nothing has been erased yet
    pub fn is_empty(&self) -> bool {
        self.erased.is_empty()
    }

    /// Erased sectors in ascending order
    pub fn sectors(&self) -> Vec<Sector> {
        self.erased.iter().map(|&index| Sector { index }).collect()
    }
}
