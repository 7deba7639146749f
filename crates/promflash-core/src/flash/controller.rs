//! Flash controller - sequences link transfers into PROM operations

use super::progress::ProgressSteps;
use super::{DeviceIdentity, EraseTracker, Sector, WriteProgress, WriteStats};
use crate::error::{Error, Result};
use crate::programmer::SpiMaster;
use crate::protocol::{self, PollTimeout};
use crate::spi::{opcodes, StatusRegister, ADDRESS_SPACE};
use alloc::vec::Vec;

/// Poll budgets, one per operation class
///
/// Erase and program have very different worst-case durations, so each
/// gets its own ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Budget after a page program
    pub page_program: PollTimeout,
    /// Budget after a 64 KiB sector erase
    pub sector_erase: PollTimeout,
    /// Budget after a 4 KiB subsector erase
    pub subsector_erase: PollTimeout,
    /// Budget after a bulk erase
    pub bulk_erase: PollTimeout,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            page_program: PollTimeout::PAGE_PROGRAM,
            sector_erase: PollTimeout::SECTOR_ERASE,
            subsector_erase: PollTimeout::SUBSECTOR_ERASE,
            bulk_erase: PollTimeout::BULK_ERASE,
        }
    }
}

/// Result of comparing flash contents against an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Every compared byte matched
    Pass,
    /// First differing byte
    Mismatch {
        /// Flash address of the difference
        address: u32,
        /// Byte read back from the device
        read: u8,
        /// Byte the image expects
        expected: u8,
    },
}

impl VerifyOutcome {
    /// True if verification passed
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Erase/program/verify controller for one PROM behind one link
///
/// Holds nothing but the link and its poll budgets; the erase tracker
/// lives only for the duration of a single [`write_file_to_mem`] call.
///
/// [`write_file_to_mem`]: FlashController::write_file_to_mem
pub struct FlashController<M: SpiMaster> {
    master: M,
    poll: PollConfig,
}

impl<M: SpiMaster> FlashController<M> {
    /// Wrap a link with the default poll budgets
    pub fn new(master: M) -> Self {
        Self::with_poll_config(master, PollConfig::default())
    }

    /// Wrap a link with explicit poll budgets
    pub fn with_poll_config(master: M, poll: PollConfig) -> Self {
        Self { master, poll }
    }

    /// Poll budgets in use
    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Borrow the link
    pub fn master(&self) -> &M {
        &self.master
    }

    /// Mutably borrow the link
    pub fn master_mut(&mut self) -> &mut M {
        &mut self.master
    }

    /// Give the link back
    pub fn into_inner(self) -> M {
        self.master
    }

    /// Wake the PROM in case it was left in deep power down
    pub fn release_power_down(&mut self) -> Result<()> {
        protocol::release_power_down(&mut self.master)
    }

    /// Read and decode the identification bytes
    pub fn read_id(&mut self) -> Result<DeviceIdentity> {
        let id = protocol::read_jedec_id(&mut self.master)?;
        log::debug!("RDID: {:02X} {:02X} {:02X}", id[0], id[1], id[2]);
        Ok(DeviceIdentity::from_bytes(id))
    }

    /// Read the status register
    pub fn read_status(&mut self) -> Result<StatusRegister> {
        protocol::read_status(&mut self.master)
    }

    /// Erase the whole device
    pub fn bulk_erase(&mut self) -> Result<()> {
        log::info!("Bulk erase");
        protocol::bulk_erase(&mut self.master, self.poll.bulk_erase)
    }

    /// Erase the 64 KiB sector containing `addr`
    ///
    /// The command always carries the sector's start address, so any
    /// address inside the sector produces identical wire traffic.
    pub fn erase_sector_at(&mut self, addr: u32) -> Result<Sector> {
        if addr >= ADDRESS_SPACE {
            return Err(Error::AddressOutOfBounds { addr });
        }
        let sector = Sector::containing(addr);
        log::info!(
            "Erase sector {} (0x{:06x} - 0x{:06x})",
            sector.index,
            sector.start(),
            sector.end()
        );
        protocol::erase_block(
            &mut self.master,
            opcodes::SE,
            sector.start(),
            self.poll.sector_erase,
        )?;
        Ok(sector)
    }

    /// Erase sector number `index`
    pub fn erase_sector(&mut self, index: u32) -> Result<Sector> {
        let addr = super::address_of(index).ok_or(Error::AddressOutOfBounds {
            addr: index.saturating_mul(opcodes::SECTOR_SIZE),
        })?;
        self.erase_sector_at(addr)
    }

    /// Erase the 4 KiB subsector containing `addr`, returning its start
    pub fn erase_subsector_at(&mut self, addr: u32) -> Result<u32> {
        if addr >= ADDRESS_SPACE {
            return Err(Error::AddressOutOfBounds { addr });
        }
        let start = addr - addr % opcodes::SUBSECTOR_SIZE;
        log::info!(
            "Erase subsector 0x{:06x} - 0x{:06x}",
            start,
            start + (opcodes::SUBSECTOR_SIZE - 1)
        );
        protocol::erase_block(
            &mut self.master,
            opcodes::SSE,
            start,
            self.poll.subsector_erase,
        )?;
        Ok(start)
    }

    /// Read `count` bytes starting at `addr`
    pub fn read_mem(&mut self, addr: u32, count: usize) -> Result<Vec<u8>> {
        protocol::read_3b(&mut self.master, addr, count)
    }

    /// Erase-before-write an image starting at `start`
    ///
    /// The image is programmed one page at a time. The first time a page
    /// lands in a sector that has not been erased during this call, that
    /// sector is erased first; no sector is erased twice. Chunks end on
    /// page boundaries, so they never straddle a sector.
    pub fn write_file_to_mem<P: WriteProgress + ?Sized>(
        &mut self,
        data: &[u8],
        start: u32,
        progress: &mut P,
    ) -> Result<WriteStats> {
        let end = start as u64 + data.len() as u64;
        if end > ADDRESS_SPACE as u64 {
            return Err(Error::AddressOutOfBounds {
                addr: u32::try_from(end - 1).unwrap_or(u32::MAX),
            });
        }

        let mut tracker = EraseTracker::new();
        let mut steps = ProgressSteps::new(data.len());
        let mut stats = WriteStats::default();
        let mut addr = start;
        let mut remaining = data;

        while !remaining.is_empty() {
            let sector = Sector::containing(addr);
            if tracker.needs_erase(sector) {
                progress.erasing(sector);
                self.erase_sector_at(addr)?;
                tracker.mark_erased(sector);
                stats.sectors_erased.push(sector);
            }

            let page_room = opcodes::PAGE_SIZE - addr as usize % opcodes::PAGE_SIZE;
            let (chunk, rest) = remaining.split_at(page_room.min(remaining.len()));

            protocol::program_page_3b(&mut self.master, addr, chunk, self.poll.page_program)?;

            stats.pages_programmed += 1;
            stats.bytes_written += chunk.len();
            steps.advance(stats.bytes_written, progress);

            addr += chunk.len() as u32;
            remaining = rest;
        }

        log::debug!(
            "wrote {} bytes in {} pages, {} sectors erased",
            stats.bytes_written,
            stats.pages_programmed,
            tracker.len()
        );
        progress.complete(&stats);
        Ok(stats)
    }

    /// Compare flash contents at `start` against `data`
    ///
    /// Compares `byte_count` bytes, or all of `data` when `None`.
    pub fn verify(
        &mut self,
        data: &[u8],
        start: u32,
        byte_count: Option<usize>,
    ) -> Result<VerifyOutcome> {
        let count = byte_count.unwrap_or(data.len());
        if count > data.len() {
            return Err(Error::LengthExceedsImage {
                requested: count,
                available: data.len(),
            });
        }

        let read_back = self.read_mem(start, count)?;
        let mismatch = read_back
            .iter()
            .zip(&data[..count])
            .position(|(read, expected)| read != expected);

        Ok(match mismatch {
            Some(index) => VerifyOutcome::Mismatch {
                address: start + index as u32,
                read: read_back[index],
                expected: data[index],
            },
            None => VerifyOutcome::Pass,
        })
    }
}
