//! SPI25 protocol implementation
//!
//! This module implements the flash command sequences on top of a raw
//! [`SpiMaster`]. Every function issues complete, chip-select framed
//! transfers and holds no state between calls.
//!
//! Erase and program sequences follow the PROM's required ordering:
//! write enable, the operation itself, write disable, then polling the
//! status register until the write-in-progress bit clears. The poll is
//! always bounded by a [`PollTimeout`].

use crate::error::{Error, Result};
use crate::programmer::{execute, SpiMaster};
use crate::spi::{opcodes, SpiCommand, StatusRegister};
use alloc::vec::Vec;

/// Upper bound for one status-polling loop
///
/// The poll gives up after `timeout_us / poll_delay_us` reads of the status
/// register (or `timeout_us` reads when `poll_delay_us` is zero), and always
/// makes at least one read.
///
/// # Typical budgets (from the N25Q128A datasheet, with headroom):
/// * Page program: 10us poll, 10ms timeout (max 5ms)
/// * 4KB subsector erase: 10ms poll, 1s timeout (max 0.8s)
/// * 64KB sector erase: 10ms poll, 4s timeout (max 3s)
/// * Bulk erase: 1s poll, 500s timeout (max 250s)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimeout {
    /// Delay in microseconds between status register polls
    pub poll_delay_us: u32,
    /// Total time budget in microseconds
    pub timeout_us: u32,
}

impl PollTimeout {
    /// Page program budget
    pub const PAGE_PROGRAM: Self = Self::new(10, 10_000);
    /// 4 KiB subsector erase budget
    pub const SUBSECTOR_ERASE: Self = Self::new(10_000, 1_000_000);
    /// 64 KiB sector erase budget
    pub const SECTOR_ERASE: Self = Self::new(10_000, 4_000_000);
    /// Whole-device erase budget
    pub const BULK_ERASE: Self = Self::new(1_000_000, 500_000_000);

    /// Create a poll budget
    pub const fn new(poll_delay_us: u32, timeout_us: u32) -> Self {
        Self {
            poll_delay_us,
            timeout_us,
        }
    }

    /// Budget that allows exactly `polls` status reads with no delay
    pub const fn polls(polls: u32) -> Self {
        Self::new(0, polls)
    }

    /// Maximum number of status reads this budget allows
    ///
    /// Never less than one: even a budget shorter than the poll delay
    /// looks at the status register once.
    pub const fn max_polls(&self) -> u32 {
        let polls = if self.poll_delay_us > 0 {
            self.timeout_us / self.poll_delay_us
        } else {
            self.timeout_us // Fall back to one poll per microsecond
        };
        if polls == 0 {
            1
        } else {
            polls
        }
    }
}

/// Read the raw identification bytes
///
/// Requests the full 17-byte RDID response and returns the first three:
/// manufacturer, device type, capacity exponent.
pub fn read_jedec_id<M: SpiMaster + ?Sized>(master: &mut M) -> Result<[u8; 3]> {
    let cmd = SpiCommand::simple(opcodes::RDID);
    let buf = execute(master, &cmd, opcodes::RDID_RESPONSE_LEN)?;
    Ok([buf[0], buf[1], buf[2]])
}

/// Read the status register
pub fn read_status<M: SpiMaster + ?Sized>(master: &mut M) -> Result<StatusRegister> {
    let cmd = SpiCommand::simple(opcodes::RDSR);
    let buf = execute(master, &cmd, 1)?;
    Ok(StatusRegister::from_bits_retain(buf[0]))
}

/// Send the Write Enable command
pub fn write_enable<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    execute(master, &SpiCommand::simple(opcodes::WREN), 0).map(drop)
}

/// Send the Write Disable command
pub fn write_disable<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    execute(master, &SpiCommand::simple(opcodes::WRDI), 0).map(drop)
}

/// Wake the device from deep power down
pub fn release_power_down<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    execute(master, &SpiCommand::simple(opcodes::RDP), 0)?;
    // tRES1 is 30us at most on 25-series parts
    master.delay_us(30);
    Ok(())
}

/// Wait for the WIP (Write In Progress) bit to clear
///
/// Every iteration issues a fresh RDSR; the status is never cached.
/// Returns the number of status reads it took, or
/// [`Error::DeviceNotReady`] once the budget is spent.
pub fn wait_ready<M: SpiMaster + ?Sized>(master: &mut M, timeout: PollTimeout) -> Result<u32> {
    let max_polls = timeout.max_polls();

    for poll in 1..=max_polls {
        let status = read_status(master)?;
        if !status.busy() {
            return Ok(poll);
        }
        if timeout.poll_delay_us > 0 {
            master.delay_us(timeout.poll_delay_us);
        }
    }

    Err(Error::DeviceNotReady { polls: max_polls })
}

/// Read data from flash using 3-byte addressing
pub fn read_3b<M: SpiMaster + ?Sized>(master: &mut M, addr: u32, len: usize) -> Result<Vec<u8>> {
    execute(master, &SpiCommand::addressed(opcodes::READ, addr), len)
}

/// Program a single page (up to 256 bytes)
///
/// The data must not cross a page boundary; the device would wrap around
/// to the start of the page.
pub fn program_page_3b<M: SpiMaster + ?Sized>(
    master: &mut M,
    addr: u32,
    data: &[u8],
    timeout: PollTimeout,
) -> Result<()> {
    debug_assert!(data.len() <= opcodes::PAGE_SIZE);

    write_enable(master)?;
    execute(master, &SpiCommand::write(opcodes::PP, addr, data), 0)?;
    write_disable(master)?;
    wait_ready(master, timeout).map(drop)
}

/// Erase a sector/subsector at the given address
pub fn erase_block<M: SpiMaster + ?Sized>(
    master: &mut M,
    opcode: u8,
    addr: u32,
    timeout: PollTimeout,
) -> Result<()> {
    write_enable(master)?;
    execute(master, &SpiCommand::addressed(opcode, addr), 0)?;
    write_disable(master)?;
    wait_ready(master, timeout).map(drop)
}

/// Erase the entire chip
pub fn bulk_erase<M: SpiMaster + ?Sized>(master: &mut M, timeout: PollTimeout) -> Result<()> {
    write_enable(master)?;
    execute(master, &SpiCommand::simple(opcodes::BE), 0)?;
    wait_ready(master, timeout)?;
    write_disable(master)
}
