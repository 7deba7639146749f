//! promflash-sim - In-memory PROM emulator for testing
//!
//! This crate models a Micron N25Q-style serial NOR PROM closely enough to
//! run the whole flashing flow without hardware:
//!
//! - [`SimFlash`] is the device. It is fed one chip-select framed command at
//!   a time, byte by byte, and implements
//!   [`SpiMaster`] directly for byte-level tests.
//! - [`SimPins`] wraps a `SimFlash` behind the
//!   [`BitbangPins`](promflash_core::programmer::BitbangPins) capability,
//!   decoding clock edges into bytes, so a real
//!   [`BitLink`](promflash_core::programmer::BitLink) can drive it.
//!
//! Like the real part, the simulator ignores program/erase commands that are
//! not preceded by Write Enable, only ever clears bits when programming,
//! wraps page programs within their page, and reports busy for a
//! configurable number of status reads after each program or erase.

mod pins;

pub use pins::{FrameTrace, ReleaseWatch, SimPins};

use promflash_core::error::Result;
use promflash_core::programmer::SpiMaster;
use promflash_core::spi::{opcodes, StatusRegister};

/// Configuration for the simulated PROM
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RDID byte 0
    pub manufacturer_id: u8,
    /// RDID byte 1
    pub device_id: u8,
    /// RDID byte 2, log2 of the size in bytes
    pub capacity_exponent: u8,
    /// Status reads that report busy after each program or erase
    pub busy_polls: u32,
    /// Never clear the busy bit once set
    pub never_ready: bool,
    /// Byte address whose cell is stuck at zero when read
    pub stuck_at_zero: Option<u32>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: 0x20,   // Micron
            device_id: 0xBA,         // N25Q128A
            capacity_exponent: 0x18, // 16 MiB
            busy_polls: 2,
            never_ready: false,
            stuck_at_zero: None,
        }
    }
}

impl SimConfig {
    /// Size of the simulated array in bytes
    pub fn size(&self) -> usize {
        1usize << self.capacity_exponent
    }
}

/// A state-changing command the simulated device accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOp {
    /// WREN
    WriteEnable,
    /// WRDI
    WriteDisable,
    /// PP at `addr` with `len` payload bytes
    PageProgram {
        /// Address sent with the command
        addr: u32,
        /// Payload length
        len: usize,
    },
    /// SE at `addr`
    SectorErase {
        /// Address sent with the command
        addr: u32,
    },
    /// SSE at `addr`
    SubsectorErase {
        /// Address sent with the command
        addr: u32,
    },
    /// BE
    BulkErase,
    /// RDP
    ReleasePowerDown,
}

/// Simulated PROM
pub struct SimFlash {
    config: SimConfig,
    data: Vec<u8>,
    write_enabled: bool,
    busy_remaining: u32,
    frame: Vec<u8>,
    out_index: usize,
    ops: Vec<SimOp>,
    rejected: usize,
    status_reads: u32,
    delay_us: u64,
}

impl SimFlash {
    /// Create a new erased device with the given configuration
    pub fn new(config: SimConfig) -> Self {
        let data = vec![0xFF; config.size()];
        Self {
            config,
            data,
            write_enabled: false,
            busy_remaining: 0,
            frame: Vec::new(),
            out_index: 0,
            ops: Vec::new(),
            rejected: 0,
            status_reads: 0,
            delay_us: 0,
        }
    }

    /// Create a new erased N25Q128A
    pub fn new_default() -> Self {
        Self::new(SimConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Get a reference to the array contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the array contents
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Commands accepted so far, in order
    pub fn ops(&self) -> &[SimOp] {
        &self.ops
    }

    /// Addresses of every 64 KiB sector erase accepted so far
    pub fn sector_erases(&self) -> Vec<u32> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SimOp::SectorErase { addr } => Some(*addr),
                _ => None,
            })
            .collect()
    }

    /// Program/erase commands dropped because the write enable latch was clear
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Number of RDSR frames answered
    pub fn status_reads(&self) -> u32 {
        self.status_reads
    }

    /// Total time the host asked to sleep, in microseconds
    pub fn total_delay_us(&self) -> u64 {
        self.delay_us
    }

    /// Current status register value
    pub fn status(&self) -> StatusRegister {
        let mut status = StatusRegister::empty();
        status.set(StatusRegister::WIP, self.busy_remaining > 0);
        status.set(StatusRegister::WEL, self.write_enabled);
        status
    }

    fn busy(&self) -> bool {
        self.busy_remaining > 0
    }

    fn start_busy(&mut self) {
        self.busy_remaining = if self.config.never_ready {
            u32::MAX
        } else {
            self.config.busy_polls
        };
    }

    fn wrap(&self, addr: usize) -> usize {
        addr % self.data.len()
    }

    fn frame_address(&self) -> Option<u32> {
        match self.frame.get(1..4) {
            Some(&[a2, a1, a0]) => Some(u32::from_be_bytes([0, a2, a1, a0])),
            _ => None,
        }
    }

    /// Chip select asserted: start collecting a new command
    pub fn begin_frame(&mut self) {
        self.frame.clear();
        self.out_index = 0;
    }

    /// One byte clocked in on MOSI
    pub fn shift_in(&mut self, byte: u8) {
        self.frame.push(byte);
    }

    /// Next byte to shift out on MISO, if the command has a response
    ///
    /// `None` means the device is not driving MISO at this point.
    pub fn output_byte(&mut self) -> Option<u8> {
        let opcode = *self.frame.first()?;

        // While busy only the status register answers
        if self.busy() && opcode != opcodes::RDSR {
            return None;
        }

        let byte = match opcode {
            opcodes::RDID => match self.out_index {
                0 => self.config.manufacturer_id,
                1 => self.config.device_id,
                2 => self.config.capacity_exponent,
                3 => 0x10, // Extended ID length
                _ => 0x00,
            },
            opcodes::RDSR => {
                let status = self.status().bits();
                if self.out_index == 0 {
                    self.status_reads += 1;
                    if self.busy_remaining > 0 && !self.config.never_ready {
                        self.busy_remaining -= 1;
                    }
                }
                status
            }
            opcodes::READ => {
                let addr = self.frame_address()? as usize;
                let cell = self.wrap(addr + self.out_index);
                if self.config.stuck_at_zero == Some(cell as u32) {
                    0x00
                } else {
                    self.data[cell]
                }
            }
            _ => return None,
        };

        self.out_index += 1;
        Some(byte)
    }

    /// Chip select deasserted: execute the collected command
    pub fn end_frame(&mut self) {
        let Some(&opcode) = self.frame.first() else {
            return;
        };

        if self.busy() && opcode != opcodes::RDSR {
            log::debug!("sim: ignoring opcode 0x{:02X} while busy", opcode);
            return;
        }

        match opcode {
            opcodes::WREN => {
                self.write_enabled = true;
                self.ops.push(SimOp::WriteEnable);
            }
            opcodes::WRDI => {
                self.write_enabled = false;
                self.ops.push(SimOp::WriteDisable);
            }
            opcodes::RDP => self.ops.push(SimOp::ReleasePowerDown),
            opcodes::PP => self.handle_page_program(),
            opcodes::SE => self.handle_erase(opcodes::SECTOR_SIZE),
            opcodes::SSE => self.handle_erase(opcodes::SUBSECTOR_SIZE),
            opcodes::BE => self.handle_bulk_erase(),
            opcodes::RDID | opcodes::RDSR | opcodes::READ => {}
            _ => log::warn!("sim: unknown opcode 0x{:02X}", opcode),
        }
    }

    fn take_write_enable(&mut self, opcode: u8) -> bool {
        if !self.write_enabled {
            log::warn!("sim: opcode 0x{:02X} without write enable", opcode);
            self.rejected += 1;
            return false;
        }
        self.write_enabled = false;
        true
    }

    fn handle_page_program(&mut self) {
        let Some(addr) = self.frame_address() else {
            return;
        };
        if !self.take_write_enable(opcodes::PP) {
            return;
        }

        let payload = self.frame[4..].to_vec();
        let page_base = addr as usize & !(opcodes::PAGE_SIZE - 1);
        let page_offset = addr as usize % opcodes::PAGE_SIZE;

        // Programming can only change 1 -> 0, and wraps within the page
        for (i, &byte) in payload.iter().enumerate() {
            let a = self.wrap(page_base + (page_offset + i) % opcodes::PAGE_SIZE);
            self.data[a] &= byte;
        }

        self.ops.push(SimOp::PageProgram {
            addr,
            len: payload.len(),
        });
        self.start_busy();
    }

    fn handle_erase(&mut self, size: u32) {
        let Some(addr) = self.frame_address() else {
            return;
        };
        let opcode = self.frame[0];
        if !self.take_write_enable(opcode) {
            return;
        }

        let start = self.wrap((addr - addr % size) as usize);
        let end = (start + size as usize).min(self.data.len());
        self.data[start..end].fill(0xFF);

        self.ops.push(if size == opcodes::SECTOR_SIZE {
            SimOp::SectorErase { addr }
        } else {
            SimOp::SubsectorErase { addr }
        });
        self.start_busy();
    }

    fn handle_bulk_erase(&mut self) {
        if !self.take_write_enable(opcodes::BE) {
            return;
        }
        self.data.fill(0xFF);
        self.ops.push(SimOp::BulkErase);
        self.start_busy();
    }
}

impl SpiMaster for SimFlash {
    fn transfer(&mut self, outbound: &[u8], inbound_len: usize) -> Result<Vec<u8>> {
        self.begin_frame();
        for &byte in outbound {
            self.shift_in(byte);
        }
        let inbound = (0..inbound_len)
            .map(|_| self.output_byte().unwrap_or(0xFF))
            .collect();
        self.end_frame();
        Ok(inbound)
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_us += us as u64;
    }
}
