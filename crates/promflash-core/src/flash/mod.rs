//! High-level flash operations
//!
//! [`FlashController`] drives identification, erase, program, read and
//! verify on top of any [`SpiMaster`](crate::programmer::SpiMaster).

mod controller;
mod identity;
mod progress;
mod sector;

pub use controller::{FlashController, PollConfig, VerifyOutcome};
pub use identity::{DeviceIdentity, Name, MICRON, N25Q128A};
pub use progress::{NoProgress, WriteProgress, WriteStats, PROGRESS_STEP};
pub use sector::{address_of, sector_of, EraseTracker, Sector};
