//! promflash-core - Core library for flashing FPGA configuration PROMs
//!
//! This crate provides the bit-banged SPI link and the flash controller
//! used to erase, program and verify a serial NOR PROM sitting next to an
//! FPGA. It is `no_std` (with `alloc`) so the same protocol code can drive
//! a PROM from a microcontroller.
//!
//! # Features
//!
//! - `std` - Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```ignore
//! use promflash_core::flash::{FlashController, NoProgress};
//! use promflash_core::programmer::{BitLink, LinkConfig};
//!
//! let link = BitLink::new(pins, LinkConfig::default());
//! let mut flash = FlashController::new(link);
//! let id = flash.read_id()?;
//! println!("Found {}", id);
//! flash.write_file_to_mem(&image, 0, &mut NoProgress)?;
//! assert!(flash.verify(&image, 0, None)?.is_pass());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

pub mod error;
pub mod flash;
pub mod programmer;
pub mod protocol;
pub mod spi;

pub use error::{Error, Result};
