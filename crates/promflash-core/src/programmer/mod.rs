//! Programmer traits and abstractions
//!
//! This module defines the transfer seam between the flash protocol and
//! whatever moves the bits, plus the GPIO bitbang link itself.

pub mod bitbang;
mod traits;

pub use bitbang::{BitLink, BitbangPins, LinkConfig};
pub use traits::*;
