//! Bitbang SPI link over general-purpose I/O lines
//!
//! [`BitbangPins`] is the capability a pin driver has to provide: drive the
//! select, clock, data-out and reset lines, read data-in and the FPGA's done
//! signal, sleep, and let go of the lines. [`BitLink`] turns that into framed
//! byte transfers.
//!
//! ## Timing
//!
//! SPI mode 0, MSB first. The clock idles low. For every bit the link drives
//! data-out, waits half a period, raises the clock, waits half a period and
//! lowers the clock again. On the read phase data-in is sampled immediately
//! before each rising edge. The half period comes from [`LinkConfig`] rather
//! than from whatever the driver's call overhead happens to be.
//!
//! ## Pin ownership
//!
//! A `BitLink` owns its driver. Construction puts the lines in their idle
//! state and holds the FPGA in reset so it lets go of the flash bus;
//! [`BitLink::release`] (or dropping the link) returns every line to a
//! non-driving state, exactly once.

use core::time::Duration;

use alloc::vec::Vec;

use super::SpiMaster;
use crate::error::{Error, Result};

/// Default half-period delay in nanoseconds (for ~100 kHz SPI clock)
pub const DEFAULT_HALF_PERIOD_NS: u64 = 5000;

/// Trait for low-level bitbang pin operations
///
/// This trait provides the minimal set of operations needed for bitbanging
/// SPI to a PROM that sits behind an FPGA.
pub trait BitbangPins {
    /// Set chip select (CS is active low, so `active=true` means CS=0)
    fn set_cs(&mut self, active: bool);

    /// Set clock line value
    fn set_sck(&mut self, high: bool);

    /// Set MOSI line value
    fn set_mosi(&mut self, high: bool);

    /// Get MISO line value
    fn get_miso(&self) -> bool;

    /// Drive the FPGA reset line (active low, so `asserted=true` means RST=0)
    fn set_reset(&mut self, asserted: bool);

    /// Read the FPGA configuration-done line, if the board wires one up
    fn get_done(&self) -> Option<bool> {
        None
    }

    /// Block for the given duration
    fn delay(&mut self, duration: Duration);

    /// Return all claimed lines to a non-driving (input) state
    fn release(&mut self);
}

/// Timing configuration for a [`BitLink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Delay between a data/clock transition and the next clock edge.
    /// Zero runs the lines as fast as the driver allows.
    pub half_period: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            half_period: Duration::from_nanos(DEFAULT_HALF_PERIOD_NS),
        }
    }
}

impl LinkConfig {
    /// Set the half-period delay in nanoseconds
    pub fn with_half_period_ns(mut self, ns: u64) -> Self {
        self.half_period = Duration::from_nanos(ns);
        self
    }

    /// Set SPI speed in Hz (approximate, via half-period calculation)
    pub fn with_speed_hz(mut self, hz: u32) -> Self {
        // half_period = 1_000_000_000 / (2 * frequency) in nanoseconds
        if hz > 0 {
            self.half_period = Duration::from_nanos(500_000_000 / hz as u64);
        }
        self
    }
}

/// Bitbang helper functions for single-wire I/O
///
/// These are standalone functions that can be used with any `BitbangPins`
/// implementation. Chip select is left to the caller.
pub mod single {
    use super::BitbangPins;
    use core::time::Duration;

    fn half_period<P: BitbangPins + ?Sized>(pins: &mut P, half: Duration) {
        if !half.is_zero() {
            pins.delay(half);
        }
    }

    /// Write a byte (MSB first), one clock pulse per bit
    pub fn write_byte<P: BitbangPins + ?Sized>(pins: &mut P, half: Duration, byte: u8) {
        for i in (0..8).rev() {
            pins.set_mosi((byte >> i) & 1 != 0);
            half_period(pins, half);
            pins.set_sck(true);
            half_period(pins, half);
            pins.set_sck(false);
        }
    }

    /// Read a byte (MSB first), sampling MISO just before each rising edge
    pub fn read_byte<P: BitbangPins + ?Sized>(pins: &mut P, half: Duration) -> u8 {
        let mut byte = 0u8;
        for _ in 0..8 {
            half_period(pins, half);
            byte <<= 1;
            if pins.get_miso() {
                byte |= 1;
            }
            pins.set_sck(true);
            half_period(pins, half);
            pins.set_sck(false);
        }
        byte
    }

    /// Write multiple bytes
    pub fn write_bytes<P: BitbangPins + ?Sized>(pins: &mut P, half: Duration, bytes: &[u8]) {
        for &byte in bytes {
            write_byte(pins, half, byte);
        }
    }

    /// Read multiple bytes
    pub fn read_bytes<P: BitbangPins + ?Sized>(pins: &mut P, half: Duration, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = read_byte(pins, half);
        }
    }
}

/// Bit-banged SPI link with exclusive ownership of its pins
pub struct BitLink<P: BitbangPins> {
    pins: P,
    config: LinkConfig,
    released: bool,
}

impl<P: BitbangPins> BitLink<P> {
    /// Take ownership of `pins` and drive them to their idle state
    ///
    /// Idle: CS inactive (high), SCK low, MOSI low, FPGA held in reset.
    pub fn new(mut pins: P, config: LinkConfig) -> Self {
        pins.set_cs(false);
        pins.set_sck(false);
        pins.set_mosi(false);
        pins.set_reset(true);

        log::debug!(
            "bitlink: claimed pins, half period {} ns",
            config.half_period.as_nanos()
        );

        Self {
            pins,
            config,
            released: false,
        }
    }

    /// Clock out `outbound`, then clock in `inbound_len` bytes, under one
    /// chip-select assertion
    ///
    /// Always returns exactly `inbound_len` bytes. An absent device is not
    /// detected here; it reads back as whatever MISO floats to.
    ///
    /// Once the link is released the lines are no longer touched and every
    /// inbound byte reads as 0xFF.
    pub fn transfer(&mut self, outbound: &[u8], inbound_len: usize) -> Vec<u8> {
        if self.released {
            log::debug!("bitlink: dropping {:02X?}, pins released", outbound);
            return alloc::vec![0xFF; inbound_len];
        }
        self.clock_frame(outbound, inbound_len)
    }

    fn clock_frame(&mut self, outbound: &[u8], inbound_len: usize) -> Vec<u8> {
        let half = self.config.half_period;
        let mut inbound = alloc::vec![0u8; inbound_len];

        // Assert CS (active low)
        self.pins.set_cs(true);
        self.half_period_delay();

        // Write phase
        single::write_bytes(&mut self.pins, half, outbound);

        // Read phase
        single::read_bytes(&mut self.pins, half, &mut inbound);

        // De-assert CS
        self.half_period_delay();
        self.pins.set_cs(false);
        self.half_period_delay();

        log::trace!(
            "bitlink: {:02X?} -> {} byte(s) back",
            outbound,
            inbound.len()
        );

        inbound
    }

    fn half_period_delay(&mut self) {
        if !self.config.half_period.is_zero() {
            self.pins.delay(self.config.half_period);
        }
    }

    /// State of the FPGA done line, if the board has one
    pub fn done_signal(&self) -> Option<bool> {
        self.pins.get_done()
    }

    /// Timing this link was built with
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Borrow the underlying pin driver
    pub fn pins(&self) -> &P {
        &self.pins
    }

    /// Whether the pins have already been released
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Release every line to a non-driving state
    ///
    /// Idempotent; also runs on drop. The FPGA comes out of reset as a
    /// consequence and boots from the freshly written PROM.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.pins.release();
        self.released = true;
        log::debug!("bitlink: pins released");
    }
}

impl<P: BitbangPins> Drop for BitLink<P> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<P: BitbangPins> SpiMaster for BitLink<P> {
    fn transfer(&mut self, outbound: &[u8], inbound_len: usize) -> Result<Vec<u8>> {
        if self.released {
            log::error!("bitlink: transfer attempted after release");
            return Err(Error::LinkReleased);
        }
        Ok(self.clock_frame(outbound, inbound_len))
    }

    fn delay_us(&mut self, us: u32) {
        self.pins.delay(Duration::from_micros(us as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::VecDeque;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Cs(bool),
        Sck(bool),
        Mosi(bool),
        Reset(bool),
        Miso,
        Release,
    }

    #[derive(Default)]
    struct Trace {
        events: Vec<Event>,
        miso_bits: VecDeque<bool>,
        delays: usize,
    }

    #[derive(Clone, Default)]
    struct RecordingPins(Rc<RefCell<Trace>>);

    impl RecordingPins {
        fn with_miso(bits: &[bool]) -> Self {
            let pins = Self::default();
            pins.0.borrow_mut().miso_bits = bits.iter().copied().collect();
            pins
        }

        fn events(&self) -> Vec<Event> {
            self.0.borrow().events.clone()
        }
    }

    impl BitbangPins for RecordingPins {
        fn set_cs(&mut self, active: bool) {
            self.0.borrow_mut().events.push(Event::Cs(active));
        }
        fn set_sck(&mut self, high: bool) {
            self.0.borrow_mut().events.push(Event::Sck(high));
        }
        fn set_mosi(&mut self, high: bool) {
            self.0.borrow_mut().events.push(Event::Mosi(high));
        }
        fn get_miso(&self) -> bool {
            let mut trace = self.0.borrow_mut();
            trace.events.push(Event::Miso);
            trace.miso_bits.pop_front().unwrap_or(true)
        }
        fn set_reset(&mut self, asserted: bool) {
            self.0.borrow_mut().events.push(Event::Reset(asserted));
        }
        fn delay(&mut self, _duration: Duration) {
            self.0.borrow_mut().delays += 1;
        }
        fn release(&mut self) {
            self.0.borrow_mut().events.push(Event::Release);
        }
    }

    fn bits_of(byte: u8) -> Vec<bool> {
        (0..8).rev().map(|i| (byte >> i) & 1 != 0).collect()
    }

    fn zero_delay() -> LinkConfig {
        LinkConfig::default().with_half_period_ns(0)
    }

    #[test]
    fn test_new_drives_idle_state() {
        let pins = RecordingPins::default();
        let _link = BitLink::new(pins.clone(), zero_delay());
        assert_eq!(
            pins.events(),
            vec![
                Event::Cs(false),
                Event::Sck(false),
                Event::Mosi(false),
                Event::Reset(true)
            ]
        );
    }

    #[test]
    fn test_write_is_msb_first_one_pulse_per_bit() {
        let pins = RecordingPins::default();
        let mut link = BitLink::new(pins.clone(), zero_delay());
        let idle = pins.events().len();

        let rx = link.transfer(&[0xA5], 0);
        assert!(rx.is_empty());

        let events = pins.events()[idle..].to_vec();
        assert_eq!(events.first(), Some(&Event::Cs(true)));
        assert_eq!(events.last(), Some(&Event::Cs(false)));

        let body = &events[1..events.len() - 1];
        assert_eq!(body.len(), 8 * 3);
        for (bit, step) in bits_of(0xA5).into_iter().zip(body.chunks(3)) {
            assert_eq!(
                step,
                &[Event::Mosi(bit), Event::Sck(true), Event::Sck(false)]
            );
        }
    }

    #[test]
    fn test_read_samples_before_rising_edge() {
        let mut script = bits_of(0x3C);
        script.extend(bits_of(0x81));
        let pins = RecordingPins::with_miso(&script);
        let mut link = BitLink::new(pins.clone(), zero_delay());
        let idle = pins.events().len();

        let rx = link.transfer(&[], 2);
        assert_eq!(rx, vec![0x3C, 0x81]);

        let events = pins.events()[idle..].to_vec();
        let body = &events[1..events.len() - 1];
        assert_eq!(body.len(), 16 * 3);
        for step in body.chunks(3) {
            assert_eq!(step, &[Event::Miso, Event::Sck(true), Event::Sck(false)]);
        }
    }

    #[test]
    fn test_transfer_returns_requested_length() {
        let pins = RecordingPins::default();
        let mut link = BitLink::new(pins, zero_delay());
        let rx = link.transfer(&[0x9F], 17);
        // Floating MISO reads as all ones
        assert_eq!(rx, vec![0xFF; 17]);
    }

    #[test]
    fn test_half_period_is_applied() {
        let pins = RecordingPins::default();
        let mut link = BitLink::new(pins.clone(), LinkConfig::default());
        link.transfer(&[0x00], 1);
        // Two per bit, plus CS setup, hold and recovery
        assert_eq!(pins.0.borrow().delays, 16 * 2 + 3);
    }

    #[test]
    fn test_release_once_and_on_drop() {
        let pins = RecordingPins::default();
        {
            let mut link = BitLink::new(pins.clone(), zero_delay());
            link.release();
            link.release();
            assert!(link.is_released());
        }
        let releases = pins
            .events()
            .iter()
            .filter(|e| **e == Event::Release)
            .count();
        assert_eq!(releases, 1);

        {
            let _link = BitLink::new(pins.clone(), zero_delay());
        }
        let releases = pins
            .events()
            .iter()
            .filter(|e| **e == Event::Release)
            .count();
        assert_eq!(releases, 2);
    }

    #[test]
    fn test_no_clocking_after_release() {
        let pins = RecordingPins::default();
        let mut link = BitLink::new(pins.clone(), zero_delay());
        link.release();
        let before = pins.events().len();

        let err = SpiMaster::transfer(&mut link, &[0x05], 1).unwrap_err();
        assert_eq!(err, Error::LinkReleased);
        assert_eq!(link.transfer(&[0x9F], 3), vec![0xFF; 3]);
        assert_eq!(pins.events().len(), before);
    }

    #[test]
    fn test_speed_hz_to_half_period() {
        let cfg = LinkConfig::default().with_speed_hz(100_000);
        assert_eq!(cfg.half_period, Duration::from_nanos(5000));
        let cfg = LinkConfig::default().with_speed_hz(0);
        assert_eq!(cfg, LinkConfig::default());
    }
}
