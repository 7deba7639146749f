//! Linux GPIO pin driver
//!
//! `GpioPins` implements [`BitbangPins`] on top of one gpiocdev line request
//! covering every line of a [`BoardPins`]. All outputs are requested with
//! their idle level already applied, so no line glitches while the request
//! is being set up.

use std::cell::Cell;
use std::time::Duration;

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};

use promflash_core::programmer::BitbangPins;

use crate::board::BoardPins;
use crate::error::{GpioError, Result};

const CONSUMER: &str = "promflash";

fn level(high: bool) -> Value {
    if high {
        Value::Active
    } else {
        Value::Inactive
    }
}

/// Lines of one board, claimed through the GPIO character device
pub struct GpioPins {
    request: Option<Request>,
    board: BoardPins,
    // Set once a line was touched after release, to log it only once
    stale_access: Cell<bool>,
}

impl GpioPins {
    /// Request every line of `board`
    ///
    /// Outputs start idle: reset asserted (low), select inactive (high),
    /// clock low, data out low.
    pub fn open(board: &BoardPins) -> Result<Self> {
        board.validate()?;

        log::debug!("gpio: requesting lines on {}", board.chip);

        let mut cfg = Config::default();
        cfg.with_line(board.reset).as_output(level(false));
        cfg.with_line(board.select).as_output(level(true));
        cfg.with_line(board.clock).as_output(level(false));
        cfg.with_line(board.data_out).as_output(level(false));
        cfg.with_line(board.data_in).as_input();
        if let Some(done) = board.done {
            cfg.with_line(done).as_input();
        }

        let request = Request::from_config(cfg)
            .on_chip(&board.chip)
            .with_consumer(CONSUMER)
            .request()
            .map_err(|source| GpioError::LineRequestFailed {
                chip: board.chip.clone(),
                source,
            })?;

        log::info!(
            "gpio: opened {} for board {} (reset={}, clock={}, select={}, data_in={}, data_out={}{})",
            board.chip,
            board.name,
            board.reset,
            board.clock,
            board.select,
            board.data_in,
            board.data_out,
            board
                .done
                .map(|d| format!(", done={}", d))
                .unwrap_or_default()
        );

        Ok(Self {
            request: Some(request),
            board: board.clone(),
            stale_access: Cell::new(false),
        })
    }

    /// Board this driver was opened with
    pub fn board(&self) -> &BoardPins {
        &self.board
    }

    fn note_stale_access(&self, role: &str) {
        if !self.stale_access.replace(true) {
            log::error!("gpio: {} used after the lines were released", role);
        }
    }

    fn set(&self, offset: Offset, high: bool, role: &str) {
        let Some(request) = &self.request else {
            self.note_stale_access(role);
            return;
        };
        if let Err(e) = request.set_value(offset, level(high)) {
            log::error!("gpio: failed to set {}: {}", role, e);
        }
    }

    fn get(&self, offset: Offset, role: &str) -> Option<bool> {
        let Some(request) = &self.request else {
            self.note_stale_access(role);
            return None;
        };
        match request.value(offset) {
            Ok(value) => Some(value == Value::Active),
            Err(e) => {
                log::error!("gpio: failed to read {}: {}", role, e);
                None
            }
        }
    }
}

impl BitbangPins for GpioPins {
    fn set_cs(&mut self, active: bool) {
        // Active low
        self.set(self.board.select, !active, "select");
    }

    fn set_sck(&mut self, high: bool) {
        self.set(self.board.clock, high, "clock");
    }

    fn set_mosi(&mut self, high: bool) {
        self.set(self.board.data_out, high, "data_out");
    }

    fn get_miso(&self) -> bool {
        self.get(self.board.data_in, "data_in").unwrap_or(false)
    }

    fn set_reset(&mut self, asserted: bool) {
        // Active low
        self.set(self.board.reset, !asserted, "reset");
    }

    fn get_done(&self) -> Option<bool> {
        self.get(self.board.done?, "done")
    }

    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn release(&mut self) {
        let Some(request) = self.request.take() else {
            return;
        };

        let mut cfg = Config::default();
        for (_, offset) in self.board.roles() {
            cfg.with_line(offset).as_input();
        }
        if let Err(e) = request.reconfigure(&cfg) {
            log::error!("gpio: failed to return lines to input: {}", e);
        }
        // Dropping the request hands the lines back to the kernel
        drop(request);

        log::debug!("gpio: released lines on {}", self.board.chip);
    }
}

impl Drop for GpioPins {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level() {
        assert_eq!(level(true), Value::Active);
        assert_eq!(level(false), Value::Inactive);
    }

    #[test]
    fn test_open_rejects_duplicate_lines() {
        let mut board = BoardPins::lookup("ice_zero_proto").unwrap();
        board.done = Some(board.clock);
        assert!(matches!(
            GpioPins::open(&board),
            Err(GpioError::DuplicateLine { .. })
        ));
    }
}
