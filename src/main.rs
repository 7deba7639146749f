//! promflash - Flash an FPGA configuration PROM over bit-banged GPIO
//!
//! The PROM (a Micron N25Q-style serial NOR flash) shares its SPI bus with
//! the FPGA that boots from it. promflash holds the FPGA in reset, drives
//! the bus itself through four GPIO lines, erases and programs the image
//! sector by sector, verifies it, and lets the FPGA go.
//!
//! # Usage
//!
//! ```bash
//! # Write top.bin at the start of the PROM on the default board
//! promflash top.bin
//!
//! # Write at 0x020000 on a board described in a file
//! promflash --board-file hat.toml top.bin 020000
//!
//! # Dry run against the simulator
//! promflash -b sim -v top.bin
//! ```

mod cli;
mod commands;
mod error;
mod programmers;

use clap::Parser;
use cli::Cli;
use commands::{RunOutcome, WriteOptions};
use error::FlashError;
use programmers::Link;
use std::process::ExitCode;

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let data = std::fs::read(&cli.image).map_err(|source| FlashError::ImageRead {
        path: cli.image.clone(),
        source,
    })?;
    log::info!("Read {} bytes from {}", data.len(), cli.image.display());

    let opts = WriteOptions {
        address: cli.address,
        verify_bytes: cli.verify_bytes,
        no_verify: cli.no_verify,
        force: cli.force,
    };

    let outcome = match programmers::open_link(&cli)? {
        Link::Gpio(link) => commands::run_write(link, &data, &opts)?,
        Link::Sim(link) => commands::run_write(link, &data, &opts)?,
    };

    Ok(match outcome {
        RunOutcome::Pass => ExitCode::SUCCESS,
        RunOutcome::Fail => ExitCode::FAILURE,
    })
}
