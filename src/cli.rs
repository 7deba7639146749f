//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Board name that selects the pin-level simulator instead of real GPIO
pub const SIM_BOARD: &str = "sim";

/// Parse a flash address, always hexadecimal, `0x` prefix optional
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex address: {}", e))
}

/// Generate help text for the board argument
fn board_help() -> String {
    format!(
        "Board wiring to use [available: {}, {}]",
        promflash_gpio::BUILTIN_BOARDS.join(", "),
        SIM_BOARD
    )
}

#[derive(Parser, Debug)]
#[command(name = "promflash")]
#[command(
    author,
    version,
    about = "Flash an FPGA configuration PROM over bit-banged GPIO",
    long_about = None
)]
pub struct Cli {
    /// Raw image to write
    pub image: PathBuf,

    /// Flash address to write the image at (hex)
    #[arg(value_parser = parse_hex_u32, default_value = "0x000000")]
    pub address: u32,

    #[arg(short, long, default_value = "ice_zero_proto", help = board_help())]
    pub board: String,

    /// Board wiring from a TOML file instead of a built-in board
    #[arg(long, conflicts_with = "board")]
    pub board_file: Option<PathBuf>,

    /// GPIO chip to use (path or number), overriding the board's
    #[arg(long)]
    pub gpiochip: Option<String>,

    /// Half clock period in nanoseconds
    #[arg(long, default_value_t = promflash_core::programmer::bitbang::DEFAULT_HALF_PERIOD_NS)]
    pub half_period_ns: u64,

    /// Only verify the first N bytes of the image
    #[arg(long, conflicts_with = "no_verify")]
    pub verify_bytes: Option<usize>,

    /// Skip verification after writing
    #[arg(long)]
    pub no_verify: bool,

    /// Flash even if the PROM ID looks like nothing is connected
    #[arg(long)]
    pub force: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Default log filter for the requested verbosity; `RUST_LOG` still wins
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
