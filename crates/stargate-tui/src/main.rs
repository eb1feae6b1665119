//! Stargate console entry point.
//!
//! # Usage
//!
//! ```bash
//! # Dial with the bundled whitelist
//! stargate-tui
//!
//! # Eight-chevron mode, custom whitelist, debug logs to a file
//! stargate-tui --chevrons 8 --whitelist worlds.json --log-file gate.log --log-level debug
//! ```
//!
//! Keys: digits then Space to enter a glyph, Enter to dial, Tab to change
//! mode, `a` abort, `x` shutdown, `r` reset, Esc quit.

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::Parser;
use stargate_app::{GateCommand, Runtime, StaticWhitelist};
use stargate_core::DialMode;
use stargate_tui::{DEFAULT_WHITELIST_JSON, TerminalDriver};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Stargate dialing console
#[derive(Parser, Debug)]
#[command(name = "stargate-tui")]
#[command(about = "Terminal dialing console for the Stargate")]
#[command(version)]
struct Args {
    /// Chevrons per dial (7, 8 or 9)
    #[arg(short, long, default_value_t = 7, value_parser = clap::value_parser!(u8).range(7..=9))]
    chevrons: u8,

    /// Whitelist document (JSON array of addresses and destinations)
    ///
    /// If not provided, the bundled whitelist is used.
    #[arg(short, long)]
    whitelist: Option<PathBuf>,

    /// Write logs to this file. The terminal is busy drawing the gate.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
        let file = File::create(path)?;

        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(filter)
            .init();
    }

    let mode = DialMode::try_from(args.chevrons)?;
    let whitelist = match &args.whitelist {
        Some(path) => StaticWhitelist::from_json(&std::fs::read_to_string(path)?)?,
        None => StaticWhitelist::from_json(DEFAULT_WHITELIST_JSON)?,
    };
    tracing::info!(destinations = whitelist.len(), ?mode, "stargate console starting");

    let mut driver = TerminalDriver::new()?;
    if mode != DialMode::default() {
        driver.queue(GateCommand::SetMode(mode));
    }

    Ok(Runtime::new(driver, whitelist).run().await?)
}
