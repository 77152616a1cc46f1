//! Order Ledger CLI
//!
//! Reads a CSV of order events and writes either the ledger of every order or
//! a sales summary.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- events.csv > ledger.csv
//! cargo run -- events.csv --stats --period previous-month > stats.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use order_ledger::{Config, LedgerEngine, OutputMode, Result};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::from_args(env::args().skip(1))?;

    let file = File::open(&config.input)?;
    let reader = BufReader::new(file);

    let mut engine = LedgerEngine::new();
    engine.process_csv(reader)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    match config.mode {
        OutputMode::Ledger => engine.write_output(handle)?,
        OutputMode::Stats { period, today } => engine.write_stats(handle, period, today)?,
    }

    Ok(())
}
