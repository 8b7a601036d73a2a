//! rafflescan - raffle winner scanner CLI
//!
//! Scans a raffle contract's entry events and reports which entrants the
//! contract currently flags as winners.

use rafflescan::cli;
use tracing::Level;
use tracing_subscriber;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
