//! CLI implementation for rafflescan
//!
//! Gathers the RPC endpoint, raffle contract, and start block (from flags
//! or interactive prompts), picks a chain backend, and drives the scan
//! pipeline, printing the entry count and winner list to stdout.

use crate::provider::{CastProvider, ChainProvider};
use crate::rpc::RpcClient;
use crate::scan;
use crate::types::parse_address;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};

/// Raffle winner scanner
#[derive(Parser)]
#[command(name = "rafflescan")]
#[command(about = "Scan raffle entry events and resolve winners")]
pub struct Cli {
    /// RPC endpoint URL (prompted for if omitted)
    #[arg(short, long)]
    rpc_url: Option<String>,

    /// Raffle contract address (prompted for if omitted)
    #[arg(short, long)]
    contract: Option<String>,

    /// Block to start scanning from (prompted for if omitted)
    #[arg(short, long)]
    start_block: Option<u64>,

    /// Chain access backend
    #[arg(short, long, value_enum, default_value_t = Backend::Cast)]
    backend: Backend,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Backend {
    /// Shell out to the Foundry `cast` binary
    Cast,
    /// Talk JSON-RPC to the endpoint directly
    Rpc,
}

/// Print a prompt and read one trimmed line from stdin.
fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}

/// Run the CLI: gather inputs, scan, and print results.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let rpc_url = match cli.rpc_url {
        Some(url) => url,
        None => prompt("Please enter the rpc url: ")?,
    };
    let contract_raw = match cli.contract {
        Some(addr) => addr,
        None => prompt("Please enter the raffle contract address: ")?,
    };
    let contract = parse_address(&contract_raw)
        .with_context(|| format!("Invalid raffle contract address: {}", contract_raw))?;
    let start_block = match cli.start_block {
        Some(block) => block,
        None => prompt("Please enter the start block: ")?
            .parse::<u64>()
            .context("Start block must be a decimal integer")?,
    };

    match cli.backend {
        Backend::Cast => run_scan(&CastProvider::new(rpc_url), contract, start_block),
        Backend::Rpc => run_scan(&RpcClient::new(rpc_url), contract, start_block),
    }
}

/// Drive the three pipeline stages against the chosen backend.
fn run_scan<P: ChainProvider>(provider: &P, contract: Address, start_block: u64) -> Result<()> {
    let logs = scan::collect_entry_logs(provider, contract, start_block)?;
    println!("Number of entries: {}", logs.len());

    let entrants = scan::extract_entrants(provider, &logs)?;
    let winners = scan::resolve_winners(provider, contract, &entrants)?;

    println!("\nWinners:");
    for winner in &winners {
        println!("{}", winner);
    }
    Ok(())
}
