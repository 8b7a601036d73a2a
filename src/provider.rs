//! Chain access capability
//!
//! Defines the `ChainProvider` trait the scan pipeline runs against, plus
//! the default backend that shells out to the Foundry `cast` binary. The
//! trait exists so the provider can be swapped for a direct JSON-RPC client
//! or a scripted test double without touching the pagination and resolution
//! logic.

use crate::types::LogEntry;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::process::Command;

/// Read-only chain access needed by the scan pipeline.
///
/// Every operation is a blocking external round trip. Failures are not
/// retried anywhere; the caller propagates them and the run aborts.
pub trait ChainProvider {
    /// Current chain tip height.
    fn block_number(&self) -> Result<u64>;

    /// All logs emitted by `contract` with `topic` as topic0, within the
    /// inclusive block range `[from_block, to_block]`, in log order.
    fn entry_logs(
        &self,
        contract: Address,
        topic: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LogEntry>>;

    /// Decode a 32-byte topic value into the address it encodes.
    fn topic_address(&self, topic: &str) -> Result<Address>;

    /// Call `isWinner(address)` on `contract` at latest state.
    fn is_winner(&self, contract: Address, entrant: Address) -> Result<bool>;
}

/// View function signature passed to `cast call`.
const IS_WINNER_SIG: &str = "isWinner(address) returns (bool)";

/// Chain access via the Foundry `cast` CLI, invoked as a subprocess per call.
pub struct CastProvider {
    rpc_url: String,
}

impl CastProvider {
    /// Create a provider that points `cast` at the given RPC endpoint.
    pub fn new(rpc_url: String) -> Self {
        Self { rpc_url }
    }

    /// Run `cast` with the given arguments and return trimmed stdout.
    ///
    /// A non-zero exit is fatal; stderr is folded into the error message.
    fn run_cast(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("cast")
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute cast {}", args.join(" ")))?;

        if !output.status.success() {
            anyhow::bail!(
                "cast {} exited with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8(output.stdout).context("cast output is not UTF-8")?;
        Ok(stdout.trim().to_string())
    }
}

impl ChainProvider for CastProvider {
    fn block_number(&self) -> Result<u64> {
        let stdout = self.run_cast(&["block-number", "--rpc-url", &self.rpc_url])?;
        parse_block_number(&stdout)
    }

    fn entry_logs(
        &self,
        contract: Address,
        topic: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LogEntry>> {
        let contract_str = format!("0x{:x}", contract);
        let from_str = from_block.to_string();
        let to_str = to_block.to_string();
        let stdout = self.run_cast(&[
            "logs",
            "--rpc-url",
            &self.rpc_url,
            "--address",
            &contract_str,
            "--from-block",
            &from_str,
            "--to-block",
            &to_str,
            "--json",
            topic,
        ])?;
        serde_json::from_str(&stdout).context("Failed to parse cast logs output")
    }

    fn topic_address(&self, topic: &str) -> Result<Address> {
        let stdout = self.run_cast(&["parse-bytes32-address", topic])?;
        crate::types::parse_address(&stdout)
            .with_context(|| format!("cast returned an unparseable address for topic {}", topic))
    }

    fn is_winner(&self, contract: Address, entrant: Address) -> Result<bool> {
        let contract_str = format!("0x{:x}", contract);
        let entrant_str = format!("0x{:x}", entrant);
        let stdout = self.run_cast(&[
            "call",
            "--rpc-url",
            &self.rpc_url,
            &contract_str,
            IS_WINNER_SIG,
            &entrant_str,
        ])?;
        parse_bool_output(&stdout)
    }
}

/// Parse the decimal block number `cast block-number` prints.
fn parse_block_number(stdout: &str) -> Result<u64> {
    stdout
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Failed to parse block number from cast output: {}", stdout))
}

/// Parse the decoded boolean `cast call` prints for a `returns (bool)` call.
fn parse_bool_output(stdout: &str) -> Result<bool> {
    serde_json::from_str(stdout.trim())
        .with_context(|| format!("Failed to parse boolean from cast output: {}", stdout))
}
