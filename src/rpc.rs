//! JSON-RPC client for Ethereum nodes
//!
//! Alternative chain backend that talks to a JSON-RPC endpoint directly
//! instead of shelling out to `cast`. Handles hex string parsing and error
//! handling. Calls are blocking; the scan makes one round trip at a time.

use crate::provider::ChainProvider;
use crate::types::{address_from_topic, LogEntry};
use alloy_primitives::{keccak256, Address, U256};
use anyhow::{Context, Result};
use serde_json::{json, Value};

/// Blocking JSON-RPC client for Ethereum nodes.
pub struct RpcClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl RpcClient {
    /// Create a new RPC client.
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            url,
        }
    }

    /// Make a JSON-RPC call.
    fn call(&self, method: &str, params: Value) -> Result<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .context("Failed to send RPC request")?;

        let json: Value = response.json().context("Failed to parse RPC response")?;

        // Check for RPC error
        if let Some(error) = json.get("error") {
            anyhow::bail!("RPC error: {}", error);
        }

        // Extract result
        json.get("result")
            .cloned()
            .context("RPC response missing 'result' field")
    }

    /// ABI-encode an `isWinner(address)` call: 4-byte selector followed by
    /// the address left-padded to a 32-byte word.
    fn is_winner_calldata(entrant: Address) -> String {
        let selector = &keccak256(b"isWinner(address)")[..4];
        let mut data = Vec::with_capacity(36);
        data.extend_from_slice(selector);
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(entrant.as_slice());
        format!("0x{}", hex::encode(data))
    }
}

impl ChainProvider for RpcClient {
    fn block_number(&self) -> Result<u64> {
        let result = self.call("eth_blockNumber", json!([]))?;
        let number_str = result
            .as_str()
            .context("Block number response is not a string")?;
        parse_hex_u64(number_str).context("Failed to parse block number")
    }

    fn entry_logs(
        &self,
        contract: Address,
        topic: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LogEntry>> {
        let filter = json!({
            "address": format!("0x{:x}", contract),
            "topics": [topic],
            "fromBlock": format!("0x{:x}", from_block),
            "toBlock": format!("0x{:x}", to_block),
        });
        let result = self.call("eth_getLogs", json!([filter]))?;
        serde_json::from_value(result).context("Failed to deserialize logs")
    }

    fn topic_address(&self, topic: &str) -> Result<Address> {
        // Address decoding needs no round trip with this backend.
        address_from_topic(topic)
    }

    fn is_winner(&self, contract: Address, entrant: Address) -> Result<bool> {
        let params = json!([
            {
                "to": format!("0x{:x}", contract),
                "data": Self::is_winner_calldata(entrant),
            },
            "latest"
        ]);
        let result = self.call("eth_call", params)?;
        let word = result.as_str().context("Call response is not a string")?;
        decode_bool_word(word)
    }
}

/// Parse a 0x-prefixed hex string to u64.
fn parse_hex_u64(s: &str) -> Result<u64> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        anyhow::bail!("Hex number is empty");
    }
    u64::from_str_radix(s, 16).with_context(|| format!("Invalid hex number: {}", s))
}

/// Decode the ABI-encoded boolean word an `eth_call` returns.
///
/// Any non-zero value counts as true, matching Solidity's bool decoding.
fn decode_bool_word(s: &str) -> Result<bool> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        anyhow::bail!("Call returned no data");
    }
    // Handle odd-length hex strings by padding with a leading zero
    let s = if s.len() % 2 == 1 {
        format!("0{}", s)
    } else {
        s.to_string()
    };
    let bytes = hex::decode(&s).context("Failed to decode call result hex")?;
    if bytes.len() > 32 {
        anyhow::bail!("Call result too large for a bool (got {} bytes)", bytes.len());
    }
    Ok(U256::from_be_slice(&bytes) != U256::ZERO)
}
