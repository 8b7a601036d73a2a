//! Log record and hex parsing types
//!
//! Type definitions for event log entries returned from the chain,
//! plus shared hex string parsing helpers.

use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

/// A raffle-entry log event fetched from the chain.
///
/// Both backends produce the same JSON shape (`cast logs --json` mirrors
/// `eth_getLogs`), so one deserialization target covers both. Fields we
/// don't need (transaction hash, log index, ...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    /// Address of the contract that emitted the log
    #[serde(rename = "address", deserialize_with = "deserialize_hex_address")]
    pub address: Address,

    /// Indexed topics (topic0 = event signature, topics[1..] = indexed params)
    #[serde(rename = "topics", default)]
    pub topics: Vec<String>,

    /// Non-indexed event data (hex string)
    #[serde(rename = "data", default, deserialize_with = "deserialize_hex_bytes")]
    pub data: Vec<u8>,

    /// Block the log was emitted in (null for pending logs)
    #[serde(
        rename = "blockNumber",
        default,
        deserialize_with = "deserialize_hex_u64_opt"
    )]
    pub block_number: Option<u64>,
}

/// Pad an odd-length hex string with a leading zero.
fn pad_hex_string(s: &str) -> String {
    if s.is_empty() {
        return s.to_string();
    }
    if s.len() % 2 == 1 {
        format!("0{}", s)
    } else {
        s.to_string()
    }
}

/// Parse a hex string into a 20-byte address.
///
/// Accepts addresses with or without 0x prefix.
pub fn parse_address(s: &str) -> Result<Address> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let s = pad_hex_string(s);
    let bytes = hex::decode(&s).with_context(|| format!("Invalid hex address: {}", s))?;
    if bytes.len() != 20 {
        anyhow::bail!(
            "Address must be 20 bytes (40 hex chars), got {} bytes",
            bytes.len()
        );
    }
    Ok(Address::from_slice(&bytes))
}

/// Decode a 32-byte log topic into the address held in its low 20 bytes.
///
/// The upper 12 bytes must be zero padding; anything else means the topic
/// does not encode an address and the run aborts.
pub fn address_from_topic(topic: &str) -> Result<Address> {
    let s = topic.strip_prefix("0x").unwrap_or(topic);
    let bytes = hex::decode(s).with_context(|| format!("Invalid hex topic: {}", topic))?;
    if bytes.len() != 32 {
        anyhow::bail!(
            "Topic must be 32 bytes (64 hex chars), got {} bytes",
            bytes.len()
        );
    }
    if bytes[..12].iter().any(|b| *b != 0) {
        anyhow::bail!("Topic is not a zero-padded address: {}", topic);
    }
    Ok(Address::from_slice(&bytes[12..]))
}

// Hex deserialization helpers

/// Deserialize a hex string to Address.
fn deserialize_hex_address<'de, D>(deserializer: D) -> Result<Address, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.strip_prefix("0x").unwrap_or(&s);
    let s = pad_hex_string(s);
    let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
    if bytes.len() != 20 {
        return Err(serde::de::Error::custom(format!(
            "Expected 20 bytes for address, got {}",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}

/// Deserialize a hex string to bytes.
fn deserialize_hex_bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.strip_prefix("0x").unwrap_or(&s);
    if s.is_empty() {
        Ok(Vec::new())
    } else {
        let s = pad_hex_string(s);
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Deserialize an optional hex string to u64.
fn deserialize_hex_u64_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    match s {
        Some(s) => {
            let s = s.strip_prefix("0x").unwrap_or(&s);
            if s.is_empty() {
                return Ok(None);
            }
            u64::from_str_radix(s, 16)
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
        None => Ok(None),
    }
}
