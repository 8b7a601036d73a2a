//! Rafflescan - raffle winner scanner
//!
//! Fetches raffle entry events from a contract's logs in fixed-size block
//! windows, decodes each entrant address from the log's indexed topic, and
//! checks each entrant against the contract's `isWinner(address)` view
//! function. Chain access goes through the `ChainProvider` trait, backed by
//! either the Foundry `cast` CLI or a direct JSON-RPC client.

pub mod cli;
pub mod provider;
pub mod rpc;
pub mod scan;
pub mod types;

// Re-export the main types for convenience
pub use provider::{CastProvider, ChainProvider};
pub use rpc::RpcClient;
pub use types::LogEntry;
