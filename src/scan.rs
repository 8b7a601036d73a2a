//! Raffle scan pipeline
//!
//! The three sequential stages of a scan: paginate entry logs over the
//! block range, extract entrant addresses from log topics, and resolve
//! which entrants the contract currently flags as winners. Each stage is
//! a plain function over a `ChainProvider`, so the whole pipeline runs
//! unchanged against `cast`, a JSON-RPC node, or a test double.

use crate::provider::ChainProvider;
use crate::types::LogEntry;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Block span of one log query window.
pub const WINDOW_SIZE: u64 = 25_000;

/// Topic hash of the raffle entry event.
pub const ENTRY_TOPIC: &str = "0xdb4b459b9af0810582f21ec0ec043ee9c3f91ea26a3d3a675dea0e9e5e099f05";

/// Plan the query windows covering `[start_block, latest_block]`.
///
/// The cursor starts at `[start, start + WINDOW_SIZE]` and advances
/// `from = to + 1`, `to += WINDOW_SIZE` after each window; the loop exits
/// once the advanced `from` passes `latest_block`. The window is emitted
/// before the check, so `latest_block < start_block` still yields one
/// degenerate window.
pub fn windows(start_block: u64, latest_block: u64) -> Vec<(u64, u64)> {
    let mut from_block = start_block;
    let mut to_block = start_block + WINDOW_SIZE;
    let mut plan = Vec::new();
    loop {
        plan.push((from_block, to_block));
        from_block = to_block + 1;
        to_block += WINDOW_SIZE;
        if from_block > latest_block {
            break;
        }
    }
    plan
}

/// Fetch all raffle entry logs from `start_block` to the chain tip.
///
/// The tip height is captured once up front; entries landing after that
/// snapshot are excluded from this run. Any window query failure aborts
/// the scan.
pub fn collect_entry_logs<P: ChainProvider>(
    provider: &P,
    contract: Address,
    start_block: u64,
) -> Result<Vec<LogEntry>> {
    let latest_block = provider
        .block_number()
        .context("Failed to get latest block number")?;
    info!(
        "Scanning for entries from block {} to {}",
        start_block, latest_block
    );

    let mut logs = Vec::new();
    for (from_block, to_block) in windows(start_block, latest_block) {
        let mut batch = provider
            .entry_logs(contract, ENTRY_TOPIC, from_block, to_block)
            .with_context(|| {
                format!("Failed to fetch logs for blocks {} to {}", from_block, to_block)
            })?;
        debug!(
            "Window [{}, {}]: {} entries",
            from_block,
            to_block,
            batch.len()
        );
        logs.append(&mut batch);
    }

    info!("Collected {} entry logs", logs.len());
    Ok(logs)
}

/// Decode each log's entrant address from its second topic slot.
///
/// Order follows log order; an address that entered the raffle more than
/// once appears more than once.
pub fn extract_entrants<P: ChainProvider>(
    provider: &P,
    logs: &[LogEntry],
) -> Result<Vec<Address>> {
    let mut entrants = Vec::with_capacity(logs.len());
    for log in logs {
        let topic = log
            .topics
            .get(1)
            .with_context(|| format!("Log from {} has no entrant topic", log.address))?;
        let entrant = provider
            .topic_address(topic)
            .with_context(|| format!("Failed to decode entrant from topic {}", topic))?;
        entrants.push(entrant);
    }
    Ok(entrants)
}

/// Check each entrant against the contract's winner flag, in order.
///
/// Calls are made one at a time with no caching, so a duplicated entrant
/// is checked (and possibly reported) once per occurrence.
pub fn resolve_winners<P: ChainProvider>(
    provider: &P,
    contract: Address,
    entrants: &[Address],
) -> Result<Vec<Address>> {
    let mut winners = Vec::new();
    for entrant in entrants {
        let flagged = provider
            .is_winner(contract, *entrant)
            .with_context(|| format!("Failed to check winner status for {}", entrant))?;
        debug!("isWinner({}) = {}", entrant, flagged);
        if flagged {
            winners.push(*entrant);
        }
    }
    info!(
        "Resolved {} winners out of {} entrants",
        winners.len(),
        entrants.len()
    );
    Ok(winners)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_address;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_windows_single_window_at_tip() {
        // start == latest: one window reaching past the tip.
        assert_eq!(windows(100, 100), vec![(100, 25100)]);
    }

    #[test]
    fn test_windows_two_windows() {
        assert_eq!(windows(0, 50000), vec![(0, 25000), (25001, 50000)]);
    }

    #[test]
    fn test_windows_degenerate_range() {
        // Tip behind the start block: the first window is still queried.
        assert_eq!(windows(1000, 5), vec![(1000, 26000)]);
    }

    #[test]
    fn test_windows_are_contiguous() {
        let plan = windows(17, 300_000);
        assert_eq!(plan[0].0, 17);
        for pair in plan.windows(2) {
            // Next window starts right after the previous one ends.
            assert_eq!(pair[1].0, pair[0].1 + 1);
            assert_eq!(pair[1].1 - pair[1].0 + 1, WINDOW_SIZE);
        }
        let (last_from, _) = *plan.last().unwrap();
        assert!(last_from <= 300_000);
    }

    /// Scripted provider: one batch of logs per planned window, a fixed
    /// winner set, and call counters for asserting stage behavior.
    struct FakeProvider {
        latest_block: u64,
        log_batches: RefCell<Vec<Vec<LogEntry>>>,
        winners: Vec<Address>,
        fail_logs: bool,
        decode_calls: Cell<usize>,
        winner_calls: Cell<usize>,
    }

    impl FakeProvider {
        fn new(latest_block: u64, log_batches: Vec<Vec<LogEntry>>, winners: Vec<Address>) -> Self {
            Self {
                latest_block,
                log_batches: RefCell::new(log_batches),
                winners,
                fail_logs: false,
                decode_calls: Cell::new(0),
                winner_calls: Cell::new(0),
            }
        }
    }

    impl ChainProvider for FakeProvider {
        fn block_number(&self) -> Result<u64> {
            Ok(self.latest_block)
        }

        fn entry_logs(
            &self,
            _contract: Address,
            _topic: &str,
            _from_block: u64,
            _to_block: u64,
        ) -> Result<Vec<LogEntry>> {
            if self.fail_logs {
                anyhow::bail!("scripted log query failure");
            }
            let mut batches = self.log_batches.borrow_mut();
            if batches.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(batches.remove(0))
            }
        }

        fn topic_address(&self, topic: &str) -> Result<Address> {
            self.decode_calls.set(self.decode_calls.get() + 1);
            crate::types::address_from_topic(topic)
        }

        fn is_winner(&self, _contract: Address, entrant: Address) -> Result<bool> {
            self.winner_calls.set(self.winner_calls.get() + 1);
            Ok(self.winners.contains(&entrant))
        }
    }

    fn contract() -> Address {
        parse_address("0x5fbdb2315678afecb367f032d93f642f64180aa3").unwrap()
    }

    fn entry_log(entrant_hex: &str) -> LogEntry {
        let json = format!(
            r#"{{
                "address": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                "topics": [
                    "{}",
                    "0x000000000000000000000000{}"
                ],
                "data": "0x",
                "blockNumber": "0x64"
            }}"#,
            ENTRY_TOPIC, entrant_hex
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_zero_logs_means_zero_resolver_calls() {
        let provider = FakeProvider::new(100, vec![], vec![]);
        let logs = collect_entry_logs(&provider, contract(), 100).unwrap();
        assert!(logs.is_empty());

        let entrants = extract_entrants(&provider, &logs).unwrap();
        let winners = resolve_winners(&provider, contract(), &entrants).unwrap();
        assert!(winners.is_empty());
        assert_eq!(provider.winner_calls.get(), 0);
    }

    #[test]
    fn test_non_winning_entrant_yields_empty_winners() {
        let provider = FakeProvider::new(
            100,
            vec![vec![entry_log("0742d35cc6634c0532925a3b844bc9e7595f0beb")]],
            vec![],
        );
        let logs = collect_entry_logs(&provider, contract(), 100).unwrap();
        assert_eq!(logs.len(), 1);

        let entrants = extract_entrants(&provider, &logs).unwrap();
        assert_eq!(entrants.len(), 1);

        let winners = resolve_winners(&provider, contract(), &entrants).unwrap();
        assert!(winners.is_empty());
        assert_eq!(provider.winner_calls.get(), 1);
    }

    #[test]
    fn test_failed_log_query_aborts_before_decoding() {
        let mut provider = FakeProvider::new(100, vec![], vec![]);
        provider.fail_logs = true;

        let result = collect_entry_logs(&provider, contract(), 100);
        assert!(result.is_err());
        assert_eq!(provider.decode_calls.get(), 0);
        assert_eq!(provider.winner_calls.get(), 0);
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let alice = "0742d35cc6634c0532925a3b844bc9e7595f0beb";
        let bob = "dac17f958d2ee523a2206206994597c13d831ec7";
        let alice_addr = parse_address(alice).unwrap();
        let bob_addr = parse_address(bob).unwrap();

        // Alice entered twice, across two windows; both tickets win.
        let provider = FakeProvider::new(
            30_000,
            vec![
                vec![entry_log(alice), entry_log(bob)],
                vec![entry_log(alice)],
            ],
            vec![alice_addr],
        );

        let logs = collect_entry_logs(&provider, contract(), 0).unwrap();
        assert_eq!(logs.len(), 3);

        let entrants = extract_entrants(&provider, &logs).unwrap();
        assert_eq!(entrants, vec![alice_addr, bob_addr, alice_addr]);
        assert_eq!(provider.decode_calls.get(), 3);

        let winners = resolve_winners(&provider, contract(), &entrants).unwrap();
        assert_eq!(winners, vec![alice_addr, alice_addr]);
        // No caching: every entrant occurrence is checked.
        assert_eq!(provider.winner_calls.get(), 3);
    }

    #[test]
    fn test_missing_entrant_topic_is_fatal() {
        let json = format!(
            r#"{{
                "address": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                "topics": ["{}"],
                "data": "0x"
            }}"#,
            ENTRY_TOPIC
        );
        let log: LogEntry = serde_json::from_str(&json).unwrap();
        let provider = FakeProvider::new(100, vec![], vec![]);
        assert!(extract_entrants(&provider, &[log]).is_err());
    }
}
