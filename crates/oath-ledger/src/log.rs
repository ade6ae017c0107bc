//! # Event Logs
//!
//! Fixed schema for EVM logs delivered by log triggers: a contract address,
//! a list of 32-byte topic words, and ABI-encoded data. Field names follow
//! the JSON-RPC log object so the type deserializes straight from
//! `eth_getLogs` and transaction receipts.

use alloy_primitives::{Address, Bytes, B256, U64};
use serde::{Deserialize, Serialize};

/// A finalized EVM event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmLog {
    /// Emitting contract.
    pub address: Address,
    /// Topic words; `topics[0]` is the event signature hash.
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed fields.
    pub data: Bytes,
    /// Block containing the log.
    #[serde(default)]
    pub block_number: Option<U64>,
    /// Transaction that emitted the log.
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    /// Position of the log within the block.
    #[serde(default)]
    pub log_index: Option<U64>,
}

impl EvmLog {
    /// The event signature hash, if present.
    pub fn topic0(&self) -> Option<B256> {
        self.topics.first().copied()
    }

    /// Block number as a plain integer.
    pub fn block(&self) -> Option<u64> {
        self.block_number.map(|n| n.to::<u64>())
    }
}

/// Filter registered by a log trigger: one contract, one event signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    /// Contract whose logs are wanted.
    pub address: Address,
    /// Required `topics[0]`.
    pub topic0: B256,
    /// First block (inclusive).
    pub from_block: u64,
    /// Last block (inclusive).
    pub to_block: u64,
}

impl LogFilter {
    /// Whether a log satisfies the address and signature constraints.
    pub fn matches(&self, log: &EvmLog) -> bool {
        log.address == self.address && log.topic0() == Some(self.topic0)
    }

    /// Whether a log falls inside the block range. Logs without a block
    /// number (pending) never match.
    pub fn in_range(&self, log: &EvmLog) -> bool {
        log.block()
            .is_some_and(|b| b >= self.from_block && b <= self.to_block)
    }
}
