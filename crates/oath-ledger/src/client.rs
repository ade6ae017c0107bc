//! # EVM Client Capability
//!
//! The narrow surface the workflow needs from a chain: read-only contract
//! calls against finalized state, signed report writes, and log queries.
//! The JSON-RPC implementation lives in [`crate::rpc`]; tests use the
//! in-memory ledger behind the `mock` feature.

use std::future::Future;

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::log::{EvmLog, LogFilter};
use crate::report::Report;

/// Inclusion state of a submitted write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteStatus {
    /// Accepted by the node, not yet mined.
    Pending,
    /// Mined with a success status.
    Confirmed,
}

/// Result of a successful report write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReceipt {
    /// Transaction hash.
    pub tx_hash: B256,
    /// Block the transaction was mined in, when known.
    pub block_number: Option<u64>,
    /// Inclusion state at the time of the check.
    pub status: WriteStatus,
}

/// Chain access used by the enforcement workflow.
///
/// Implementations must be `Send + Sync` so one client can be shared across
/// concurrently running trigger invocations.
pub trait EvmClient: Send + Sync {
    /// Chain selector name this client is bound to.
    fn chain_name(&self) -> &str;

    /// Execute a read-only call against the last finalized block.
    fn call_contract(
        &self,
        to: Address,
        data: Bytes,
    ) -> impl Future<Output = Result<Bytes, LedgerError>> + Send;

    /// Deliver a signed report to `receiver`.
    fn write_report(
        &self,
        receiver: Address,
        report: &Report,
    ) -> impl Future<Output = Result<WriteReceipt, LedgerError>> + Send;

    /// Most recent finalized block number.
    fn finalized_block(&self) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Logs matching a filter.
    fn get_logs(
        &self,
        filter: &LogFilter,
    ) -> impl Future<Output = Result<Vec<EvmLog>, LedgerError>> + Send;

    /// Logs emitted by a mined transaction.
    fn transaction_logs(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<Vec<EvmLog>, LedgerError>> + Send;
}
