//! Ledger access error types.

use alloy_primitives::B256;
use oath_core::ValidationError;
use thiserror::Error;

/// Errors from contract reads, report writes and log queries.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The RPC endpoint could not be reached or answered with a non-2xx status.
    #[error("chain unavailable: {chain}: {reason}")]
    ChainUnavailable {
        /// Chain selector name.
        chain: String,
        /// Transport-level reason.
        reason: String,
    },

    /// The node returned a JSON-RPC error object.
    #[error("RPC error on {chain} calling {method}: {message}")]
    Rpc {
        /// Chain selector name.
        chain: String,
        /// JSON-RPC method name.
        method: String,
        /// Error message from the node.
        message: String,
    },

    /// A response or return value could not be decoded.
    #[error("failed to decode {what}: {reason}")]
    Decode {
        /// What was being decoded.
        what: String,
        /// Decoder message.
        reason: String,
    },

    /// A decoded record does not fit its domain type.
    #[error("invalid ledger record: {0}")]
    InvalidRecord(#[from] ValidationError),

    /// The write transaction was mined with a failure status.
    #[error("transaction {tx_hash} reverted on {chain}")]
    Reverted {
        /// Chain selector name.
        chain: String,
        /// Transaction hash.
        tx_hash: B256,
    },

    /// The client was built from an invalid configuration.
    #[error("ledger configuration error: {0}")]
    Config(String),
}
