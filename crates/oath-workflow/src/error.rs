//! Workflow error types.
//!
//! One enum per failure domain. Configuration errors are fatal before any
//! binding exists; everything else surfaces from a single handler
//! invocation and never affects other invocations.

use oath_ledger::LedgerError;
use thiserror::Error;

use crate::triggers::HandlerKind;

/// Invalid workflow or host configuration. Fatal at initialization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// The chain selector name is not in the registry.
    #[error("unknown chain selector name: {0}")]
    UnknownChain(String),

    /// The chain exists but on the other side of the testnet/mainnet split.
    #[error("chain {chain} is {actual}, configuration expects {expected}")]
    NetworkMismatch {
        chain: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// An address field is not a valid 20-byte hex address.
    #[error("invalid address in {field}: {value:?}: {reason}")]
    InvalidAddress {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// A URL field does not parse or uses an unsupported scheme.
    #[error("invalid URL in {field}: {value:?}: {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// Any other out-of-domain value.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Why a consensus round produced no value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusFailure {
    /// Executors returned different outputs.
    #[error("executors disagreed")]
    Disagreement,

    /// One executor's operation failed.
    #[error("executor {node} failed: {reason}")]
    NodeFailed { node: usize, reason: String },

    /// One executor did not answer within the per-node timeout.
    #[error("executor {node} timed out")]
    Timeout { node: usize },
}

/// Report signing or delivery failed.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Fewer valid signatures than the quorum, or a signer fault.
    #[error("report signing failed: {0}")]
    Signing(String),

    /// The ledger rejected or reverted the write.
    #[error("report write failed: {0}")]
    Write(#[from] LedgerError),
}

/// A registration log could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The log does not carry exactly the expected topics.
    #[error("expected {expected} topics, found {found}")]
    TopicCount { expected: usize, found: usize },

    /// `topics[0]` is not the expected event signature.
    #[error("log is not a {expected} event")]
    WrongEvent { expected: &'static str },

    /// The ABI-encoded data does not decode as `(root, timestamp)`.
    #[error("malformed event data: {0}")]
    Data(String),
}

/// A secret could not be supplied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    /// No value, or an empty value, is available for the id.
    #[error("secret {0} is not set")]
    Missing(String),

    /// The secret store itself failed.
    #[error("secret store error for {id}: {reason}")]
    Store { id: String, reason: String },
}

/// Failure of one handler invocation.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The agreement count read failed; nothing was scanned.
    #[error("failed to read agreement count: {0}")]
    CountRead(#[source] LedgerError),

    /// A log or receipt read on the origin chain failed.
    #[error("failed to read origin chain: {0}")]
    OriginRead(#[source] LedgerError),

    /// The execution's secret could not be fetched.
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// A decoded registration log was malformed.
    #[error("relay decode failed: {0}")]
    Relay(#[from] RelayError),

    /// A report could not be signed or written.
    #[error("report submission failed: {0}")]
    Submission(#[from] SubmitError),

    /// A handler was invoked with an event of the wrong family.
    #[error("{handler} cannot handle a {event} event")]
    UnexpectedEvent {
        handler: HandlerKind,
        event: &'static str,
    },
}
