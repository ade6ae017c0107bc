//! # oath-ledger: Ledger Accessor for OathLayer
//!
//! Typed bindings to the two contracts the enforcement workflow touches:
//! the SLA enforcement contract on the home ledger (agreement reads, breach
//! records, relayed registrations) and the identity registry on the origin
//! ledger (registration-request events).
//!
//! ## Layers
//!
//! - [`abi`]: Solidity interfaces via `alloy-sol-types`.
//! - [`client::EvmClient`]: the chain capability (finalized reads, report
//!   writes, logs).
//! - [`rpc::JsonRpcEvmClient`]: JSON-RPC implementation.
//! - [`accessor::SlaLedger`]: typed agreement reads and write calldata.
//! - [`report`]: the signed report artifact and forwarder encoding.
//!
//! Contract state transitions and authorization live in the contracts; this
//! crate only encodes, decodes and transports.

pub mod abi;
pub mod accessor;
pub mod client;
pub mod error;
pub mod log;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod report;
pub mod rpc;

pub use accessor::{record_breach_calldata, relay_calldata, SlaLedger};
pub use client::{EvmClient, WriteReceipt, WriteStatus};
pub use error::LedgerError;
pub use log::{EvmLog, LogFilter};
pub use report::{Report, ReportContext, ReportSignature};
pub use rpc::{EvmRpcConfig, JsonRpcEvmClient};
