//! # oath-workflow: Compliance Enforcement Workflow
//!
//! The trigger-driven job at the centre of OathLayer. On every firing it
//! either scans all agreements for uptime breaches and slashes the bonds
//! of providers below threshold, or relays a verified identity
//! registration from the origin ledger to the home ledger.
//!
//! ## Capabilities
//!
//! The workflow implements no scheduling, consensus protocol or key
//! custody. It consumes them from the host through traits:
//!
//! | Trait | Supplies |
//! |-------|----------|
//! | [`oath_ledger::EvmClient`] | home and origin chain access |
//! | [`UptimeSource`] | per-executor telemetry reads |
//! | [`ConsensusExecutor`] | identical-value aggregation across executors |
//! | [`ReportSigner`] | signed reports |
//! | [`SecretStore`] | the telemetry bearer token |
//! | [`DedupStore`] | breach idempotency keys |
//!
//! A [`Host`] names one concrete type for each. The `oath` binary provides
//! a local host; tests provide in-memory ones.
//!
//! ## Crate Policy
//!
//! - Configuration errors are fatal and surface before any binding exists.
//! - Per-agreement failures are logged and counted, never propagated.
//! - Write failures propagate and end the invocation.

pub mod chains;
pub mod config;
pub mod consensus;
pub mod dedup;
pub mod error;
pub mod execution;
pub mod relay;
pub mod scanner;
pub mod secrets;
pub mod signer;
pub mod submitter;
pub mod triggers;
pub mod uptime;
pub mod workflow;

pub use chains::ChainInfo;
pub use config::{ValidatedConfig, WorkflowConfig};
pub use consensus::{ConsensusExecutor, ConsensusResult, LocalConsensus, NodeContext};
pub use dedup::{DedupStore, IdempotencyKey, InMemoryDedupStore, NoDedup};
pub use error::{ConfigError, ConsensusFailure, RelayError, SecretError, SubmitError, WorkflowError};
pub use execution::Execution;
pub use secrets::{EnvSecretStore, SecretStore, StaticSecretStore, UPTIME_API_KEY};
pub use signer::{QuorumSigner, ReportSigner};
pub use submitter::{ReportSubmitter, Submission};
pub use triggers::{init_workflow, Binding, HandlerKind, Trigger, TriggerEvent};
pub use uptime::UptimeSource;
pub use workflow::{Capabilities, HandlerOutput, Host, RelayOutcome, ScanSummary, Workflow};
