//! # Host Settings
//!
//! YAML file read by the `oath` binary. The `workflow` block is the
//! workflow's own configuration, passed through unchanged. Everything else
//! configures the local host: where the chains are, how many executors to
//! simulate, and the time budgets.
//!
//! ```yaml
//! workflow:
//!   slaContractAddress: "0x5FbDB2315678afecb367f032d93F642f64180aa3"
//!   uptimeApiUrl: "http://localhost:3001"
//!   chainSelectorName: ethereum-testnet-sepolia
//!   registryContractAddress: "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512"
//!   originChainSelectorName: ethereum-testnet-sepolia-worldchain-1
//! homeRpc:
//!   rpcUrl: "http://localhost:8545"
//! originRpc:
//!   rpcUrl: "http://localhost:8546"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use oath_workflow::WorkflowConfig;

/// Default number of simulated executors.
pub const DEFAULT_EXECUTORS: usize = 4;
/// Default per-executor timeout for one telemetry read.
pub const DEFAULT_NODE_TIMEOUT_SECS: u64 = 10;
/// Default wall-clock budget for one handler invocation.
pub const DEFAULT_EXECUTION_TIMEOUT_SECS: u64 = 300;
/// Default interval between finalized-log polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 12;
/// Default age at which a written breach key is forgotten.
pub const DEFAULT_DEDUP_RETENTION_SECS: u64 = oath_workflow::dedup::DEFAULT_RETENTION_SECS;

fn default_executors() -> usize {
    DEFAULT_EXECUTORS
}

fn default_node_timeout_secs() -> u64 {
    DEFAULT_NODE_TIMEOUT_SECS
}

fn default_execution_timeout_secs() -> u64 {
    DEFAULT_EXECUTION_TIMEOUT_SECS
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_dedup_retention_secs() -> u64 {
    DEFAULT_DEDUP_RETENTION_SECS
}

fn default_api_key_env() -> String {
    oath_workflow::UPTIME_API_KEY.to_string()
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

/// RPC endpoint for one chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChainRpcSettings {
    pub rpc_url: String,
    /// Sender for write transactions.
    #[serde(default)]
    pub from_address: Option<String>,
    /// Report forwarder; reports go straight to the receiver when absent.
    #[serde(default)]
    pub forwarder_address: Option<String>,
    #[serde(default = "default_rpc_timeout_secs")]
    pub timeout_secs: u64,
}

/// Everything the local host needs to run the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HostSettings {
    pub workflow: WorkflowConfig,
    pub home_rpc: ChainRpcSettings,
    pub origin_rpc: ChainRpcSettings,
    #[serde(default = "default_executors")]
    pub executors: usize,
    /// Signatures required on a report. Defaults to `(executors - 1) / 3 + 1`.
    #[serde(default)]
    pub quorum: Option<usize>,
    #[serde(default = "default_node_timeout_secs")]
    pub node_timeout_secs: u64,
    #[serde(default = "default_execution_timeout_secs")]
    pub execution_timeout_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// How long a written breach key suppresses rewrites.
    #[serde(default = "default_dedup_retention_secs")]
    pub dedup_retention_secs: u64,
    /// Environment variable holding the telemetry bearer token.
    #[serde(default = "default_api_key_env")]
    pub uptime_api_key_env: String,
}

impl HostSettings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("failed to parse host settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("in {}", path.display()))
    }
}
