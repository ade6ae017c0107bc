//! # Local Host
//!
//! Concrete capability set for running the workflow on one machine:
//! JSON-RPC chain clients, the HTTP telemetry client, in-process consensus
//! over simulated executors, ephemeral executor keys, secrets from the
//! environment, and an in-memory idempotency store.
//!
//! Executor keys are generated at startup and live only as long as the
//! process. Their public halves are logged so a forwarder can be pointed
//! at them.

use std::time::Duration;

use anyhow::{Context, Result};
use oath_ledger::{EvmRpcConfig, JsonRpcEvmClient};
use oath_telemetry::{RetryPolicy, TelemetryConfig, UptimeClient};
use oath_workflow::config::parse_address;
use oath_workflow::signer::default_quorum;
use oath_workflow::{
    Capabilities, EnvSecretStore, Host, InMemoryDedupStore, LocalConsensus, QuorumSigner,
    ValidatedConfig, Workflow, UPTIME_API_KEY,
};

use crate::settings::{ChainRpcSettings, HostSettings};

/// Capability types of the local host.
pub struct LocalHost;

impl Host for LocalHost {
    type HomeChain = JsonRpcEvmClient;
    type OriginChain = JsonRpcEvmClient;
    type Uptime = UptimeClient;
    type Consensus = LocalConsensus;
    type Signer = QuorumSigner;
    type Secrets = EnvSecretStore;
    type Dedup = InMemoryDedupStore;
}

/// Build the RPC client configuration for one chain.
pub fn rpc_config(chain_name: &str, rpc: &ChainRpcSettings) -> Result<EvmRpcConfig> {
    let url: url::Url = rpc
        .rpc_url
        .parse()
        .with_context(|| format!("invalid rpcUrl for {chain_name}: {}", rpc.rpc_url))?;
    let mut config = EvmRpcConfig::new(url, chain_name);
    config.timeout_secs = rpc.timeout_secs;
    if let Some(from) = &rpc.from_address {
        config = config.with_from(parse_address("fromAddress", from)?);
    }
    if let Some(forwarder) = &rpc.forwarder_address {
        config = config.with_forwarder(parse_address("forwarderAddress", forwarder)?);
    }
    Ok(config)
}

/// Telemetry client settings whose retries fit inside one executor's read
/// budget.
pub fn telemetry_config(config: &ValidatedConfig, node_timeout: Duration) -> TelemetryConfig {
    TelemetryConfig::new(config.uptime_api_url.clone()).with_retry(RetryPolicy::within(node_timeout))
}

/// Validate the settings and wire up every capability.
pub fn build_workflow(settings: &HostSettings) -> Result<Workflow<LocalHost>> {
    let config: ValidatedConfig = settings
        .workflow
        .validate()
        .context("invalid workflow configuration")?;

    let home_chain = JsonRpcEvmClient::new(rpc_config(config.home_chain.name, &settings.home_rpc)?)
        .context("failed to build home chain client")?;
    let origin_chain =
        JsonRpcEvmClient::new(rpc_config(config.origin_chain.name, &settings.origin_rpc)?)
            .context("failed to build origin chain client")?;
    let node_timeout = Duration::from_secs(settings.node_timeout_secs);
    let uptime = UptimeClient::new(telemetry_config(&config, node_timeout))
        .context("failed to build telemetry client")?;

    let consensus = LocalConsensus::new(settings.executors, node_timeout)?;
    let quorum = settings
        .quorum
        .unwrap_or_else(|| default_quorum(settings.executors));
    let signer = QuorumSigner::generate(settings.executors, quorum)?;
    for (node, key) in signer.signers().iter().enumerate() {
        tracing::info!(node, public_key = %alloy_primitives::hex::encode(key.as_bytes()), "executor key");
    }

    let secrets = EnvSecretStore::new().map(UPTIME_API_KEY, settings.uptime_api_key_env.clone());

    tracing::info!(
        home = config.home_chain.name,
        origin = config.origin_chain.name,
        sla_contract = %config.sla_contract,
        registry_contract = %config.registry_contract,
        executors = settings.executors,
        quorum,
        "local host ready"
    );

    Ok(Workflow::new(
        config,
        Capabilities {
            home_chain,
            origin_chain,
            uptime,
            consensus,
            signer,
            secrets,
            dedup: InMemoryDedupStore::with_retention_secs(settings.dedup_retention_secs),
        },
    ))
}
