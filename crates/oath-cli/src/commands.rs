//! Subcommand handlers. Each returns the process exit code on success.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use alloy_primitives::B256;
use clap::Args;
use oath_core::Role;
use serde::Serialize;

use crate::dispatch::{DispatchOptions, Dispatcher};
use crate::host::build_workflow;
use crate::settings::HostSettings;

/// Arguments for `oath relay`.
#[derive(Args, Debug)]
pub struct RelayArgs {
    /// Registry role of the registrations to relay (`provider` or `arbitrator`).
    #[arg(long)]
    pub role: Role,

    /// Origin-chain transaction that emitted the registration events.
    #[arg(long)]
    pub tx_hash: String,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Serve every binding until Ctrl-C.
pub async fn run_serve(settings_path: &Path) -> Result<u8> {
    let settings = HostSettings::load(settings_path)?;
    let workflow = Arc::new(build_workflow(&settings)?);
    tracing::info!(workflow_id = %workflow.workflow_id(), "starting local host");

    let dispatcher = Dispatcher::new(
        workflow,
        DispatchOptions {
            execution_timeout: Duration::from_secs(settings.execution_timeout_secs),
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
        },
    );
    dispatcher
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
            }
        })
        .await;
    Ok(0)
}

/// One cron-equivalent scan. Prints the summary.
pub async fn run_scan(settings_path: &Path) -> Result<u8> {
    let settings = HostSettings::load(settings_path)?;
    let workflow = build_workflow(&settings)?;
    let budget = Duration::from_secs(settings.execution_timeout_secs);
    let summary = tokio::time::timeout(budget, workflow.on_cron())
        .await
        .context("scan exceeded its execution budget")?
        .context("scan failed")?;
    print_json(&summary)?;
    Ok(0)
}

/// Relay the registrations of one origin-chain transaction.
pub async fn run_relay(settings_path: &Path, args: &RelayArgs) -> Result<u8> {
    let tx_hash: B256 = args
        .tx_hash
        .parse()
        .with_context(|| format!("invalid transaction hash {}", args.tx_hash))?;
    let settings = HostSettings::load(settings_path)?;
    let workflow = build_workflow(&settings)?;
    let budget = Duration::from_secs(settings.execution_timeout_secs);
    let outcomes = tokio::time::timeout(budget, workflow.relay_transaction(args.role, tx_hash))
        .await
        .context("relay exceeded its execution budget")?
        .context("relay failed")?;
    print_json(&outcomes)?;
    Ok(if outcomes.is_empty() { 2 } else { 0 })
}

/// Print the trigger bindings.
pub fn run_triggers(settings_path: &Path) -> Result<u8> {
    let settings = HostSettings::load(settings_path)?;
    let (_, bindings) = oath_workflow::init_workflow(&settings.workflow)
        .context("invalid workflow configuration")?;
    print_json(&bindings)?;
    Ok(0)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationReport<'a> {
    workflow_id: B256,
    config: &'a oath_workflow::ValidatedConfig,
    executors: usize,
    bindings: usize,
}

/// Check the settings and every derived client configuration.
pub fn run_validate(settings_path: &Path) -> Result<u8> {
    let settings = HostSettings::load(settings_path)?;
    let workflow = build_workflow(&settings)?;
    print_json(&ValidationReport {
        workflow_id: workflow.workflow_id(),
        config: workflow.config(),
        executors: settings.executors,
        bindings: workflow.bindings().len(),
    })?;
    eprintln!("OK: {}", settings_path.display());
    Ok(0)
}
