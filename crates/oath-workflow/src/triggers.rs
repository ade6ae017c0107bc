//! # Trigger Bindings
//!
//! The workflow registers four bindings with the host and never schedules
//! anything itself:
//!
//! | # | Trigger | Handler |
//! |---|---------|---------|
//! | 1 | cron `0 */15 * * * *` | [`HandlerKind::ScanAgreements`] |
//! | 2 | `ClaimFiled` on the home chain, SLA contract | [`HandlerKind::ScanAgreements`] |
//! | 3 | `ProviderRegistrationRequested` on the origin chain, registry | [`HandlerKind::RelayProvider`] |
//! | 4 | `ArbitratorRegistrationRequested` on the origin chain, registry | [`HandlerKind::RelayArbitrator`] |

use alloy_primitives::{Address, B256};
use alloy_sol_types::SolEvent;
use oath_core::Role;
use oath_ledger::abi::{IIdentityRegistry, ISlaEnforcement};
use oath_ledger::{EvmLog, LogFilter};
use serde::Serialize;

use crate::config::{ValidatedConfig, WorkflowConfig};
use crate::error::ConfigError;

/// Proactive scan schedule (seconds field first).
pub const SCAN_SCHEDULE: &str = "0 */15 * * * *";

/// Interval implied by [`SCAN_SCHEDULE`].
pub const SCAN_INTERVAL_SECS: u64 = 900;

/// Which handler a binding invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HandlerKind {
    ScanAgreements,
    RelayProvider,
    RelayArbitrator,
}

impl HandlerKind {
    /// The relay role, for relay handlers.
    pub fn role(self) -> Option<Role> {
        match self {
            Self::ScanAgreements => None,
            Self::RelayProvider => Some(Role::Provider),
            Self::RelayArbitrator => Some(Role::Arbitrator),
        }
    }

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Provider => Self::RelayProvider,
            Role::Arbitrator => Self::RelayArbitrator,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ScanAgreements => "scanAgreements",
            Self::RelayProvider => "relayProvider",
            Self::RelayArbitrator => "relayArbitrator",
        }
    }
}

impl std::fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What fires a handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Trigger {
    /// Time-based, independent of chain state.
    #[serde(rename_all = "camelCase")]
    Cron { schedule: String, interval_secs: u64 },
    /// A finalized log from one contract with one event signature.
    #[serde(rename_all = "camelCase")]
    EvmLog {
        chain_selector_name: String,
        chain_selector: u64,
        address: Address,
        topic0: B256,
    },
}

impl Trigger {
    /// The log filter for a block range, for log triggers.
    pub fn log_filter(&self, from_block: u64, to_block: u64) -> Option<LogFilter> {
        match self {
            Self::EvmLog { address, topic0, .. } => Some(LogFilter {
                address: *address,
                topic0: *topic0,
                from_block,
                to_block,
            }),
            Self::Cron { .. } => None,
        }
    }
}

/// One trigger bound to one handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub trigger: Trigger,
    pub handler: HandlerKind,
}

/// The payload a trigger delivers to its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    Cron { fired_at: chrono::DateTime<chrono::Utc> },
    Log(EvmLog),
}

impl TriggerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cron { .. } => "cron",
            Self::Log(_) => "log",
        }
    }
}

/// The four bindings for a validated configuration.
pub fn bindings(config: &ValidatedConfig) -> Vec<Binding> {
    let home = config.home_chain;
    let origin = config.origin_chain;
    let registry_log = |topic0: B256| Trigger::EvmLog {
        chain_selector_name: origin.name.to_string(),
        chain_selector: origin.selector,
        address: config.registry_contract,
        topic0,
    };

    vec![
        Binding {
            trigger: Trigger::Cron {
                schedule: SCAN_SCHEDULE.to_string(),
                interval_secs: SCAN_INTERVAL_SECS,
            },
            handler: HandlerKind::ScanAgreements,
        },
        Binding {
            trigger: Trigger::EvmLog {
                chain_selector_name: home.name.to_string(),
                chain_selector: home.selector,
                address: config.sla_contract,
                topic0: ISlaEnforcement::ClaimFiled::SIGNATURE_HASH,
            },
            handler: HandlerKind::ScanAgreements,
        },
        Binding {
            trigger: registry_log(IIdentityRegistry::ProviderRegistrationRequested::SIGNATURE_HASH),
            handler: HandlerKind::RelayProvider,
        },
        Binding {
            trigger: registry_log(IIdentityRegistry::ArbitratorRegistrationRequested::SIGNATURE_HASH),
            handler: HandlerKind::RelayArbitrator,
        },
    ]
}

/// Validate `config` and produce its bindings. A configuration error
/// yields no binding at all.
pub fn init_workflow(config: &WorkflowConfig) -> Result<(ValidatedConfig, Vec<Binding>), ConfigError> {
    let validated = config.validate()?;
    let bindings = bindings(&validated);
    Ok((validated, bindings))
}
