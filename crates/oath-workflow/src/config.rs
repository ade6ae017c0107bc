//! # Workflow Configuration
//!
//! The document the host injects at initialization. Field names are
//! camelCase and unknown fields are rejected, so a typo fails loudly
//! instead of silently falling back to a default.
//!
//! [`WorkflowConfig::validate`] turns the raw strings into typed values.
//! Every check runs before any trigger binding exists.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::chains::{self, ChainInfo};
use crate::error::ConfigError;

/// Default idempotency window, equal to the scan interval.
pub const DEFAULT_DEDUP_WINDOW_SECS: u64 = 900;

fn default_true() -> bool {
    true
}

fn default_dedup_window() -> u64 {
    DEFAULT_DEDUP_WINDOW_SECS
}

/// Raw workflow configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkflowConfig {
    /// SLA enforcement contract on the home chain.
    pub sla_contract_address: String,
    /// Base URL of the uptime telemetry API.
    pub uptime_api_url: String,
    /// Home chain selector name.
    pub chain_selector_name: String,
    /// Identity registry contract on the origin chain.
    pub registry_contract_address: String,
    /// Origin chain selector name.
    pub origin_chain_selector_name: String,
    /// Whether both chains must be test networks.
    #[serde(default = "default_true")]
    pub is_testnet: bool,
    /// Width of the breach idempotency window in seconds.
    #[serde(default = "default_dedup_window")]
    pub dedup_window_secs: u64,
}

/// Configuration after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedConfig {
    pub sla_contract: Address,
    pub uptime_api_url: url::Url,
    pub home_chain: &'static ChainInfo,
    pub registry_contract: Address,
    pub origin_chain: &'static ChainInfo,
    pub dedup_window_secs: u64,
}

impl WorkflowConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every field and resolve chain names.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let sla_contract = parse_address("slaContractAddress", &self.sla_contract_address)?;
        let registry_contract =
            parse_address("registryContractAddress", &self.registry_contract_address)?;
        let uptime_api_url = parse_http_url("uptimeApiUrl", &self.uptime_api_url)?;
        let home_chain = chains::resolve(&self.chain_selector_name, self.is_testnet)?;
        let origin_chain = chains::resolve(&self.origin_chain_selector_name, self.is_testnet)?;

        if self.dedup_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dedupWindowSecs",
                reason: "must be greater than zero".into(),
            });
        }

        Ok(ValidatedConfig {
            sla_contract,
            uptime_api_url,
            home_chain,
            registry_contract,
            origin_chain,
            dedup_window_secs: self.dedup_window_secs,
        })
    }
}

/// Parse a `0x`-prefixed address. Mixed-case input must carry a valid
/// EIP-55 checksum; all-lowercase or all-uppercase input is accepted as is.
pub fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
        reason,
    };

    let hex = value
        .strip_prefix("0x")
        .ok_or_else(|| invalid("missing 0x prefix".into()))?;
    let mixed_case = hex.bytes().any(|b| b.is_ascii_uppercase())
        && hex.bytes().any(|b| b.is_ascii_lowercase());

    let address = if mixed_case {
        Address::parse_checksummed(value, None).map_err(|e| invalid(e.to_string()))?
    } else {
        value
            .parse::<Address>()
            .map_err(|e| invalid(e.to_string()))?
    };

    if address.is_zero() {
        return Err(invalid("zero address".into()));
    }
    Ok(address)
}

/// Parse an absolute `http` or `https` URL with a host.
pub fn parse_http_url(field: &'static str, value: &str) -> Result<url::Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason,
    };

    let url = url::Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".into()));
    }
    Ok(url)
}
