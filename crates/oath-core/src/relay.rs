//! # Relay Requests
//!
//! Identity registrations verified on the origin ledger are forwarded to the
//! home ledger's trusted-forwarder entry points. The destination accepts the
//! registration without re-running proof verification.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Which registry role the relayed identity is claiming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// SLA provider posting bonds.
    Provider,
    /// Arbitrator ruling on claims.
    Arbitrator,
}

impl Role {
    /// Lowercase name used in logs and CLI arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Arbitrator => "arbitrator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "provider" => Ok(Self::Provider),
            "arbitrator" => Ok(Self::Arbitrator),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A decoded registration event, built once and submitted exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    /// Registry role.
    pub role: Role,
    /// Verified identity's address.
    pub subject_address: Address,
    /// One-time identity-proof artifact.
    pub nullifier_hash: U256,
    /// Identity-tree root the origin ledger verified against.
    pub source_root: U256,
}
