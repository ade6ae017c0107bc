//! # SLA Agreements
//!
//! Read-only mirror of the on-ledger agreement record. Agreements are created
//! and deactivated entirely on the ledger; ids are assigned sequentially from
//! zero, so the full id space at any moment is `[0, count)`.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::bps::Bps;
use crate::error::ValidationError;

/// Sequential ledger-assigned agreement identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgreementId(u64);

impl AgreementId {
    /// Wrap a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Narrow a `uint256` id read from the ledger.
    pub fn from_u256(id: U256) -> Result<Self, ValidationError> {
        u64::try_from(id)
            .map(Self)
            .map_err(|_| ValidationError::AgreementIdOutOfRange(id.to_string()))
    }

    /// The raw id.
    pub fn value(self) -> u64 {
        self.0
    }

    /// The id widened to `uint256` for ABI encoding.
    pub fn to_u256(self) -> U256 {
        U256::from(self.0)
    }
}

impl From<u64> for AgreementId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AgreementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An SLA binding a provider and tenant to an uptime threshold and penalty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    /// Ledger-assigned id.
    pub id: AgreementId,
    /// Provider whose bond backs the agreement.
    pub provider: Address,
    /// Tenant protected by the agreement.
    pub tenant: Address,
    /// Bonded collateral in the smallest currency unit.
    pub bond_amount: U256,
    /// Contracted incident response time, in hours.
    pub response_time_hrs: U256,
    /// Minimum acceptable uptime.
    pub min_uptime_bps: Bps,
    /// Share of the bond slashed per recorded breach.
    pub penalty_bps: Bps,
    /// Creation time as a unix timestamp.
    pub created_at: U256,
    /// Whether the agreement is currently enforced.
    pub active: bool,
}

impl Agreement {
    /// Collateral a single breach would slash at the current penalty rate.
    pub fn penalty_amount(&self) -> U256 {
        self.bond_amount.saturating_mul(self.penalty_bps.to_u256()) / U256::from(crate::bps::MAX_BPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agreement(bond: u64, penalty: u16) -> Agreement {
        Agreement {
            id: AgreementId::new(3),
            provider: Address::repeat_byte(0x11),
            tenant: Address::repeat_byte(0x22),
            bond_amount: U256::from(bond),
            response_time_hrs: U256::from(4u64),
            min_uptime_bps: Bps::new(9950).unwrap(),
            penalty_bps: Bps::new(penalty).unwrap(),
            created_at: U256::from(1_700_000_000u64),
            active: true,
        }
    }

    #[test]
    fn agreement_id_from_u256() {
        assert_eq!(AgreementId::from_u256(U256::from(7u64)).unwrap().value(), 7);
        assert!(AgreementId::from_u256(U256::MAX).is_err());
    }

    #[test]
    fn penalty_amount_scales_bond() {
        // 10 % of 1 ether.
        let a = agreement(1_000_000_000_000_000_000, 1000);
        assert_eq!(a.penalty_amount(), U256::from(100_000_000_000_000_000u64));
    }

    #[test]
    fn penalty_amount_truncates() {
        assert_eq!(agreement(3, 5000).penalty_amount(), U256::from(1u64));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(agreement(1, 1)).unwrap();
        assert!(json.get("minUptimeBps").is_some());
        assert!(json.get("bondAmount").is_some());
        assert_eq!(json["active"], true);
    }
}
