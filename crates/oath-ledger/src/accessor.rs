//! # SLA Contract Accessor
//!
//! Typed read bindings to the SLA enforcement contract, plus the calldata
//! builders for the two write paths (breach records and relayed
//! registrations). Writes themselves go through a signed report, so this
//! module only encodes them.

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use oath_core::{Agreement, AgreementId, BreachDecision, Bps, RelayRequest, Role};

use crate::abi::ISlaEnforcement;
use crate::client::EvmClient;
use crate::error::LedgerError;

/// Typed view of one deployed SLA enforcement contract.
#[derive(Debug)]
pub struct SlaLedger<C> {
    client: C,
    contract: Address,
}

impl<C: EvmClient> SlaLedger<C> {
    /// Bind a client to a contract address.
    pub fn new(client: C, contract: Address) -> Self {
        Self { client, contract }
    }

    /// The contract address.
    pub fn contract(&self) -> Address {
        self.contract
    }

    /// The underlying chain client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// `slaCount()`: number of agreements ever created.
    pub async fn agreement_count(&self) -> Result<u64, LedgerError> {
        let data = ISlaEnforcement::slaCountCall {}.abi_encode();
        let reply = self.client.call_contract(self.contract, data.into()).await?;
        let count = ISlaEnforcement::slaCountCall::abi_decode_returns(&reply, true)
            .map_err(|e| decode_error("slaCount", e))?
            ._0;
        u64::try_from(count).map_err(|_| LedgerError::Decode {
            what: "slaCount".into(),
            reason: format!("count {count} does not fit u64"),
        })
    }

    /// `slas(id)`: the full record for one agreement.
    pub async fn agreement(&self, id: AgreementId) -> Result<Agreement, LedgerError> {
        let data = ISlaEnforcement::slasCall { id: id.to_u256() }.abi_encode();
        let reply = self.client.call_contract(self.contract, data.into()).await?;
        let r = ISlaEnforcement::slasCall::abi_decode_returns(&reply, true)
            .map_err(|e| decode_error("slas", e))?;

        Ok(Agreement {
            id,
            provider: r.provider,
            tenant: r.tenant,
            bond_amount: r.bondAmount,
            response_time_hrs: r.responseTimeHrs,
            min_uptime_bps: Bps::from_u256(r.minUptimeBps, "minUptimeBps")?,
            penalty_bps: Bps::from_u256(r.penaltyBps, "penaltyBps")?,
            created_at: r.createdAt,
            active: r.active,
        })
    }
}

/// Calldata for `recordBreach(slaId, uptimeBps, penaltyBps)`.
pub fn record_breach_calldata(decision: &BreachDecision) -> Bytes {
    ISlaEnforcement::recordBreachCall {
        slaId: decision.agreement_id.to_u256(),
        uptimeBps: decision.observed_uptime_bps.to_u256(),
        penaltyBps: decision.penalty_bps.to_u256(),
    }
    .abi_encode()
    .into()
}

/// Calldata for `registerProviderRelayed` / `registerArbitratorRelayed`.
pub fn relay_calldata(request: &RelayRequest) -> Bytes {
    match request.role {
        Role::Provider => ISlaEnforcement::registerProviderRelayedCall {
            subject: request.subject_address,
            nullifierHash: request.nullifier_hash,
        }
        .abi_encode(),
        Role::Arbitrator => ISlaEnforcement::registerArbitratorRelayedCall {
            subject: request.subject_address,
            nullifierHash: request.nullifier_hash,
        }
        .abi_encode(),
    }
    .into()
}

fn decode_error(what: &str, e: alloy_sol_types::Error) -> LedgerError {
    LedgerError::Decode {
        what: format!("{what} return data"),
        reason: e.to_string(),
    }
}
