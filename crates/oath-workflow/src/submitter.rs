//! # Report Submitter
//!
//! Encodes a decision as a contract call, has it signed into a report, and
//! writes the report to the home ledger. Both call sites share one path:
//!
//! - breach: `recordBreach(slaId, uptimeBps, penaltyBps)`, guarded by the
//!   idempotency store;
//! - relay: `registerProviderRelayed` / `registerArbitratorRelayed`, never
//!   deduplicated (every registration event is written exactly once).
//!
//! A breach key is reserved before signing and released if the write
//! fails. Any failure propagates to the caller and ends that handler invocation.

use alloy_primitives::{Address, Bytes};
use oath_core::{BreachDecision, RelayRequest};
use oath_ledger::{record_breach_calldata, relay_calldata, EvmClient, ReportContext, WriteReceipt};
use serde::Serialize;

use crate::dedup::{DedupStore, IdempotencyKey};
use crate::error::SubmitError;
use crate::execution::Execution;
use crate::signer::ReportSigner;

/// Outcome of a breach submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum Submission {
    /// The report was written.
    Written {
        key: IdempotencyKey,
        receipt: WriteReceipt,
    },
    /// A report for the same key was already written; nothing was sent.
    Duplicate { key: IdempotencyKey },
}

/// Writes signed reports to one receiver contract.
pub struct ReportSubmitter<'a, C, S, D> {
    client: &'a C,
    signer: &'a S,
    dedup: &'a D,
    receiver: Address,
    chain_selector: u64,
    window_secs: u64,
}

impl<'a, C, S, D> ReportSubmitter<'a, C, S, D>
where
    C: EvmClient,
    S: ReportSigner,
    D: DedupStore,
{
    pub fn new(
        client: &'a C,
        signer: &'a S,
        dedup: &'a D,
        receiver: Address,
        chain_selector: u64,
        window_secs: u64,
    ) -> Self {
        Self {
            client,
            signer,
            dedup,
            receiver,
            chain_selector,
            window_secs,
        }
    }

    /// Submit a breach unless its idempotency key was already written.
    pub async fn submit_breach(
        &self,
        execution: &Execution,
        decision: &BreachDecision,
    ) -> Result<Submission, SubmitError> {
        let key = IdempotencyKey::for_decision(decision, self.window_secs);
        if !self.dedup.reserve(key) {
            tracing::info!(
                agreement_id = %decision.agreement_id,
                %key,
                "breach already reported or in flight for this window, skipping write"
            );
            return Ok(Submission::Duplicate { key });
        }

        let receipt = match self.write(execution, record_breach_calldata(decision)).await {
            Ok(receipt) => receipt,
            Err(e) => {
                self.dedup.release(key);
                return Err(e);
            }
        };
        self.dedup.commit(key);

        tracing::info!(
            agreement_id = %decision.agreement_id,
            uptime_bps = decision.observed_uptime_bps.value(),
            penalty_bps = decision.penalty_bps.value(),
            tx_hash = %receipt.tx_hash,
            "breach recorded"
        );
        Ok(Submission::Written { key, receipt })
    }

    /// Submit a relayed registration.
    pub async fn submit_relay(
        &self,
        execution: &Execution,
        request: &RelayRequest,
    ) -> Result<WriteReceipt, SubmitError> {
        let receipt = self.write(execution, relay_calldata(request)).await?;
        tracing::info!(
            role = %request.role,
            subject = %request.subject_address,
            nullifier_hash = %request.nullifier_hash,
            tx_hash = %receipt.tx_hash,
            "registration relayed"
        );
        Ok(receipt)
    }

    async fn write(&self, execution: &Execution, payload: Bytes) -> Result<WriteReceipt, SubmitError> {
        let context = ReportContext {
            workflow_id: execution.workflow_id,
            execution_id: execution.id,
            chain_selector: self.chain_selector,
        };
        let report = self.signer.sign(payload, context)?;
        Ok(self.client.write_report(self.receiver, &report).await?)
    }
}
