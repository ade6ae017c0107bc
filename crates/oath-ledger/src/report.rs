//! # Signed Reports
//!
//! A report is the artifact the host runtime produces from an encoded
//! contract call: the call payload, a context identifying the execution and
//! destination chain, and one signature per executor over
//! `keccak256(payload || context)`. The ledger client decides how to deliver
//! it (straight to the receiver, or through a forwarder contract that checks
//! the signatures).

use alloy_primitives::{keccak256, Address, Bytes, B256};
use alloy_sol_types::{SolCall, SolValue};
use serde::{Deserialize, Serialize};

use crate::abi::IReportForwarder;

/// Execution metadata bound into every signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportContext {
    /// Identifier of the registered workflow.
    pub workflow_id: B256,
    /// Identifier of the trigger invocation that produced the report.
    pub execution_id: B256,
    /// Destination chain selector.
    pub chain_selector: u64,
}

impl ReportContext {
    /// ABI encoding `(bytes32, bytes32, uint64)`.
    pub fn encode(&self) -> Bytes {
        (self.workflow_id, self.execution_id, self.chain_selector)
            .abi_encode()
            .into()
    }
}

/// One executor's signature over a report digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSignature {
    /// Signer public key.
    pub signer: B256,
    /// Raw signature bytes.
    pub signature: Bytes,
}

/// A signed report ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// ABI-encoded contract call for the receiver.
    pub payload: Bytes,
    /// Execution metadata.
    pub context: ReportContext,
    /// Executor signatures over [`Report::digest`].
    pub signatures: Vec<ReportSignature>,
}

impl Report {
    /// Digest each executor signs: `keccak256(payload || encode(context))`.
    pub fn digest_of(payload: &[u8], context: &ReportContext) -> B256 {
        let mut preimage = payload.to_vec();
        preimage.extend_from_slice(&context.encode());
        keccak256(preimage)
    }

    /// Digest of this report.
    pub fn digest(&self) -> B256 {
        Self::digest_of(&self.payload, &self.context)
    }

    /// Calldata for `IReportForwarder.report(receiver, rawReport, reportContext, signatures)`.
    pub fn forwarder_calldata(&self, receiver: Address) -> Bytes {
        IReportForwarder::reportCall {
            receiver,
            rawReport: self.payload.clone(),
            reportContext: self.context.encode(),
            signatures: self
                .signatures
                .iter()
                .map(|s| {
                    let mut packed = s.signer.to_vec();
                    packed.extend_from_slice(&s.signature);
                    Bytes::from(packed)
                })
                .collect(),
        }
        .abi_encode()
        .into()
    }
}
