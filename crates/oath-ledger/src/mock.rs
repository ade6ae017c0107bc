//! # In-Memory Ledger
//!
//! [`MockLedger`] answers the SLA contract's read calls from a list of
//! agreements, records every report written to it, and serves logs that
//! tests push into it. Failure injection covers the error taxonomy the
//! workflow must handle: count-read failure, per-agreement read failure,
//! and reverted writes.
//!
//! ## Warning
//!
//! Provides no chain semantics beyond what the workflow reads. Only for
//! tests and local simulation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolInterface};
use oath_core::Agreement;

use crate::abi::ISlaEnforcement::{self, ISlaEnforcementCalls};
use crate::client::{EvmClient, WriteReceipt, WriteStatus};
use crate::error::LedgerError;
use crate::log::{EvmLog, LogFilter};
use crate::report::Report;

/// A report the mock accepted.
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    /// Receiver contract.
    pub receiver: Address,
    /// The delivered report.
    pub report: Report,
}

impl RecordedWrite {
    /// The report payload decoded as an SLA contract call.
    pub fn decoded(&self) -> Option<ISlaEnforcementCalls> {
        ISlaEnforcementCalls::abi_decode(&self.report.payload, true).ok()
    }
}

#[derive(Debug, Default)]
struct State {
    agreements: Vec<Agreement>,
    failing_reads: HashSet<u64>,
    fail_count: bool,
    revert_writes: bool,
    writes: Vec<RecordedWrite>,
    logs: Vec<EvmLog>,
    finalized_block: u64,
}

/// Shared handle to an in-memory SLA ledger. Clones share state.
#[derive(Debug, Clone)]
pub struct MockLedger {
    chain_name: String,
    state: Arc<Mutex<State>>,
}

impl MockLedger {
    /// Create an empty ledger bound to a chain name.
    pub fn new(chain_name: impl Into<String>) -> Self {
        Self {
            chain_name: chain_name.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an agreement. Ids are expected to be sequential from zero.
    pub fn push_agreement(&self, agreement: Agreement) {
        self.state().agreements.push(agreement);
    }

    /// Make `slas(id)` fail with a transport error.
    pub fn fail_read(&self, id: u64) {
        self.state().failing_reads.insert(id);
    }

    /// Make `slaCount()` fail with a transport error.
    pub fn fail_count(&self) {
        self.state().fail_count = true;
    }

    /// Make every subsequent write revert.
    pub fn revert_writes(&self, revert: bool) {
        self.state().revert_writes = revert;
    }

    /// Add a log and advance the finalized head to include it.
    pub fn push_log(&self, log: EvmLog) {
        let mut state = self.state();
        if let Some(block) = log.block() {
            state.finalized_block = state.finalized_block.max(block);
        }
        state.logs.push(log);
    }

    /// Set the finalized head.
    pub fn set_finalized_block(&self, block: u64) {
        self.state().finalized_block = block;
    }

    /// Every accepted write, in order.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state().writes.clone()
    }

    fn unavailable(&self, reason: &str) -> LedgerError {
        LedgerError::ChainUnavailable {
            chain: self.chain_name.clone(),
            reason: reason.to_string(),
        }
    }

    fn answer(&self, data: &[u8]) -> Result<Bytes, LedgerError> {
        let call = ISlaEnforcementCalls::abi_decode(data, true).map_err(|e| LedgerError::Rpc {
            chain: self.chain_name.clone(),
            method: "eth_call".into(),
            message: format!("unknown call: {e}"),
        })?;
        let state = self.state();

        match call {
            ISlaEnforcementCalls::slaCount(_) => {
                if state.fail_count {
                    return Err(self.unavailable("slaCount read failed"));
                }
                let count = U256::from(state.agreements.len());
                Ok(ISlaEnforcement::slaCountCall::abi_encode_returns(&(count,)).into())
            }
            ISlaEnforcementCalls::slas(ISlaEnforcement::slasCall { id }) => {
                let index = usize::try_from(id).map_err(|_| self.reverted_read())?;
                if state.failing_reads.contains(&(index as u64)) {
                    return Err(self.unavailable("slas read failed"));
                }
                let a = state.agreements.get(index).ok_or_else(|| self.reverted_read())?;
                Ok(ISlaEnforcement::slasCall::abi_encode_returns(&(
                    a.provider,
                    a.tenant,
                    a.bond_amount,
                    a.response_time_hrs,
                    a.min_uptime_bps.to_u256(),
                    a.penalty_bps.to_u256(),
                    a.created_at,
                    a.active,
                ))
                .into())
            }
            _ => Err(LedgerError::Rpc {
                chain: self.chain_name.clone(),
                method: "eth_call".into(),
                message: "write function called as view".into(),
            }),
        }
    }

    fn reverted_read(&self) -> LedgerError {
        LedgerError::Rpc {
            chain: self.chain_name.clone(),
            method: "eth_call".into(),
            message: "execution reverted".into(),
        }
    }
}

impl EvmClient for MockLedger {
    fn chain_name(&self) -> &str {
        &self.chain_name
    }

    async fn call_contract(&self, _to: Address, data: Bytes) -> Result<Bytes, LedgerError> {
        self.answer(&data)
    }

    async fn write_report(&self, receiver: Address, report: &Report) -> Result<WriteReceipt, LedgerError> {
        let mut state = self.state();
        let tx_hash = keccak256([report.digest().as_slice(), &state.writes.len().to_be_bytes()[..]].concat());
        if state.revert_writes {
            return Err(LedgerError::Reverted {
                chain: self.chain_name.clone(),
                tx_hash,
            });
        }
        state.writes.push(RecordedWrite {
            receiver,
            report: report.clone(),
        });
        state.finalized_block += 1;
        Ok(WriteReceipt {
            tx_hash,
            block_number: Some(state.finalized_block),
            status: WriteStatus::Confirmed,
        })
    }

    async fn finalized_block(&self) -> Result<u64, LedgerError> {
        Ok(self.state().finalized_block)
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<EvmLog>, LedgerError> {
        Ok(self
            .state()
            .logs
            .iter()
            .filter(|l| filter.matches(l) && filter.in_range(l))
            .cloned()
            .collect())
    }

    async fn transaction_logs(&self, tx_hash: B256) -> Result<Vec<EvmLog>, LedgerError> {
        Ok(self
            .state()
            .logs
            .iter()
            .filter(|l| l.transaction_hash == Some(tx_hash))
            .cloned()
            .collect())
    }
}
