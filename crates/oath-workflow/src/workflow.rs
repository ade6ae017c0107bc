//! # Handlers
//!
//! [`Workflow`] owns the capabilities supplied by the host and implements
//! the three handlers the trigger bindings invoke. Each call builds a fresh
//! [`Execution`]; the only state that outlives an invocation is the
//! idempotency store.
//!
//! ## Scan
//!
//! 1. Fetch the telemetry secret (once per execution).
//! 2. Read the agreement count. Failure aborts the scan.
//! 3. For each id in ascending order: read the record (skip on failure),
//!    skip inactive agreements, fetch uptime under consensus (skip on no
//!    consensus), evaluate, and submit a breach report.
//!
//! Expired idempotency keys are pruned at the start of every scan.
//!
//! A failed write aborts the rest of the scan and fails the invocation.
//!
//! ## Relay
//!
//! Decode the registration log and submit the relayed registration. There
//! is no retry: a failed relay is only retried if the event is re-emitted.

use alloy_primitives::{keccak256, Address, B256};
use alloy_sol_types::SolEvent;
use chrono::Utc;
use oath_core::{evaluate, Agreement, Evaluation, RelayRequest, Role};
use oath_ledger::abi::ISlaEnforcement;
use oath_ledger::{EvmClient, EvmLog, LedgerError, LogFilter, SlaLedger, WriteReceipt};
use serde::Serialize;

use crate::config::ValidatedConfig;
use crate::consensus::{ConsensusExecutor, ConsensusResult};
use crate::dedup::DedupStore;
use crate::error::WorkflowError;
use crate::execution::Execution;
use crate::relay::{decode_registration, registration_logs};
use crate::scanner::{AgreementScanner, ScanItem};
use crate::secrets::{SecretStore, UPTIME_API_KEY};
use crate::signer::ReportSigner;
use crate::submitter::{ReportSubmitter, Submission};
use crate::triggers::{self, Binding, HandlerKind, TriggerEvent};
use crate::uptime::UptimeSource;

/// The set of capability types a host provides.
pub trait Host: Send + Sync + 'static {
    type HomeChain: EvmClient + 'static;
    type OriginChain: EvmClient + 'static;
    type Uptime: UptimeSource + 'static;
    type Consensus: ConsensusExecutor + 'static;
    type Signer: ReportSigner + 'static;
    type Secrets: SecretStore + 'static;
    type Dedup: DedupStore + 'static;
}

/// Capability instances for one [`Host`].
pub struct Capabilities<H: Host> {
    pub home_chain: H::HomeChain,
    pub origin_chain: H::OriginChain,
    pub uptime: H::Uptime,
    pub consensus: H::Consensus,
    pub signer: H::Signer,
    pub secrets: H::Secrets,
    pub dedup: H::Dedup,
}

/// Counters for one scan invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub execution_id: B256,
    /// Agreements on the ledger when the scan started.
    pub agreement_count: u64,
    pub inactive: u64,
    pub compliant: u64,
    /// Breach reports written.
    pub breaches: u64,
    /// Breaches skipped because their window was already reported.
    pub duplicates: u64,
    pub read_failures: u64,
    /// Samples that failed to decode or validate.
    pub telemetry_failures: u64,
    pub consensus_failures: u64,
    /// Transaction hashes of the written reports, in id order.
    pub tx_hashes: Vec<B256>,
}

/// A relayed registration and its write receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayOutcome {
    pub request: RelayRequest,
    pub receipt: WriteReceipt,
}

/// Result of one handler invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "handler", content = "result")]
pub enum HandlerOutput {
    Scan(ScanSummary),
    Relay(RelayOutcome),
}

/// The compliance-enforcement workflow bound to one configuration.
pub struct Workflow<H: Host> {
    config: ValidatedConfig,
    workflow_id: B256,
    ledger: SlaLedger<H::HomeChain>,
    origin_chain: H::OriginChain,
    uptime: H::Uptime,
    consensus: H::Consensus,
    signer: H::Signer,
    secrets: H::Secrets,
    dedup: H::Dedup,
}

/// Stable identifier for a configuration: the hash of its contracts and
/// chain selectors.
pub fn workflow_id(config: &ValidatedConfig) -> B256 {
    let mut preimage = b"oathlayer/enforcement/v1".to_vec();
    preimage.extend_from_slice(config.sla_contract.as_slice());
    preimage.extend_from_slice(&config.home_chain.selector.to_be_bytes());
    preimage.extend_from_slice(config.registry_contract.as_slice());
    preimage.extend_from_slice(&config.origin_chain.selector.to_be_bytes());
    keccak256(preimage)
}

impl<H: Host> Workflow<H> {
    pub fn new(config: ValidatedConfig, caps: Capabilities<H>) -> Self {
        let workflow_id = workflow_id(&config);
        Self {
            ledger: SlaLedger::new(caps.home_chain, config.sla_contract),
            config,
            workflow_id,
            origin_chain: caps.origin_chain,
            uptime: caps.uptime,
            consensus: caps.consensus,
            signer: caps.signer,
            secrets: caps.secrets,
            dedup: caps.dedup,
        }
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn workflow_id(&self) -> B256 {
        self.workflow_id
    }

    pub fn bindings(&self) -> Vec<Binding> {
        triggers::bindings(&self.config)
    }

    pub fn home_ledger(&self) -> &SlaLedger<H::HomeChain> {
        &self.ledger
    }

    pub fn origin_chain(&self) -> &H::OriginChain {
        &self.origin_chain
    }

    pub fn dedup(&self) -> &H::Dedup {
        &self.dedup
    }

    /// Finalized head of the chain `handler`'s log trigger watches.
    pub async fn finalized_block(&self, handler: HandlerKind) -> Result<u64, LedgerError> {
        match handler {
            HandlerKind::ScanAgreements => self.ledger.client().finalized_block().await,
            HandlerKind::RelayProvider | HandlerKind::RelayArbitrator => {
                self.origin_chain.finalized_block().await
            }
        }
    }

    /// Logs for `handler`'s log trigger, from the chain it watches.
    pub async fn fetch_logs(
        &self,
        handler: HandlerKind,
        filter: &LogFilter,
    ) -> Result<Vec<EvmLog>, LedgerError> {
        match handler {
            HandlerKind::ScanAgreements => self.ledger.client().get_logs(filter).await,
            HandlerKind::RelayProvider | HandlerKind::RelayArbitrator => {
                self.origin_chain.get_logs(filter).await
            }
        }
    }

    /// Invoke `handler` for one trigger firing.
    pub async fn handle(
        &self,
        handler: HandlerKind,
        event: &TriggerEvent,
    ) -> Result<HandlerOutput, WorkflowError> {
        match (handler, event) {
            (HandlerKind::ScanAgreements, TriggerEvent::Cron { .. }) => {
                self.on_cron().await.map(HandlerOutput::Scan)
            }
            (HandlerKind::ScanAgreements, TriggerEvent::Log(log)) => {
                self.on_claim_filed(log).await.map(HandlerOutput::Scan)
            }
            (HandlerKind::RelayProvider, TriggerEvent::Log(log)) => self
                .on_registration(Role::Provider, log)
                .await
                .map(HandlerOutput::Relay),
            (HandlerKind::RelayArbitrator, TriggerEvent::Log(log)) => self
                .on_registration(Role::Arbitrator, log)
                .await
                .map(HandlerOutput::Relay),
            (_, event) => Err(WorkflowError::UnexpectedEvent {
                handler,
                event: event.kind(),
            }),
        }
    }

    /// Proactive scan.
    pub async fn on_cron(&self) -> Result<ScanSummary, WorkflowError> {
        let execution = Execution::new(self.workflow_id);
        tracing::info!(execution_id = %execution.id, "cron fired, scanning all agreements");
        self.scan(&execution).await
    }

    /// Reactive scan. The claim itself is only logged.
    pub async fn on_claim_filed(&self, log: &EvmLog) -> Result<ScanSummary, WorkflowError> {
        let execution = Execution::new(self.workflow_id);
        match ISlaEnforcement::ClaimFiled::decode_raw_log(log.topics.iter().copied(), &log.data, true) {
            Ok(claim) => tracing::info!(
                execution_id = %execution.id,
                claim_id = %claim.claimId,
                sla_id = %claim.slaId,
                tenant = %claim.tenant,
                "claim filed, scanning all agreements"
            ),
            Err(e) => tracing::warn!(
                execution_id = %execution.id,
                error = %e,
                "undecodable ClaimFiled log, scanning anyway"
            ),
        }
        self.scan(&execution).await
    }

    /// Relay one registration log to the home ledger.
    pub async fn on_registration(
        &self,
        role: Role,
        log: &EvmLog,
    ) -> Result<RelayOutcome, WorkflowError> {
        let execution = Execution::new(self.workflow_id);
        self.relay_log(&execution, role, log).await
    }

    /// Relay every `role` registration emitted by the registry in one
    /// origin-chain transaction.
    pub async fn relay_transaction(
        &self,
        role: Role,
        tx_hash: B256,
    ) -> Result<Vec<RelayOutcome>, WorkflowError> {
        let execution = Execution::new(self.workflow_id);
        let logs = self
            .origin_chain
            .transaction_logs(tx_hash)
            .await
            .map_err(WorkflowError::OriginRead)?;

        let mut outcomes = Vec::new();
        for log in registration_logs(role, self.config.registry_contract, &logs) {
            outcomes.push(self.relay_log(&execution, role, log).await?);
        }
        if outcomes.is_empty() {
            tracing::warn!(%tx_hash, %role, "transaction emitted no registration events");
        }
        Ok(outcomes)
    }

    fn submitter(&self) -> ReportSubmitter<'_, H::HomeChain, H::Signer, H::Dedup> {
        ReportSubmitter::new(
            self.ledger.client(),
            &self.signer,
            &self.dedup,
            self.config.sla_contract,
            self.config.home_chain.selector,
            self.config.dedup_window_secs,
        )
    }

    async fn relay_log(
        &self,
        execution: &Execution,
        role: Role,
        log: &EvmLog,
    ) -> Result<RelayOutcome, WorkflowError> {
        let request = decode_registration(role, log)?;
        tracing::info!(
            execution_id = %execution.id,
            %role,
            subject = %request.subject_address,
            nullifier_hash = %request.nullifier_hash,
            source_root = %request.source_root,
            "registration event decoded"
        );
        let receipt = self.submitter().submit_relay(execution, &request).await?;
        Ok(RelayOutcome { request, receipt })
    }

    async fn scan(&self, execution: &Execution) -> Result<ScanSummary, WorkflowError> {
        let api_key = self.secrets.get_secret(UPTIME_API_KEY).await?;
        self.dedup.prune(Utc::now());

        let mut scanner = AgreementScanner::start(&self.ledger)
            .await
            .map_err(WorkflowError::CountRead)?;
        let mut summary = ScanSummary {
            execution_id: execution.id,
            agreement_count: scanner.count(),
            ..ScanSummary::default()
        };
        tracing::info!(
            execution_id = %execution.id,
            count = summary.agreement_count,
            "scanning agreements"
        );

        let submitter = self.submitter();
        while let Some(item) = scanner.next().await {
            let agreement = match item {
                ScanItem::Active(agreement) => agreement,
                ScanItem::Inactive(id) => {
                    tracing::debug!(agreement_id = %id, "inactive, skipped");
                    summary.inactive += 1;
                    continue;
                }
                ScanItem::ReadFailed { id, error } => {
                    tracing::warn!(agreement_id = %id, %error, "agreement read failed, skipped");
                    summary.read_failures += 1;
                    continue;
                }
            };

            let Some(evaluation) = self.evaluate_agreement(&agreement, &api_key, &mut summary).await
            else {
                continue;
            };

            match evaluation {
                Evaluation::Compliant { .. } => summary.compliant += 1,
                Evaluation::Breach(decision) => {
                    match submitter.submit_breach(execution, &decision).await? {
                        Submission::Written { receipt, .. } => {
                            summary.breaches += 1;
                            summary.tx_hashes.push(receipt.tx_hash);
                        }
                        Submission::Duplicate { .. } => summary.duplicates += 1,
                    }
                }
            }
        }

        tracing::info!(
            execution_id = %execution.id,
            breaches = summary.breaches,
            duplicates = summary.duplicates,
            compliant = summary.compliant,
            skipped = summary.read_failures + summary.telemetry_failures + summary.consensus_failures,
            "scan complete"
        );
        Ok(summary)
    }

    /// Fetch uptime under consensus and evaluate. `None` means the
    /// agreement was skipped this cycle; the reason is counted in `summary`.
    async fn evaluate_agreement(
        &self,
        agreement: &Agreement,
        api_key: &str,
        summary: &mut ScanSummary,
    ) -> Option<Evaluation> {
        let provider: Address = agreement.provider;
        let uptime = &self.uptime;

        let report = match self
            .consensus
            .run_identical(move |node| uptime.fetch_uptime(node, provider, api_key))
            .await
        {
            ConsensusResult::Agreed(report) => report,
            ConsensusResult::NoConsensus(reason) => {
                tracing::warn!(agreement_id = %agreement.id, %provider, %reason, "no uptime consensus, skipped");
                summary.consensus_failures += 1;
                return None;
            }
        };

        let evaluation = report
            .to_sample(provider, Utc::now())
            .map_err(|e| e.to_string())
            .and_then(|sample| evaluate(agreement, &sample).map_err(|e| e.to_string()));

        match evaluation {
            Ok(evaluation) => {
                let (observed, breach) = match &evaluation {
                    Evaluation::Compliant { observed, .. } => (*observed, false),
                    Evaluation::Breach(d) => (d.observed_uptime_bps, true),
                };
                tracing::info!(
                    agreement_id = %agreement.id,
                    observed_bps = observed.value(),
                    min_bps = agreement.min_uptime_bps.value(),
                    breach,
                    "uptime evaluated"
                );
                Some(evaluation)
            }
            Err(error) => {
                tracing::warn!(agreement_id = %agreement.id, %error, "unusable uptime sample, skipped");
                summary.telemetry_failures += 1;
                None
            }
        }
    }
}
