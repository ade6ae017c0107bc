//! End-to-end scan behaviour against the in-memory ledger.

mod common;

use std::time::Duration;

use alloy_primitives::U256;
use chrono::Duration as ChronoDuration;
use common::*;
use oath_ledger::abi::ISlaEnforcement::ISlaEnforcementCalls;
use oath_workflow::signer::verify_report;
use oath_workflow::{
    HandlerKind, HandlerOutput, InMemoryDedupStore, NoDedup, QuorumSigner, StaticSecretStore,
    TriggerEvent, WorkflowError,
};

fn breach_args<D, L>(h: &Harness<D, L>) -> Vec<(U256, U256, U256)>
where
    D: oath_workflow::DedupStore + 'static,
    L: oath_ledger::EvmClient + 'static,
{
    h.home
        .writes()
        .iter()
        .filter_map(|w| match w.decoded() {
            Some(ISlaEnforcementCalls::recordBreach(c)) => Some((c.slaId, c.uptimeBps, c.penaltyBps)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn breach_is_recorded_and_inactive_is_skipped() {
    let h = harness(InMemoryDedupStore::new());
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.home.push_agreement(agreement(1, 9950, 1000, false));
    h.uptime.set_fixed(provider(0), 99.2, t0());
    h.uptime.set_fixed(provider(1), 10.0, t0());

    let summary = h.workflow.on_cron().await.unwrap();

    assert_eq!(summary.agreement_count, 2);
    assert_eq!(summary.breaches, 1);
    assert_eq!(summary.inactive, 1);
    assert_eq!(
        breach_args(&h),
        vec![(U256::from(0u64), U256::from(9920u64), U256::from(1000u64))]
    );
    assert_eq!(h.uptime.calls(provider(0)), EXECUTORS);
    assert_eq!(h.uptime.calls(provider(1)), 0, "inactive agreement must not be evaluated");
    assert_eq!(summary.tx_hashes.len(), 1);
}

#[tokio::test]
async fn written_report_carries_a_quorum_of_signatures() {
    let h = harness(NoDedup);
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.uptime.set_fixed(provider(0), 90.0, t0());

    h.workflow.on_cron().await.unwrap();
    let writes = h.home.writes();
    assert_eq!(writes.len(), 1);

    let report = &writes[0].report;
    assert_eq!(writes[0].receiver, h.workflow.config().sla_contract);
    assert_eq!(report.context.workflow_id, h.workflow.workflow_id());
    assert_eq!(report.context.chain_selector, h.workflow.config().home_chain.selector);

    let trusted = QuorumSigner::from_seeds(&seeds(), 2).unwrap().signers();
    assert_eq!(verify_report(report, &trusted, 2).unwrap(), EXECUTORS);
}

#[tokio::test]
async fn threshold_equality_is_compliant() {
    let h = harness(NoDedup);
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.home.push_agreement(agreement(1, 9950, 1000, true));
    h.uptime.set_fixed(provider(0), 99.5, t0());
    h.uptime.set_fixed(provider(1), 99.495, t0());

    let summary = h.workflow.on_cron().await.unwrap();
    assert_eq!(summary.compliant, 2);
    assert_eq!(summary.breaches, 0);
    assert!(h.home.writes().is_empty());
}

#[tokio::test]
async fn disagreement_skips_agreement_and_scan_continues() {
    let h = harness(NoDedup);
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.home.push_agreement(agreement(1, 9950, 500, true));
    h.uptime.set(provider(0), Script::PerNode(vec![99.2, 99.2, 98.0, 99.2]));
    h.uptime.set_fixed(provider(1), 97.0, t0());

    let summary = h.workflow.on_cron().await.unwrap();

    assert_eq!(summary.consensus_failures, 1);
    assert_eq!(summary.breaches, 1);
    assert_eq!(
        breach_args(&h),
        vec![(U256::from(1u64), U256::from(9700u64), U256::from(500u64))]
    );
}

#[tokio::test]
async fn telemetry_error_is_consensus_failure() {
    let h = harness(NoDedup);
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.uptime.set(provider(0), Script::Fail(500));

    let summary = h.workflow.on_cron().await.unwrap();
    assert_eq!(summary.consensus_failures, 1);
    assert!(h.home.writes().is_empty());
}

#[tokio::test]
async fn out_of_range_sample_is_skipped() {
    let h = harness(NoDedup);
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.uptime.set_fixed(provider(0), 150.0, t0());

    let summary = h.workflow.on_cron().await.unwrap();
    assert_eq!(summary.telemetry_failures, 1);
    assert!(h.home.writes().is_empty());
}

#[tokio::test]
async fn report_about_another_provider_is_skipped() {
    let h = harness(NoDedup);
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.home.push_agreement(agreement(1, 9950, 1000, true));
    let mut wrong = report(90.0, t0());
    wrong.provider = Some(provider(7).to_checksum(None));
    h.uptime.set(provider(0), Script::Fixed(wrong));
    let mut echoed = report(90.0, t0());
    echoed.provider = Some(provider(1).to_string().to_lowercase());
    h.uptime.set(provider(1), Script::Fixed(echoed));

    let summary = h.workflow.on_cron().await.unwrap();
    assert_eq!(summary.telemetry_failures, 1);
    assert_eq!(summary.breaches, 1);
    let args = breach_args(&h);
    assert_eq!(args.len(), 1);
    assert_eq!(args[0].0, U256::from(1u64));
}

#[tokio::test]
async fn count_failure_aborts_scan() {
    let h = harness(NoDedup);
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.uptime.set_fixed(provider(0), 50.0, t0());
    h.home.fail_count();

    let err = h.workflow.on_cron().await.unwrap_err();
    assert!(matches!(err, WorkflowError::CountRead(_)));
    assert_eq!(h.uptime.total_calls(), 0);
    assert!(h.home.writes().is_empty());
}

#[tokio::test]
async fn per_agreement_read_failure_skips_only_that_id() {
    let h = harness(NoDedup);
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.home.push_agreement(agreement(1, 9950, 1000, true));
    h.home.fail_read(0);
    h.uptime.set_fixed(provider(0), 50.0, t0());
    h.uptime.set_fixed(provider(1), 50.0, t0());

    let summary = h.workflow.on_cron().await.unwrap();
    assert_eq!(summary.read_failures, 1);
    assert_eq!(summary.breaches, 1);
    assert_eq!(breach_args(&h)[0].0, U256::from(1u64));
}

#[tokio::test]
async fn missing_secret_fails_invocation() {
    let h = harness_with_secrets(NoDedup, StaticSecretStore::new());
    h.home.push_agreement(agreement(0, 9950, 1000, true));

    let err = h.workflow.on_cron().await.unwrap_err();
    assert!(matches!(err, WorkflowError::Secret(_)));
    assert!(h.home.writes().is_empty());
}

#[tokio::test]
async fn stale_sample_is_written_twice_without_dedup() {
    let h = harness(NoDedup);
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.uptime.set_fixed(provider(0), 99.2, t0());

    h.workflow.on_cron().await.unwrap();
    h.workflow.on_cron().await.unwrap();

    assert_eq!(breach_args(&h).len(), 2, "no guard: both cycles write");
}

#[tokio::test]
async fn stale_sample_is_written_once_with_in_memory_dedup() {
    let h = harness(InMemoryDedupStore::new());
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.uptime.set_fixed(provider(0), 99.2, t0());

    let first = h.workflow.on_cron().await.unwrap();
    let second = h.workflow.on_cron().await.unwrap();

    assert_eq!(first.breaches, 1);
    assert_eq!(second.breaches, 0);
    assert_eq!(second.duplicates, 1);
    assert_eq!(breach_args(&h).len(), 1);
}

#[tokio::test]
async fn concurrent_scans_write_a_stale_breach_once() {
    let h = slow_harness(InMemoryDedupStore::new(), Duration::from_millis(50));
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.uptime.set_fixed(provider(0), 99.2, t0());

    let (a, b) = tokio::join!(h.workflow.on_cron(), h.workflow.on_cron());
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.breaches + b.breaches, 1);
    assert_eq!(a.duplicates + b.duplicates, 1, "the overlapping scan sees the reservation");
    assert_eq!(breach_args(&h).len(), 1);
}

#[tokio::test]
async fn written_keys_expire_after_retention() {
    let h = harness(InMemoryDedupStore::with_retention_secs(0));
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.uptime.set_fixed(provider(0), 99.2, t0());

    h.workflow.on_cron().await.unwrap();
    assert_eq!(h.workflow.dedup().len(), 1);
    let second = h.workflow.on_cron().await.unwrap();

    assert_eq!(second.breaches, 1, "expired key no longer suppresses the write");
    assert_eq!(breach_args(&h).len(), 2);
}

#[tokio::test]
async fn fresh_samples_in_later_windows_are_written_each_time() {
    let h = harness(InMemoryDedupStore::new());
    h.home.push_agreement(agreement(0, 9950, 1000, true));

    h.uptime.set_fixed(provider(0), 99.2, t0());
    h.workflow.on_cron().await.unwrap();
    h.uptime.set_fixed(provider(0), 99.1, t0() + ChronoDuration::seconds(900));
    h.workflow.on_cron().await.unwrap();

    let args = breach_args(&h);
    assert_eq!(args.len(), 2);
    assert_eq!(args[1].1, U256::from(9910u64));
}

#[tokio::test]
async fn failed_write_aborts_and_is_retried_next_cycle() {
    let h = harness(InMemoryDedupStore::new());
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.home.push_agreement(agreement(1, 9950, 1000, true));
    h.uptime.set_fixed(provider(0), 90.0, t0());
    h.uptime.set_fixed(provider(1), 90.0, t0());

    h.home.revert_writes(true);
    let err = h.workflow.on_cron().await.unwrap_err();
    assert!(matches!(err, WorkflowError::Submission(_)));
    assert_eq!(h.uptime.calls(provider(1)), 0, "scan stops at the failed write");
    assert!(h.workflow.dedup().is_empty(), "failed write leaves no key");

    h.home.revert_writes(false);
    let summary = h.workflow.on_cron().await.unwrap();
    assert_eq!(summary.breaches, 2);
}

#[tokio::test]
async fn claim_filed_log_triggers_a_scan() {
    use alloy_primitives::{Address, Bytes, B256};
    use alloy_sol_types::{SolEvent, SolValue};
    use oath_ledger::abi::ISlaEnforcement;
    use oath_ledger::EvmLog;

    let h = harness(NoDedup);
    h.home.push_agreement(agreement(0, 9950, 1000, true));
    h.uptime.set_fixed(provider(0), 99.2, t0());

    let log = EvmLog {
        address: h.workflow.config().sla_contract,
        topics: vec![
            ISlaEnforcement::ClaimFiled::SIGNATURE_HASH,
            B256::from(U256::from(1u64)),
            B256::from(U256::from(0u64)),
        ],
        data: Bytes::from(Address::repeat_byte(0xee).abi_encode()),
        block_number: None,
        transaction_hash: None,
        log_index: None,
    };

    let output = h
        .workflow
        .handle(HandlerKind::ScanAgreements, &TriggerEvent::Log(log))
        .await
        .unwrap();
    match output {
        HandlerOutput::Scan(summary) => assert_eq!(summary.breaches, 1),
        other => panic!("unexpected output {other:?}"),
    }
}

#[tokio::test]
async fn relay_handler_rejects_cron_event() {
    let h = harness(NoDedup);
    let err = h
        .workflow
        .handle(
            HandlerKind::RelayProvider,
            &TriggerEvent::Cron { fired_at: t0() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::UnexpectedEvent { event: "cron", .. }));
}
