//! Shared fixtures: an in-memory host over `MockLedger` with scripted
//! telemetry.

#![allow(dead_code)]

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use chrono::{DateTime, TimeZone, Utc};
use oath_core::{Agreement, AgreementId, Bps};
use oath_ledger::mock::MockLedger;
use oath_ledger::{EvmClient, EvmLog, LedgerError, LogFilter, Report, WriteReceipt};
use oath_telemetry::{TelemetryError, UptimeReport};
use oath_workflow::{
    Capabilities, DedupStore, Host, LocalConsensus, NodeContext, QuorumSigner, StaticSecretStore,
    UptimeSource, Workflow, WorkflowConfig, UPTIME_API_KEY,
};

pub const SLA_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const REGISTRY_CONTRACT: &str = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";
pub const EXECUTORS: usize = 4;

/// What the telemetry returns for one provider.
#[derive(Debug, Clone)]
pub enum Script {
    /// Every executor sees the same report.
    Fixed(UptimeReport),
    /// Executor `i` sees `percents[i]`.
    PerNode(Vec<f64>),
    /// Every executor gets an HTTP error.
    Fail(u16),
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedUptime {
    scripts: Arc<Mutex<HashMap<Address, Script>>>,
    calls: Arc<Mutex<HashMap<Address, usize>>>,
    total: Arc<AtomicUsize>,
}

impl ScriptedUptime {
    pub fn set(&self, provider: Address, script: Script) {
        self.scripts.lock().unwrap().insert(provider, script);
    }

    pub fn set_fixed(&self, provider: Address, percent: f64, observed_at: DateTime<Utc>) {
        self.set(provider, Script::Fixed(report(percent, observed_at)));
    }

    /// Per-executor fetches seen for `provider`.
    pub fn calls(&self, provider: Address) -> usize {
        self.calls.lock().unwrap().get(&provider).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl UptimeSource for ScriptedUptime {
    async fn fetch_uptime(
        &self,
        node: NodeContext,
        provider: Address,
        api_key: &str,
    ) -> Result<UptimeReport, TelemetryError> {
        assert_eq!(api_key, "test-api-key");
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(provider).or_insert(0) += 1;

        let script = self.scripts.lock().unwrap().get(&provider).cloned();
        let status = match script {
            Some(Script::Fixed(r)) => return Ok(r),
            Some(Script::PerNode(percents)) => return Ok(report(percents[node.node], t0())),
            Some(Script::Fail(status)) => status,
            None => 404,
        };
        Err(TelemetryError::ApiError {
            endpoint: "GET /provider/{address}/uptime".into(),
            status,
            body: String::new(),
        })
    }
}

pub fn report(percent: f64, observed_at: DateTime<Utc>) -> UptimeReport {
    UptimeReport {
        provider: None,
        uptime_percent: percent,
        timestamp: Some(observed_at),
        status: None,
    }
}

/// A fixed observation time in the middle of a 900 s window.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 5, 0).unwrap()
}

/// Wraps a [`MockLedger`] and holds every write for `delay` before it
/// lands, so concurrent scans overlap inside the submit step.
#[derive(Debug, Clone)]
pub struct SlowLedger {
    pub inner: MockLedger,
    pub delay: Duration,
}

impl EvmClient for SlowLedger {
    fn chain_name(&self) -> &str {
        self.inner.chain_name()
    }

    async fn call_contract(&self, to: Address, data: Bytes) -> Result<Bytes, LedgerError> {
        self.inner.call_contract(to, data).await
    }

    async fn write_report(&self, receiver: Address, report: &Report) -> Result<WriteReceipt, LedgerError> {
        tokio::time::sleep(self.delay).await;
        self.inner.write_report(receiver, report).await
    }

    async fn finalized_block(&self) -> Result<u64, LedgerError> {
        self.inner.finalized_block().await
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<EvmLog>, LedgerError> {
        self.inner.get_logs(filter).await
    }

    async fn transaction_logs(&self, tx_hash: B256) -> Result<Vec<EvmLog>, LedgerError> {
        self.inner.transaction_logs(tx_hash).await
    }
}

pub struct TestHost<D, L = MockLedger>(PhantomData<(D, L)>);

impl<D: DedupStore + 'static, L: EvmClient + 'static> Host for TestHost<D, L> {
    type HomeChain = L;
    type OriginChain = MockLedger;
    type Uptime = ScriptedUptime;
    type Consensus = LocalConsensus;
    type Signer = QuorumSigner;
    type Secrets = StaticSecretStore;
    type Dedup = D;
}

/// `home` is always the underlying mock, whatever client the workflow
/// writes through.
pub struct Harness<D: DedupStore + 'static, L: EvmClient + 'static = MockLedger> {
    pub workflow: Workflow<TestHost<D, L>>,
    pub home: MockLedger,
    pub origin: MockLedger,
    pub uptime: ScriptedUptime,
}

pub fn config() -> WorkflowConfig {
    WorkflowConfig {
        sla_contract_address: SLA_CONTRACT.into(),
        uptime_api_url: "http://localhost:3001".into(),
        chain_selector_name: "ethereum-testnet-sepolia".into(),
        registry_contract_address: REGISTRY_CONTRACT.into(),
        origin_chain_selector_name: "ethereum-testnet-sepolia-worldchain-1".into(),
        is_testnet: true,
        dedup_window_secs: 900,
    }
}

pub fn seeds() -> Vec<[u8; 32]> {
    (1..=EXECUTORS as u8).map(|i| [i; 32]).collect()
}

pub fn harness<D: DedupStore + 'static>(dedup: D) -> Harness<D> {
    harness_with_secrets(dedup, StaticSecretStore::new().with(UPTIME_API_KEY, "test-api-key"))
}

pub fn harness_with_secrets<D: DedupStore + 'static>(
    dedup: D,
    secrets: StaticSecretStore,
) -> Harness<D> {
    let home = MockLedger::new("ethereum-testnet-sepolia");
    build(dedup, secrets, home.clone(), home)
}

/// A harness whose home-chain writes each take `delay`.
pub fn slow_harness<D: DedupStore + 'static>(dedup: D, delay: Duration) -> Harness<D, SlowLedger> {
    let home = MockLedger::new("ethereum-testnet-sepolia");
    let client = SlowLedger {
        inner: home.clone(),
        delay,
    };
    build(
        dedup,
        StaticSecretStore::new().with(UPTIME_API_KEY, "test-api-key"),
        client,
        home,
    )
}

fn build<D: DedupStore + 'static, L: EvmClient + 'static>(
    dedup: D,
    secrets: StaticSecretStore,
    home_chain: L,
    home: MockLedger,
) -> Harness<D, L> {
    let origin = MockLedger::new("ethereum-testnet-sepolia-worldchain-1");
    let uptime = ScriptedUptime::default();

    let validated = config().validate().expect("valid config");
    let workflow = Workflow::new(
        validated,
        Capabilities {
            home_chain,
            origin_chain: origin.clone(),
            uptime: uptime.clone(),
            consensus: LocalConsensus::new(EXECUTORS, Duration::from_secs(5)).unwrap(),
            signer: QuorumSigner::from_seeds(&seeds(), 2).unwrap(),
            secrets,
            dedup,
        },
    );

    Harness {
        workflow,
        home,
        origin,
        uptime,
    }
}

pub fn provider(i: u8) -> Address {
    Address::repeat_byte(0x70 + i)
}

pub fn agreement(id: u64, min_uptime_bps: u16, penalty_bps: u16, active: bool) -> Agreement {
    Agreement {
        id: AgreementId::new(id),
        provider: provider(id as u8),
        tenant: Address::repeat_byte(0xee),
        bond_amount: U256::from(10_000_000_000_000_000_000u128),
        response_time_hrs: U256::from(4u64),
        min_uptime_bps: Bps::new(min_uptime_bps).unwrap(),
        penalty_bps: Bps::new(penalty_bps).unwrap(),
        created_at: U256::from(1_700_000_000u64),
        active,
    }
}
