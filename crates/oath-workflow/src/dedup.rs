//! # Breach Idempotency
//!
//! The ledger may not guard against a second `recordBreach` for the same
//! outage, so the submitter claims an [`IdempotencyKey`] before writing a
//! breach. The key is `(agreementId, floor(observedAt / window))`: two
//! cycles that see the same stale sample map to the same key, while fresh
//! samples in later windows do not.
//!
//! A key moves through two states. [`DedupStore::reserve`] claims it
//! atomically, so of two concurrent firings only one proceeds to write.
//! [`DedupStore::commit`] marks it written; [`DedupStore::release`] gives
//! it back after a failed write so the next trigger retries.
//!
//! Written keys are kept for a retention period counted from the write,
//! then forgotten by [`DedupStore::prune`].

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use oath_core::{AgreementId, BreachDecision};
use serde::Serialize;

/// Default time a written key is remembered.
pub const DEFAULT_RETENTION_SECS: u64 = 24 * 60 * 60;

/// Identifies one breach report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdempotencyKey {
    pub agreement_id: AgreementId,
    /// `floor(observedAt_unix / window_secs)`.
    pub window: i64,
}

impl IdempotencyKey {
    pub fn new(agreement_id: AgreementId, observed_at: DateTime<Utc>, window_secs: u64) -> Self {
        let window_secs = i64::try_from(window_secs.max(1)).unwrap_or(i64::MAX);
        Self {
            agreement_id,
            window: observed_at.timestamp().div_euclid(window_secs),
        }
    }

    pub fn for_decision(decision: &BreachDecision, window_secs: u64) -> Self {
        Self::new(decision.agreement_id, decision.observed_at, window_secs)
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.agreement_id, self.window)
    }
}

/// Record of breach reports claimed or written.
pub trait DedupStore: Send + Sync {
    /// Claim `key`. `false` if it is already reserved or written.
    fn reserve(&self, key: IdempotencyKey) -> bool;

    /// Mark a reserved key as written.
    fn commit(&self, key: IdempotencyKey);

    /// Drop a reservation whose write failed. Written keys are kept.
    fn release(&self, key: IdempotencyKey);

    /// Forget written keys past retention. Called once per scan.
    fn prune(&self, _now: DateTime<Utc>) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Reserved,
    Written(DateTime<Utc>),
}

/// Process-local store.
#[derive(Debug)]
pub struct InMemoryDedupStore {
    slots: DashMap<IdempotencyKey, Slot>,
    retention: chrono::Duration,
}

impl Default for InMemoryDedupStore {
    fn default() -> Self {
        Self::with_retention_secs(DEFAULT_RETENTION_SECS)
    }
}

impl InMemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember written keys for `secs` after the write.
    pub fn with_retention_secs(secs: u64) -> Self {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        Self {
            slots: DashMap::new(),
            retention: chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `key` is reserved or written.
    pub fn contains(&self, key: &IdempotencyKey) -> bool {
        self.slots.contains_key(key)
    }
}

impl DedupStore for InMemoryDedupStore {
    fn reserve(&self, key: IdempotencyKey) -> bool {
        match self.slots.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Slot::Reserved);
                true
            }
        }
    }

    fn commit(&self, key: IdempotencyKey) {
        self.slots.insert(key, Slot::Written(Utc::now()));
    }

    fn release(&self, key: IdempotencyKey) {
        self.slots.remove_if(&key, |_, slot| *slot == Slot::Reserved);
    }

    fn prune(&self, now: DateTime<Utc>) {
        let cutoff = now.checked_sub_signed(self.retention).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let before = self.slots.len();
        self.slots.retain(|_, slot| match slot {
            Slot::Reserved => true,
            Slot::Written(at) => *at > cutoff,
        });
        let pruned = before.saturating_sub(self.slots.len());
        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.slots.len(), "expired idempotency keys dropped");
        }
    }
}

/// Never deduplicates. Every breach decision is written.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDedup;

impl DedupStore for NoDedup {
    fn reserve(&self, _key: IdempotencyKey) -> bool {
        true
    }

    fn commit(&self, _key: IdempotencyKey) {}

    fn release(&self, _key: IdempotencyKey) {}
}
