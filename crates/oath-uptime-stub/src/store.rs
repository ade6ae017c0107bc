//! In-memory uptime state.
//!
//! One global value answers every provider without an override. Overrides
//! are keyed by lowercase address. Each value remembers when it was set,
//! and that instant is what the API reports as the measurement time, so
//! repeated reads of an unchanged value are byte-identical.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Uptime reported until someone says otherwise.
pub const DEFAULT_UPTIME: f64 = 99.9;

/// Threshold for the informational `status` field.
pub const COMPLIANT_AT: f64 = 99.5;

/// A configured uptime value and when it was configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UptimeValue {
    pub percent: f64,
    pub set_at: DateTime<Utc>,
}

impl UptimeValue {
    fn now(percent: f64) -> Self {
        Self {
            percent,
            set_at: Utc::now(),
        }
    }

    pub fn status(&self) -> &'static str {
        if self.percent >= COMPLIANT_AT {
            "compliant"
        } else {
            "breached"
        }
    }
}

struct Inner {
    global: RwLock<UptimeValue>,
    overrides: DashMap<String, UptimeValue>,
    api_key: Option<String>,
}

/// Shared server state. Clones share the same data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                global: RwLock::new(UptimeValue::now(DEFAULT_UPTIME)),
                overrides: DashMap::new(),
                api_key,
            }),
        }
    }

    /// Bearer token required on uptime reads, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.inner.api_key.as_deref()
    }

    pub fn global(&self) -> UptimeValue {
        *self
            .inner
            .global
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_global(&self, percent: f64) -> UptimeValue {
        let value = UptimeValue::now(percent);
        *self
            .inner
            .global
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
        value
    }

    pub fn set_provider(&self, address: &str, percent: f64) -> UptimeValue {
        let value = UptimeValue::now(percent);
        self.inner.overrides.insert(address.to_lowercase(), value);
        value
    }

    /// The value served for `address`: its override, else the global value.
    pub fn for_provider(&self, address: &str) -> UptimeValue {
        self.inner
            .overrides
            .get(&address.to_lowercase())
            .map(|v| *v.value())
            .unwrap_or_else(|| self.global())
    }

    pub fn overrides(&self) -> Vec<(String, f64)> {
        let mut all: Vec<_> = self
            .inner
            .overrides
            .iter()
            .map(|e| (e.key().clone(), e.value().percent))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Restore the default and drop every override.
    pub fn reset(&self) {
        self.set_global(DEFAULT_UPTIME);
        self.inner.overrides.clear();
    }
}
