//! # Uptime Samples
//!
//! A consensus-agreed uptime measurement for one provider. Samples are
//! ephemeral: fetched fresh on every evaluation and never persisted.

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bps::Bps;
use crate::error::ValidationError;

/// Uptime measurement for a provider at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeSample {
    /// The measured provider.
    pub provider: Address,
    /// Uptime as a percentage in `[0, 100]`, 0.01 % precision.
    pub uptime_percent: f64,
    /// When the measurement was taken.
    pub observed_at: DateTime<Utc>,
}

impl UptimeSample {
    /// The measurement in basis points.
    pub fn uptime_bps(&self) -> Result<Bps, ValidationError> {
        Bps::from_percent(self.uptime_percent)
    }
}
