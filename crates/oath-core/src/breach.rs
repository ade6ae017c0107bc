//! # Breach Evaluation
//!
//! The only business rule in the system: an agreement is breached when the
//! observed uptime, in basis points, is strictly below the agreement's
//! minimum. Equality is compliant.

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agreement::{Agreement, AgreementId};
use crate::bps::Bps;
use crate::error::ValidationError;
use crate::uptime::UptimeSample;

/// A detected breach, consumed immediately by report submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreachDecision {
    /// The breached agreement.
    pub agreement_id: AgreementId,
    /// Observed uptime that fell below the threshold.
    pub observed_uptime_bps: Bps,
    /// Penalty copied from the agreement at decision time.
    pub penalty_bps: Bps,
    /// When the underlying sample was observed.
    pub observed_at: DateTime<Utc>,
}

/// Outcome of evaluating one agreement against one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Observed uptime met the threshold. Nothing is recorded.
    Compliant {
        /// Observed uptime.
        observed: Bps,
        /// The agreement's threshold.
        minimum: Bps,
    },
    /// Observed uptime fell strictly below the threshold.
    Breach(BreachDecision),
}

/// `observed < minimum`.
pub fn is_breach(observed: Bps, minimum: Bps) -> bool {
    observed < minimum
}

/// Evaluate an active agreement against an uptime sample for its provider.
pub fn evaluate(agreement: &Agreement, sample: &UptimeSample) -> Result<Evaluation, ValidationError> {
    if !agreement.active {
        return Err(ValidationError::InactiveAgreement(agreement.id.value()));
    }
    if sample.provider != agreement.provider {
        return Err(mismatch(agreement.provider, sample.provider));
    }

    let observed = sample.uptime_bps()?;
    let minimum = agreement.min_uptime_bps;

    if is_breach(observed, minimum) {
        Ok(Evaluation::Breach(BreachDecision {
            agreement_id: agreement.id,
            observed_uptime_bps: observed,
            penalty_bps: agreement.penalty_bps,
            observed_at: sample.observed_at,
        }))
    } else {
        Ok(Evaluation::Compliant { observed, minimum })
    }
}

fn mismatch(agreement: Address, sample: Address) -> ValidationError {
    ValidationError::ProviderMismatch {
        agreement: agreement.to_string(),
        sample: sample.to_string(),
    }
}
