//! # Error Types
//!
//! Validation failures raised while constructing domain values from ledger
//! or telemetry data. A validation failure is always scoped to a single
//! agreement or event; callers decide whether it aborts anything larger.

use thiserror::Error;

/// A value read from an external source does not fit its domain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A basis-point field exceeded 10000.
    #[error("{field} out of range: {value} bps exceeds 10000")]
    BpsOutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The raw value, rendered as decimal.
        value: String,
    },

    /// A reported uptime percentage was not a finite value in `[0, 100]`.
    #[error("uptime percentage out of range: {0}")]
    PercentOutOfRange(f64),

    /// An agreement id did not fit a 64-bit integer.
    #[error("agreement id out of range: {0}")]
    AgreementIdOutOfRange(String),

    /// Evaluation was requested for an agreement the ledger marks inactive.
    #[error("agreement {0} is inactive")]
    InactiveAgreement(u64),

    /// The telemetry sample belongs to a different provider than the agreement.
    #[error("sample provider {sample} does not match agreement provider {agreement}")]
    ProviderMismatch {
        /// Provider named by the agreement.
        agreement: String,
        /// Provider named by the sample.
        sample: String,
    },
}
