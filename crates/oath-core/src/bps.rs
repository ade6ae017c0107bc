//! # Basis Points
//!
//! All on-ledger percentages are integers in units of 1/100 of a percent.
//! Telemetry reports uptime as a decimal percentage with an implied precision
//! of 0.01 %, so the conversion is the single place where rounding happens.
//!
//! ## Rounding Rule
//!
//! [`Bps::from_percent`] rounds half-up on the exact decimal digits of the
//! shortest round-trip rendering of the `f64`. Multiplying by 100 in binary
//! floating point is avoided: `99.995 * 100.0` evaluates to
//! `9999.499999999998`, which would round the wrong way at the boundary.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound for any basis-point quantity (100 %).
pub const MAX_BPS: u16 = 10_000;

/// A percentage expressed in basis points, guaranteed to be in `[0, 10000]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Bps(u16);

impl Bps {
    /// Zero basis points.
    pub const ZERO: Bps = Bps(0);

    /// One hundred percent.
    pub const FULL: Bps = Bps(MAX_BPS);

    /// Construct from a raw integer, rejecting values above 10000.
    pub fn new(value: u16) -> Result<Self, ValidationError> {
        if value > MAX_BPS {
            return Err(ValidationError::BpsOutOfRange {
                field: "bps",
                value: value.to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Construct from a `uint256` ledger field.
    pub fn from_u256(value: U256, field: &'static str) -> Result<Self, ValidationError> {
        u16::try_from(value)
            .ok()
            .filter(|v| *v <= MAX_BPS)
            .map(Self)
            .ok_or_else(|| ValidationError::BpsOutOfRange {
                field,
                value: value.to_string(),
            })
    }

    /// Convert a reported uptime percentage (`0.0..=100.0`) to basis points.
    pub fn from_percent(percent: f64) -> Result<Self, ValidationError> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(ValidationError::PercentOutOfRange(percent));
        }

        // `abs` folds -0.0 into 0.0 so the rendering never carries a sign.
        // f64 `Display` never uses exponent notation.
        let rendered = percent.abs().to_string();
        let (whole, fraction) = rendered.split_once('.').unwrap_or((&rendered, ""));

        let whole: u32 = whole
            .parse()
            .map_err(|_| ValidationError::PercentOutOfRange(percent))?;

        let mut digits = fraction.bytes().map(|b| u32::from(b - b'0'));
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let round_up = digits.next().is_some_and(|d| d >= 5);

        let bps = whole * 100 + tenths * 10 + hundredths + u32::from(round_up);
        u16::try_from(bps)
            .ok()
            .filter(|v| *v <= MAX_BPS)
            .map(Self)
            .ok_or(ValidationError::PercentOutOfRange(percent))
    }

    /// The raw value.
    pub fn value(self) -> u16 {
        self.0
    }

    /// The value widened to `uint256` for ABI encoding.
    pub fn to_u256(self) -> U256 {
        U256::from(self.0)
    }
}

impl TryFrom<u16> for Bps {
    type Error = ValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Bps> for u16 {
    fn from(bps: Bps) -> Self {
        bps.0
    }
}

impl std::fmt::Display for Bps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bps", self.0)
    }
}
