//! # oath-telemetry: Uptime API Client
//!
//! Fetches provider uptime from the off-chain telemetry service. The client
//! knows nothing about agreements or thresholds; it returns the response as
//! sent and converts it into a validated [`oath_core::UptimeSample`] on
//! request.
//!
//! Bearer tokens are supplied per call by the caller's secret store.

pub mod client;
pub mod error;
pub mod retry;

pub use client::{TelemetryConfig, UptimeClient, UptimeReport};
pub use error::TelemetryError;
pub use retry::RetryPolicy;
