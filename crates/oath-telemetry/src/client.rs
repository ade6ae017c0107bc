//! # Uptime API Client
//!
//! One call: `GET {baseUrl}/provider/{address}/uptime` with a bearer token.
//! The address is rendered in EIP-55 checksum form. The token is passed per
//! call and never stored on the client, so a secret fetched for one
//! execution does not outlive it.

use std::time::Duration;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use oath_core::UptimeSample;
use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;
use crate::retry::RetryPolicy;

/// Configuration for the uptime API client.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Base URL of the uptime API (e.g. `https://uptime.example.com/api`).
    pub base_url: url::Url,
    /// Request timeout in seconds (default: 30).
    pub timeout_secs: u64,
    /// Backoff for transport failures.
    pub retry: RetryPolicy,
}

impl TelemetryConfig {
    /// Create a configuration with default timeout.
    pub fn new(base_url: url::Url) -> Self {
        Self {
            base_url,
            timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Body of a successful uptime response.
///
/// Only `uptimePercent` is required. The remaining fields are carried so
/// that executors compare the full response, not just the number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeReport {
    /// Provider address as echoed by the API.
    #[serde(default)]
    pub provider: Option<String>,
    /// Uptime percentage.
    pub uptime_percent: f64,
    /// When the measurement was taken.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// API-side compliance label (`compliant` / `breached`). Informational.
    #[serde(default)]
    pub status: Option<String>,
}

impl UptimeReport {
    /// Convert to a validated sample for the `requested` provider.
    ///
    /// The sample carries the provider the API echoed, when it echoed one,
    /// so a response about a different address fails evaluation instead of
    /// being attributed to the agreement. A report without a timestamp is
    /// stamped with `received_at`.
    pub fn to_sample(
        &self,
        requested: Address,
        received_at: DateTime<Utc>,
    ) -> Result<UptimeSample, TelemetryError> {
        let provider = match self.provider.as_deref() {
            Some(echoed) => echoed
                .parse::<Address>()
                .map_err(|_| TelemetryError::InvalidProvider {
                    value: echoed.to_string(),
                })?,
            None => requested,
        };
        let sample = UptimeSample {
            provider,
            uptime_percent: self.uptime_percent,
            observed_at: self.timestamp.unwrap_or(received_at),
        };
        sample
            .uptime_bps()
            .map_err(|source| TelemetryError::InvalidSample {
                provider: provider.to_checksum(None),
                source,
            })?;
        Ok(sample)
    }
}

/// HTTP client for the uptime API.
#[derive(Debug, Clone)]
pub struct UptimeClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl UptimeClient {
    /// Build a client from configuration. Only `http` and `https` base URLs
    /// are accepted.
    pub fn new(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        if !matches!(config.base_url.scheme(), "http" | "https") {
            return Err(TelemetryError::Config(format!(
                "uptime API URL must be http(s), got {}",
                config.base_url.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TelemetryError::Config(format!("failed to build HTTP client: {e}")))?;

        let base_url = config.base_url.as_str().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            retry: config.retry,
        })
    }

    /// The base URL requests are issued against, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the current uptime report for a provider.
    ///
    /// Transport failures are retried per the configured [`RetryPolicy`]. Any non-2xx status or an
    /// undecodable body is an error.
    pub async fn fetch_uptime(
        &self,
        provider: Address,
        api_key: &str,
    ) -> Result<UptimeReport, TelemetryError> {
        let url = format!(
            "{}/provider/{}/uptime",
            self.base_url,
            provider.to_checksum(None)
        );
        let endpoint = "GET /provider/{address}/uptime";

        let resp = self
            .retry
            .send(|| self.http.get(&url).bearer_auth(api_key).send())
            .await
            .map_err(|source| TelemetryError::Http {
                endpoint: endpoint.into(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TelemetryError::ApiError {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                body,
            });
        }

        let report: UptimeReport =
            resp.json()
                .await
                .map_err(|source| TelemetryError::Deserialization {
                    endpoint: endpoint.into(),
                    source,
                })?;

        tracing::debug!(
            %provider,
            uptime_percent = report.uptime_percent,
            "uptime report received"
        );
        Ok(report)
    }
}
