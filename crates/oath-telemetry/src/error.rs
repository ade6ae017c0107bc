//! Telemetry client error types.

/// Errors from uptime API calls.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// HTTP transport error after retries were exhausted.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The API returned a non-2xx status.
    #[error("uptime API {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The response decoded but its measurement is unusable.
    #[error("invalid uptime sample for {provider}: {source}")]
    InvalidSample {
        provider: String,
        source: oath_core::ValidationError,
    },
    /// The echoed provider is not an address.
    #[error("uptime API echoed an unparseable provider {value:?}")]
    InvalidProvider { value: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
