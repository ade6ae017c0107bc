//! Per-executor uptime reads.
//!
//! [`UptimeSource`] is what each consensus executor calls. The node context
//! is passed through so a host can route executors to different endpoints.

use std::future::Future;

use alloy_primitives::Address;
use oath_telemetry::{TelemetryError, UptimeClient, UptimeReport};

use crate::consensus::NodeContext;

/// Telemetry capability used inside a consensus round.
pub trait UptimeSource: Send + Sync {
    /// Fetch the current report for `provider` on behalf of executor `node`.
    fn fetch_uptime(
        &self,
        node: NodeContext,
        provider: Address,
        api_key: &str,
    ) -> impl Future<Output = Result<UptimeReport, TelemetryError>> + Send;
}

impl UptimeSource for UptimeClient {
    async fn fetch_uptime(
        &self,
        node: NodeContext,
        provider: Address,
        api_key: &str,
    ) -> Result<UptimeReport, TelemetryError> {
        tracing::trace!(node = node.node, %provider, "executor fetching uptime");
        UptimeClient::fetch_uptime(self, provider, api_key).await
    }
}
