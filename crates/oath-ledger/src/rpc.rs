//! # EVM JSON-RPC Client
//!
//! [`EvmClient`] over plain JSON-RPC. Reads use `eth_call` against the
//! `finalized` block tag. Writes use `eth_sendTransaction`; the RPC endpoint
//! handles transaction signing, so the `from` address must be unlocked or
//! managed by the provider's signing service. This client holds no keys.
//!
//! ## Report Delivery
//!
//! - With a forwarder configured, the report is wrapped in
//!   `IReportForwarder.report(...)` and sent to the forwarder, which checks
//!   the executor signatures before calling the receiver.
//! - Without one, the report payload is sent straight to the receiver.
//!
//! After sending, the receipt is checked once. A mined receipt with status
//! `0x0` is reported as [`LedgerError::Reverted`].

use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use serde::Deserialize;

use crate::client::{EvmClient, WriteReceipt, WriteStatus};
use crate::error::LedgerError;
use crate::log::{EvmLog, LogFilter};
use crate::report::Report;

/// Configuration for a JSON-RPC client bound to one chain.
#[derive(Debug, Clone)]
pub struct EvmRpcConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: url::Url,
    /// Chain selector name (e.g. `ethereum-testnet-sepolia`), used in errors and logs.
    pub chain_name: String,
    /// Sender for write transactions, when the endpoint requires one.
    pub from_address: Option<Address>,
    /// Report forwarder contract, when reports are delivered through one.
    pub forwarder_address: Option<Address>,
    /// Request timeout in seconds (default: 30).
    pub timeout_secs: u64,
}

impl EvmRpcConfig {
    /// Create a configuration with default timeout and direct delivery.
    pub fn new(rpc_url: url::Url, chain_name: impl Into<String>) -> Self {
        Self {
            rpc_url,
            chain_name: chain_name.into(),
            from_address: None,
            forwarder_address: None,
            timeout_secs: 30,
        }
    }

    /// Set the sender address for write transactions.
    pub fn with_from(mut self, from: Address) -> Self {
        self.from_address = Some(from);
        self
    }

    /// Deliver reports through a forwarder contract.
    pub fn with_forwarder(mut self, forwarder: Address) -> Self {
        self.forwarder_address = Some(forwarder);
        self
    }
}

/// JSON-RPC [`EvmClient`].
#[derive(Debug)]
pub struct JsonRpcEvmClient {
    client: reqwest::Client,
    config: EvmRpcConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    status: Option<String>,
    block_number: Option<alloy_primitives::U64>,
    #[serde(default)]
    logs: Vec<EvmLog>,
}

#[derive(Debug, Deserialize)]
struct RpcBlockHeader {
    number: alloy_primitives::U64,
}

impl JsonRpcEvmClient {
    /// Create a client from configuration.
    pub fn new(config: EvmRpcConfig) -> Result<Self, LedgerError> {
        if !matches!(config.rpc_url.scheme(), "http" | "https") {
            return Err(LedgerError::Config(format!(
                "{}: RPC URL must be http(s), got {}",
                config.chain_name,
                config.rpc_url.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                LedgerError::Config(format!(
                    "{}: failed to build HTTP client: {e}",
                    config.chain_name
                ))
            })?;

        Ok(Self { client, config })
    }

    /// The client configuration.
    pub fn config(&self) -> &EvmRpcConfig {
        &self.config
    }

    fn unavailable(&self, reason: impl Into<String>) -> LedgerError {
        LedgerError::ChainUnavailable {
            chain: self.config.chain_name.clone(),
            reason: reason.into(),
        }
    }

    /// Send a JSON-RPC request and return the `result` field.
    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, LedgerError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(self.config.rpc_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.unavailable(format!("{method}: request timed out"))
                } else {
                    self.unavailable(format!("{method}: {e}"))
                }
            })?;

        if !resp.status().is_success() {
            return Err(self.unavailable(format!("{method}: HTTP {}", resp.status())));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| self.unavailable(format!("{method}: invalid JSON response: {e}")))?;

        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown RPC error");
            return Err(LedgerError::Rpc {
                chain: self.config.chain_name.clone(),
                method: method.to_string(),
                message: message.to_string(),
            });
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| self.unavailable(format!("{method}: response missing 'result' field")))
    }

    async fn rpc_decode<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, LedgerError> {
        let value = self.rpc_call(method, params).await?;
        serde_json::from_value(value).map_err(|e| LedgerError::Decode {
            what: format!("{method} result"),
            reason: e.to_string(),
        })
    }

    async fn receipt(&self, tx_hash: B256) -> Result<Option<RpcReceipt>, LedgerError> {
        self.rpc_decode("eth_getTransactionReceipt", serde_json::json!([tx_hash]))
            .await
    }
}

impl EvmClient for JsonRpcEvmClient {
    fn chain_name(&self) -> &str {
        &self.config.chain_name
    }

    async fn call_contract(&self, to: Address, data: Bytes) -> Result<Bytes, LedgerError> {
        let call = serde_json::json!({ "to": to, "data": data });
        self.rpc_decode("eth_call", serde_json::json!([call, "finalized"]))
            .await
    }

    async fn write_report(
        &self,
        receiver: Address,
        report: &Report,
    ) -> Result<WriteReceipt, LedgerError> {
        let (to, data) = match self.config.forwarder_address {
            Some(forwarder) => (forwarder, report.forwarder_calldata(receiver)),
            None => (receiver, report.payload.clone()),
        };

        let mut tx = serde_json::json!({ "to": to, "data": data });
        if let Some(from) = self.config.from_address {
            tx["from"] = serde_json::json!(from);
        }

        let tx_hash: B256 = self
            .rpc_decode("eth_sendTransaction", serde_json::json!([tx]))
            .await?;

        tracing::debug!(
            chain = %self.config.chain_name,
            %to,
            %tx_hash,
            "report transaction submitted"
        );

        match self.receipt(tx_hash).await? {
            None => Ok(WriteReceipt {
                tx_hash,
                block_number: None,
                status: WriteStatus::Pending,
            }),
            Some(receipt) if receipt.status.as_deref() == Some("0x0") => Err(LedgerError::Reverted {
                chain: self.config.chain_name.clone(),
                tx_hash,
            }),
            Some(receipt) => Ok(WriteReceipt {
                tx_hash,
                block_number: receipt.block_number.map(|n| n.to::<u64>()),
                status: WriteStatus::Confirmed,
            }),
        }
    }

    async fn finalized_block(&self) -> Result<u64, LedgerError> {
        let header: Option<RpcBlockHeader> = self
            .rpc_decode(
                "eth_getBlockByNumber",
                serde_json::json!(["finalized", false]),
            )
            .await?;
        header
            .map(|h| h.number.to::<u64>())
            .ok_or_else(|| self.unavailable("no finalized block reported"))
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<EvmLog>, LedgerError> {
        let params = serde_json::json!([{
            "address": filter.address,
            "topics": [filter.topic0],
            "fromBlock": format!("0x{:x}", filter.from_block),
            "toBlock": format!("0x{:x}", filter.to_block),
        }]);
        self.rpc_decode("eth_getLogs", params).await
    }

    async fn transaction_logs(&self, tx_hash: B256) -> Result<Vec<EvmLog>, LedgerError> {
        self.receipt(tx_hash)
            .await?
            .map(|r| r.logs)
            .ok_or_else(|| self.unavailable(format!("no receipt for transaction {tx_hash}")))
    }
}
