//! Contract tests for `JsonRpcEvmClient` and `SlaLedger` against a wiremock
//! JSON-RPC endpoint.
//!
//! | Method | Test |
//! |--------|------|
//! | `eth_call` | `reads_agreement_count`, `reads_agreement_record`, `rpc_error_is_surfaced` |
//! | `eth_sendTransaction` + `eth_getTransactionReceipt` | `write_report_*` |
//! | `eth_getLogs` | `get_logs_decodes_log_objects` |

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use oath_core::AgreementId;
use oath_ledger::abi::ISlaEnforcement;
use oath_ledger::{
    EvmClient, EvmRpcConfig, JsonRpcEvmClient, LedgerError, LogFilter, Report, ReportContext,
    SlaLedger, WriteStatus,
};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTRACT: Address = Address::repeat_byte(0x5f);

fn client(server: &MockServer) -> JsonRpcEvmClient {
    let config = EvmRpcConfig::new(server.uri().parse().unwrap(), "ethereum-testnet-sepolia");
    JsonRpcEvmClient::new(config).unwrap()
}

fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result
    }))
}

fn report() -> Report {
    Report {
        payload: Bytes::from(vec![0xaa, 0xbb]),
        context: ReportContext {
            workflow_id: B256::repeat_byte(1),
            execution_id: B256::repeat_byte(2),
            chain_selector: 1,
        },
        signatures: vec![],
    }
}

#[tokio::test]
async fn reads_agreement_count() {
    let server = MockServer::start().await;
    let encoded = Bytes::from(ISlaEnforcement::slaCountCall::abi_encode_returns(&(U256::from(2u64),)));

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "method": "eth_call",
            "params": [{}, "finalized"]
        })))
        .respond_with(rpc_result(serde_json::json!(encoded)))
        .expect(1)
        .mount(&server)
        .await;

    let ledger = SlaLedger::new(client(&server), CONTRACT);
    assert_eq!(ledger.agreement_count().await.unwrap(), 2);
}

#[tokio::test]
async fn reads_agreement_record() {
    let server = MockServer::start().await;
    let encoded = Bytes::from(ISlaEnforcement::slasCall::abi_encode_returns(&(
        Address::repeat_byte(0x74),
        Address::repeat_byte(0x75),
        U256::from(5_000u64),
        U256::from(4u64),
        U256::from(9950u64),
        U256::from(1000u64),
        U256::from(1_700_000_000u64),
        true,
    )));

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "method": "eth_call" })))
        .respond_with(rpc_result(serde_json::json!(encoded)))
        .mount(&server)
        .await;

    let ledger = SlaLedger::new(client(&server), CONTRACT);
    let agreement = ledger.agreement(AgreementId::new(0)).await.unwrap();
    assert_eq!(agreement.provider, Address::repeat_byte(0x74));
    assert_eq!(agreement.min_uptime_bps.value(), 9950);
    assert_eq!(agreement.penalty_bps.value(), 1000);
    assert!(agreement.active);
}

#[tokio::test]
async fn out_of_range_threshold_is_invalid_record() {
    let server = MockServer::start().await;
    let encoded = Bytes::from(ISlaEnforcement::slasCall::abi_encode_returns(&(
        Address::ZERO,
        Address::ZERO,
        U256::ZERO,
        U256::ZERO,
        U256::from(20_000u64),
        U256::ZERO,
        U256::ZERO,
        true,
    )));

    Mock::given(method("POST"))
        .respond_with(rpc_result(serde_json::json!(encoded)))
        .mount(&server)
        .await;

    let ledger = SlaLedger::new(client(&server), CONTRACT);
    let err = ledger.agreement(AgreementId::new(0)).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidRecord(_)));
}

#[tokio::test]
async fn rpc_error_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "execution reverted" }
        })))
        .mount(&server)
        .await;

    let ledger = SlaLedger::new(client(&server), CONTRACT);
    match ledger.agreement_count().await {
        Err(LedgerError::Rpc { method, message, .. }) => {
            assert_eq!(method, "eth_call");
            assert_eq!(message, "execution reverted");
        }
        other => panic!("expected RPC error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_failure_is_chain_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let ledger = SlaLedger::new(client(&server), CONTRACT);
    assert!(matches!(
        ledger.agreement_count().await,
        Err(LedgerError::ChainUnavailable { .. })
    ));
}

#[tokio::test]
async fn write_report_confirmed() {
    let server = MockServer::start().await;
    let tx_hash = B256::repeat_byte(0xcc);

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "method": "eth_sendTransaction" })))
        .respond_with(rpc_result(serde_json::json!(tx_hash)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "method": "eth_getTransactionReceipt" })))
        .respond_with(rpc_result(serde_json::json!({
            "status": "0x1",
            "blockNumber": "0x10",
            "logs": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client(&server).write_report(CONTRACT, &report()).await.unwrap();
    assert_eq!(receipt.tx_hash, tx_hash);
    assert_eq!(receipt.block_number, Some(16));
    assert_eq!(receipt.status, WriteStatus::Confirmed);
}

#[tokio::test]
async fn write_report_pending_when_no_receipt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "method": "eth_sendTransaction" })))
        .respond_with(rpc_result(serde_json::json!(B256::repeat_byte(0x01))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "method": "eth_getTransactionReceipt" })))
        .respond_with(rpc_result(serde_json::Value::Null))
        .mount(&server)
        .await;

    let receipt = client(&server).write_report(CONTRACT, &report()).await.unwrap();
    assert_eq!(receipt.status, WriteStatus::Pending);
    assert!(receipt.block_number.is_none());
}

#[tokio::test]
async fn write_report_reverted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "method": "eth_sendTransaction" })))
        .respond_with(rpc_result(serde_json::json!(B256::repeat_byte(0x02))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "method": "eth_getTransactionReceipt" })))
        .respond_with(rpc_result(serde_json::json!({ "status": "0x0", "blockNumber": "0x11" })))
        .mount(&server)
        .await;

    let err = client(&server).write_report(CONTRACT, &report()).await.unwrap_err();
    assert!(matches!(err, LedgerError::Reverted { tx_hash, .. } if tx_hash == B256::repeat_byte(0x02)));
}

#[tokio::test]
async fn write_report_through_forwarder_targets_forwarder() {
    let server = MockServer::start().await;
    let forwarder = Address::repeat_byte(0xf0);

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "method": "eth_sendTransaction",
            "params": [{ "to": forwarder }]
        })))
        .respond_with(rpc_result(serde_json::json!(B256::repeat_byte(0x03))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "method": "eth_getTransactionReceipt" })))
        .respond_with(rpc_result(serde_json::Value::Null))
        .mount(&server)
        .await;

    let config = EvmRpcConfig::new(server.uri().parse().unwrap(), "ethereum-testnet-sepolia")
        .with_forwarder(forwarder);
    let client = JsonRpcEvmClient::new(config).unwrap();
    client.write_report(CONTRACT, &report()).await.unwrap();
}

#[tokio::test]
async fn get_logs_decodes_log_objects() {
    let server = MockServer::start().await;
    let topic0 = B256::repeat_byte(0x0e);

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "method": "eth_getLogs" })))
        .respond_with(rpc_result(serde_json::json!([{
            "address": CONTRACT,
            "topics": [topic0],
            "data": "0x",
            "blockNumber": "0x20",
            "transactionHash": B256::repeat_byte(0x0f),
            "logIndex": "0x1"
        }])))
        .mount(&server)
        .await;

    let filter = LogFilter { address: CONTRACT, topic0, from_block: 0, to_block: 64 };
    let logs = client(&server).get_logs(&filter).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].block(), Some(32));
    assert_eq!(logs[0].topic0(), Some(topic0));
}
