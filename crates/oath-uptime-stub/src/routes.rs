//! HTTP routes.
//!
//! The read endpoint mirrors the production telemetry API shape the
//! workflow consumes. The `set-*`, `status` and `reset` endpoints are demo
//! controls for pushing a provider below its threshold and back.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::store::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/provider/{address}/uptime", get(provider_uptime))
        .route("/set-uptime", post(set_uptime))
        .route("/set-provider-uptime", post(set_provider_uptime))
        .route("/status", get(status))
        .route("/reset", post(reset))
        .route("/health", get(health))
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// `uptime` must be a JSON number in `[0, 100]`.
fn uptime_field(body: &Value) -> Option<f64> {
    body.get("uptime")
        .and_then(Value::as_f64)
        .filter(|u| (0.0..=100.0).contains(u))
}

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(expected) = state.api_key() else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}

async fn provider_uptime(
    State(state): State<AppState>,
    Path(address): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        tracing::warn!(%address, "rejected uptime read without valid bearer token");
        return error(StatusCode::UNAUTHORIZED, "missing or invalid bearer token");
    }

    let value = state.for_provider(&address);
    tracing::info!(%address, uptime = value.percent, "uptime read");
    Json(json!({
        "provider": address,
        "uptimePercent": value.percent,
        "timestamp": value.set_at.to_rfc3339(),
        "status": value.status(),
    }))
    .into_response()
}

async fn set_uptime(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let Some(uptime) = uptime_field(&body) else {
        return error(StatusCode::BAD_REQUEST, "uptime must be a number between 0 and 100");
    };
    state.set_global(uptime);
    tracing::info!(uptime, "global uptime set");
    Json(json!({
        "ok": true,
        "uptime": uptime,
        "message": format!("Global uptime set to {uptime}%"),
    }))
    .into_response()
}

async fn set_provider_uptime(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let Some(address) = body.get("address").and_then(Value::as_str) else {
        return error(StatusCode::BAD_REQUEST, "address is required");
    };
    let Some(uptime) = uptime_field(&body) else {
        return error(StatusCode::BAD_REQUEST, "uptime must be a number between 0 and 100");
    };
    state.set_provider(address, uptime);
    tracing::info!(%address, uptime, "provider uptime override set");
    Json(json!({
        "ok": true,
        "address": address,
        "uptime": uptime,
    }))
    .into_response()
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    let overrides: serde_json::Map<String, Value> = state
        .overrides()
        .into_iter()
        .map(|(address, uptime)| (address, json!(uptime)))
        .collect();
    Json(json!({
        "ok": true,
        "globalUptime": state.global().percent,
        "providerOverrides": overrides,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn reset(State(state): State<AppState>) -> Json<Value> {
    state.reset();
    tracing::info!("uptime state reset");
    Json(json!({
        "ok": true,
        "message": "Reset to defaults",
    }))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DEFAULT_UPTIME;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app() -> Router {
        router(AppState::new(None))
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let resp = test_app().oneshot(get_req("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn default_uptime_is_compliant() {
        let resp = test_app()
            .oneshot(get_req("/provider/0xAbC/uptime"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["provider"], "0xAbC");
        assert_eq!(body["uptimePercent"], DEFAULT_UPTIME);
        assert_eq!(body["status"], "compliant");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn global_uptime_applies_to_every_provider() {
        let state = AppState::new(None);
        let app = router(state.clone());

        let resp = app
            .clone()
            .oneshot(post_json("/set-uptime", json!({ "uptime": 95.0 })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(app.oneshot(get_req("/provider/0x1/uptime")).await.unwrap()).await;
        assert_eq!(body["uptimePercent"], 95.0);
        assert_eq!(body["status"], "breached");
    }

    #[tokio::test]
    async fn set_uptime_rejects_out_of_range() {
        for bad in [json!({ "uptime": 101 }), json!({ "uptime": -1 }), json!({ "uptime": "99" }), json!({})] {
            let resp = test_app().oneshot(post_json("/set-uptime", bad)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn provider_override_is_case_insensitive() {
        let state = AppState::new(None);
        let app = router(state.clone());

        let resp = app
            .clone()
            .oneshot(post_json(
                "/set-provider-uptime",
                json!({ "address": "0xABCD", "uptime": 98.0 }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(app.clone().oneshot(get_req("/provider/0xabcd/uptime")).await.unwrap()).await;
        assert_eq!(body["uptimePercent"], 98.0);

        let body = body_json(app.oneshot(get_req("/provider/0xother/uptime")).await.unwrap()).await;
        assert_eq!(body["uptimePercent"], DEFAULT_UPTIME);
    }

    #[tokio::test]
    async fn set_provider_uptime_requires_address() {
        let resp = test_app()
            .oneshot(post_json("/set-provider-uptime", json!({ "uptime": 50 })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn status_lists_overrides_and_reset_clears_them() {
        let state = AppState::new(None);
        state.set_global(90.0);
        state.set_provider("0xAA", 80.0);
        let app = router(state.clone());

        let body = body_json(app.clone().oneshot(get_req("/status")).await.unwrap()).await;
        assert_eq!(body["globalUptime"], 90.0);
        assert_eq!(body["providerOverrides"]["0xaa"], 80.0);

        let resp = app
            .clone()
            .oneshot(Request::builder().method("POST").uri("/reset").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(app.oneshot(get_req("/status")).await.unwrap()).await;
        assert_eq!(body["globalUptime"], DEFAULT_UPTIME);
        assert_eq!(body["providerOverrides"], json!({}));
    }

    #[tokio::test]
    async fn repeated_reads_are_identical() {
        let app = test_app();
        let a = body_json(app.clone().oneshot(get_req("/provider/0x1/uptime")).await.unwrap()).await;
        let b = body_json(app.oneshot(get_req("/provider/0x1/uptime")).await.unwrap()).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn configured_key_requires_bearer_token() {
        let app = router(AppState::new(Some("s3cret".into())));

        let resp = app.clone().oneshot(get_req("/provider/0x1/uptime")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = Request::builder()
            .uri("/provider/0x1/uptime")
            .header("authorization", "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
