//! # oath-uptime-stub
//!
//! Local stand-in for the provider telemetry API. Serves a configurable
//! uptime percentage per provider so a breach can be staged on demand.
//!
//! ```text
//! UPTIME_STUB_PORT=3001 cargo run -p oath-uptime-stub
//! curl -X POST localhost:3001/set-uptime -d '{"uptime":95}' -H 'content-type: application/json'
//! ```
//!
//! If `UPTIME_STUB_API_KEY` is set, uptime reads require it as a bearer
//! token.

mod routes;
mod store;

use tracing_subscriber::EnvFilter;

use crate::store::AppState;

const DEFAULT_PORT: u16 = 3001;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = match std::env::var("UPTIME_STUB_PORT") {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "UPTIME_STUB_PORT is not a port number, using {DEFAULT_PORT}");
            DEFAULT_PORT
        }),
        Err(_) => DEFAULT_PORT,
    };
    let api_key = std::env::var("UPTIME_STUB_API_KEY").ok().filter(|k| !k.is_empty());

    let state = AppState::new(api_key);
    let app = routes::router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "uptime stub listening");
    axum::serve(listener, app.into_make_service()).await
}
