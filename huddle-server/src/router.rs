use crate::config::ServerConfig;
use crate::room::RoomRegistry;
use crate::signaling::{SignalRelay, ws_handler};
use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub fn router(relay: SignalRelay) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .with_state(relay)
}

/// Serves the relay on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, relay: SignalRelay) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Signaling server listening on ws://{}/ws", addr);

    axum::serve(listener, router(relay))
        .await
        .context("Signaling server terminated")
}

pub async fn run(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    let relay = SignalRelay::new(RoomRegistry::new(), config.ice_servers);

    serve(listener, relay).await
}
