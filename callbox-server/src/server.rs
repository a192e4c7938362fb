use crate::config::ServerConfig;
use crate::room::{RoomRegistry, SignalingCoordinator};
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::{Router, routing::get};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub fn router(service: SignalingService, cors: CorsLayer) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(service)
}

async fn health() -> &'static str {
    "OK"
}

/// Bind `config.bind_address` and serve until `shutdown` resolves.
pub async fn serve<F>(config: ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;

    serve_with_listener(listener, config, shutdown).await
}

/// Serve on an already bound listener. Fails before serving when `config`
/// does not validate.
pub async fn serve_with_listener<F>(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    config.validate()?;

    let cors = config.cors_layer()?;
    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);

    let service = SignalingService::new(cmd_tx, config.ice_servers);
    let coordinator =
        SignalingCoordinator::new(RoomRegistry::new(), cmd_rx, Arc::new(service.clone()));
    let coordinator_task = tokio::spawn(coordinator.run());

    let app = router(service, cors);

    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Signaling server listening on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Signaling server failed");

    // The coordinator holds a command sender through its output, so its
    // channel never closes on its own.
    coordinator_task.abort();
    info!("Signaling server stopped");

    served
}
