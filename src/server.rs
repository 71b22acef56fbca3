//! HTTP status endpoint

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{GmailError, Result};
use crate::models::ResponderStatus;
use crate::responder::Responder;

#[derive(Clone)]
pub struct AppState {
    pub responder: Arc<Responder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(flatten)]
    pub responder: ResponderStatus,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(status))
        .with_state(state)
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let responder = state.responder.status().await;
    let status = if responder.last_error.is_some() {
        "degraded"
    } else {
        "ok"
    };

    Json(StatusResponse {
        status: status.to_string(),
        responder,
    })
}

pub fn bind_address(config: &ServerConfig) -> Result<SocketAddr> {
    let host: IpAddr = config
        .host
        .parse()
        .map_err(|_| GmailError::ConfigError(format!("invalid server.host: {}", config.host)))?;
    Ok(SocketAddr::new(host, config.port))
}

/// Serve the status endpoint until `shutdown` resolves
pub async fn serve<F>(config: &ServerConfig, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = bind_address(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Status endpoint listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
