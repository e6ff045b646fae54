//! Router assembly and the serving loop.

use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use tgc_core::config::Config;
use tgc_core::directory::DirectoryStore;
use tgc_core::service::PlacementService;
use tgc_core::telegram::port::TelegramConnector;
use tokio::net::TcpListener;
use tracing::info;

use crate::handlers;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PlacementService>,
}

impl AppState {
    pub fn new(
        connector: Arc<dyn TelegramConnector>,
        store: Arc<dyn DirectoryStore>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            service: Arc::new(PlacementService::new(connector, store, config)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/validate_session", post(handlers::validate_session))
        .route("/get_me", post(handlers::get_me))
        .route("/send_message", post(handlers::send_message))
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve listen address")?;
    info!(addr = %local_addr, "listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .context("server exited unexpectedly")?;
    Ok(())
}
