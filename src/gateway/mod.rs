//! HTTP Intake Gateway
//!
//! Thin axum layer over the core: validates and admits commands via the
//! [`Teller`](crate::pipeline::Teller) handle and reports each command's
//! terminal outcome as the response. Account create/list go straight to the
//! store; balance mutations only ever go through the pipeline.

pub mod handlers;
pub mod state;
pub mod types;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use state::AppState;

/// Start the HTTP gateway and serve until the process exits.
pub async fn run_server(config: &GatewayConfig, state: AppState) -> anyhow::Result<()> {
    let state = Arc::new(state);

    let api = Router::new()
        .route(
            "/accounts",
            post(handlers::create_account).get(handlers::list_accounts),
        )
        .route("/accounts/deposit", put(handlers::deposit))
        .route("/accounts/withdraw", put(handlers::withdraw))
        .route("/health", get(handlers::health_check));

    let app = Router::new().nest("/api/v1", api).with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("gateway listening on http://{addr}");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
