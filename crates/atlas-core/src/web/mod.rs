//! REST API for the catalogue
//!
//! Routes, shared state and the error-to-response mapping for the Axum server.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::Router;
use axum::routing::{delete, get, post};
use std::sync::Arc;

pub use auth::{ANONYMOUS_USER, CurrentUser, USER_HEADER};
pub use state::AppState;

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_handler))
        // Search
        .route(
            "/api/application/search/{query}",
            get(handlers::search_applications),
        )
        .route(
            "/api/measurable/search/{query}",
            get(handlers::search_measurables),
        )
        .route("/api/entity-search", post(handlers::search_entities))
        // Logical flows
        .route("/api/logical-flow", post(handlers::add_flow))
        .route("/api/logical-flow/{id}", delete(handlers::remove_flow))
        .route(
            "/api/logical-flow/entity/{kind}/{id}",
            get(handlers::find_flows_by_entity),
        )
        .route(
            "/api/logical-flow/selector",
            post(handlers::find_flows_by_selector),
        )
        .route("/api/logical-flow/stats", post(handlers::flow_stats))
        // Flow diagram entities
        .route(
            "/api/flow-diagram-entity/id/{id}",
            get(handlers::find_diagram_entities),
        )
        .route(
            "/api/flow-diagram-entity/entity/{kind}/{id}",
            get(handlers::find_diagrams_for_entity),
        )
        .layer(axum::middleware::from_fn(middleware::log_request))
        .with_state(state)
}

/// Serve the API on `addr` until Ctrl-C
pub async fn serve(state: Arc<AppState>, addr: &str) -> anyhow::Result<()> {
    use anyhow::Context;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(address = %addr, dialect = %state.search.dialect(), "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
        })
        .await
        .context("HTTP server failed")
}
