//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::services::RenderService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<RenderService>,
}

/// Create application state from configuration.
///
/// Fails if pdflatex or gs cannot be resolved; the server must not start
/// without both tools.
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let renderer = RenderService::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to create render service: {e}"))?;

    Ok(AppState {
        renderer: Arc::new(renderer),
    })
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/render", post(handle_render))
        // Health check
        .route("/health", get(api::handle_health))
        // Add state and tracing
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn handle_render(
    axum::extract::State(state): axum::extract::State<AppState>,
    body: axum::body::Bytes,
) -> Result<axum::response::Response, ApiError> {
    api::handle_render(axum::extract::State(state.renderer), body).await
}
