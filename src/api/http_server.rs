// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::upload::{upload_handler, STATIC_URL_PREFIX};
use crate::pipeline::PlateRecognizer;
use crate::version::VERSION_NUMBER;

/// Plain-text banner served at `/`
pub const ROOT_BANNER: &str = "Number Plate Detection Backend Running!";

/// Shared state: models are loaded once and never mutated afterwards
pub struct AppState {
    pub recognizer: Arc<PlateRecognizer>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(recognizer: PlateRecognizer, max_upload_bytes: usize) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            max_upload_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub detector: String,
    pub ocr: String,
}

/// Build the router with every route and layer
pub fn create_app(state: Arc<AppState>) -> Router {
    let static_dir = state.recognizer.store().static_dir().to_path_buf();

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/upload", post(upload_handler))
        .nest_service(STATIC_URL_PREFIX, ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `listen_addr` and serve until Ctrl+C
pub async fn start_server(state: Arc<AppState>, listen_addr: &str) -> anyhow::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    tracing::info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn root_handler() -> &'static str {
    ROOT_BANNER
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION_NUMBER.to_string(),
        detector: state.recognizer.detector_name().to_string(),
        ocr: state.recognizer.reader_name().to_string(),
    })
}
