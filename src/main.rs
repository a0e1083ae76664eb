// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use plate_reader_node::{
    api::{start_server, AppState},
    vision::VisionModelManager,
    PlateRecognizer, ServerConfig,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting {}", plate_reader_node::version::get_version_string());
    tracing::debug!("Build info: {}", plate_reader_node::version::get_version_info());

    let config = ServerConfig::parse();
    config.validate().context("Invalid configuration")?;

    let store = config.file_store();
    store.ensure_dirs()?;

    let vision_config = config.vision_model_config();
    let manager = tokio::task::spawn_blocking(move || VisionModelManager::new(vision_config))
        .await
        .context("Model loading task panicked")?
        .context("Failed to load vision models")?;

    for model in manager.list_models() {
        tracing::info!("📦 {} model '{}' ({})", model.model_type, model.name, model.path);
    }

    let recognizer = PlateRecognizer::new(
        manager.detector(),
        manager.text_reader(),
        store,
        config.selection,
    );
    let state = Arc::new(AppState::new(recognizer, config.max_upload_bytes));

    start_server(state, &config.listen_addr()).await
}
