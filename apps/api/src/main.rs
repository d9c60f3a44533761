mod analysis;
mod config;
mod errors;
mod extraction;
mod llm_client;
mod pipeline;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::TextExtractor;
use crate::llm_client::LlmClient;
use crate::pipeline::Pipeline;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing LLM_API_KEY)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS analyzer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client; a client that cannot be built aborts startup
    let llm = LlmClient::new(
        config.llm_api_key.clone(),
        &config.llm_api_url,
        Duration::from_secs(config.llm_timeout_secs),
    )
    .context("Failed to initialize LLM client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let extractor = TextExtractor::new(config.scratch_dir.clone());
    info!("Scratch directory: {}", extractor.scratch_dir().display());

    let pipeline = Pipeline::new(extractor, Arc::new(llm), config.analysis_strategy);
    info!("Analysis strategy: {}", pipeline.strategy());

    let state = AppState {
        pipeline,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!(
        "Listening on {addr} (max upload {} bytes)",
        config.max_upload_bytes
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
