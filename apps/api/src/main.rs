mod config;
mod document;
mod errors;
mod extraction;
mod import;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, ExtractionBackend};
use crate::extraction::{FunctionClient, LlmExtractor, StructuredExtractor};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::{spawn_session_sweeper, AppState};

const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume import API v{}", env!("CARGO_PKG_VERSION"));

    let extractor = build_extractor(&config)?;
    info!(
        "Extraction backend: {} (timeout {}s, upload cap {} bytes, development: {})",
        extractor.backend(),
        config.extraction_timeout_secs,
        config.max_upload_bytes,
        config.development_mode
    );

    let state = AppState::new(config.clone(), extractor);
    spawn_session_sweeper(
        state.sessions.clone(),
        Duration::from_secs(config.session_ttl_secs),
        SESSION_SWEEP_PERIOD,
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_extractor(config: &Config) -> Result<Arc<dyn StructuredExtractor>> {
    let timeout = Duration::from_secs(config.extraction_timeout_secs);
    let extractor: Arc<dyn StructuredExtractor> = match &config.backend {
        ExtractionBackend::Function { url, key } => Arc::new(
            FunctionClient::new(url.clone(), key.clone(), timeout)
                .context("Failed to build extraction function client")?,
        ),
        ExtractionBackend::Llm { api_key } => {
            let llm = LlmClient::new(api_key.clone(), timeout)
                .context("Failed to build LLM client")?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(LlmExtractor::new(llm))
        }
    };
    Ok(extractor)
}
