//! FGPT - natural-language form generator
//!
//! A Rust backend that turns a free-text description into a validated list
//! of form questions through a per-conversation state machine.

mod api;
mod form;
mod generation;
mod progress;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use generation::{GenerationConfig, HttpGenerationClient, LoggingGenerator};
use progress::ProgressConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fgpt=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("FGPT_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let generation_config = GenerationConfig::from_env()?;
    tracing::info!(
        endpoint = %generation_config.endpoint(),
        timeout_secs = generation_config.timeout.map(|t| t.as_secs()),
        "Generation service configured"
    );

    let client = HttpGenerationClient::new(&generation_config)?;
    let generator = Arc::new(LoggingGenerator::new(Arc::new(client), "http"));

    // Create application state
    let state = AppState::new(generator, ProgressConfig::default());

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("FGPT server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
