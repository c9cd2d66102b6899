//! Chatbook - conversation session manager for a travel chat assistant
//!
//! A Rust backend owning the conversation collection, running turns against
//! a remote assistant service, and serving the session over HTTP + SSE.

mod api;
mod assistant;
mod config;
mod db;
mod runtime;
mod search;
mod state_machine;
mod title;

use api::{create_router, AppState};
use assistant::{HttpAssistant, LoggingAssistant};
use config::Config;
use db::Database;
use runtime::DatabasePersistence;
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
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
                .unwrap_or_else(|_| "chatbook=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env();

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(
                path = %parent.display(),
                error = %e,
                "Failed to create database directory"
            );
        }
    }

    // Initialize database
    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open_or_recover(&config.db_path)?;

    // Remote assistant
    let assistant = HttpAssistant::new(&config.assistant)?;
    tracing::info!(
        server_url = %config.assistant.server_url,
        timeout_secs = config.assistant.request_timeout.as_secs(),
        default_model = %config.assistant.default_model,
        "Assistant client initialized"
    );

    // Start the session runtime
    let session = runtime::start(
        DatabasePersistence::new(db),
        LoggingAssistant::new(assistant),
    );

    let port = config.port;
    let state = AppState::new(session, config);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Chatbook server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
