//! Depth ladder service
//!
//! Maintains replica order books from a streaming snapshot and delta feed
//! and publishes display-ready depth views to the rendering surface.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use book_ladder::{AppState, BookManager, Config, FeedManager, Publisher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting depth ladder service");

    // Load configuration
    let config = Arc::new(Config::load()?);
    info!(symbols = ?config.symbols, "Configuration loaded");

    // Initialize book manager with the configured instruments
    let mut manager = BookManager::new();
    for symbol in &config.symbols {
        manager.track(symbol);
    }
    let books = Arc::new(RwLock::new(manager));

    // Initialize publisher for IPC
    let publisher = Arc::new(Publisher::new(&config.ipc_socket_path).await?);

    // Create shared application state
    let state = Arc::new(AppState {
        books: books.clone(),
        publisher: publisher.clone(),
        config: config.clone(),
    });

    // Start health check server
    let health_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = start_health_server(health_state).await {
            warn!(error = %e, "Health server error");
        }
    });

    // Start feed manager
    let mut feed_manager = FeedManager::new(state);
    feed_manager.run().await?;

    Ok(())
}

/// Start HTTP server for health checks and metrics
async fn start_health_server(state: Arc<AppState>) -> anyhow::Result<()> {
    use std::net::SocketAddr;

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.health_port));
    info!(addr = %addr, "Starting health check server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "component": "book-ladder",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn metrics() -> String {
    use prometheus::{Encoder, TextEncoder};
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
