//! Corkboard Server Binary
//!
//! Starts the HTTP server for Corkboard.

use std::sync::Arc;

use clap::Parser;
use corkboard::http::build_router;
use corkboard::{Config, MessageService, Store, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// Corkboard Server
#[derive(Parser, Debug)]
#[command(name = "corkboard-server")]
#[command(about = "Message-record service over a single-file ordered store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./corkboard_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// fsync every N commits instead of every commit
    #[arg(long)]
    sync_every: Option<usize>,

    /// Maximum request body size in KB
    #[arg(long, default_value = "1024")]
    max_body_kb: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,corkboard=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    tracing::info!("Corkboard Server v{}", corkboard::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let sync_strategy = match args.sync_every {
        Some(count) if count > 1 => SyncStrategy::EveryNCommits { count },
        _ => SyncStrategy::EveryCommit,
    };
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .sync_strategy(sync_strategy)
        .max_body_bytes(args.max_body_kb * 1024)
        .build();

    // Open store
    let store = match Store::open(config.clone()) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let service = Arc::new(MessageService::new(Arc::clone(&store)));
    let app = build_router(service, &config);

    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Listening on {}", config.listen_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    // Teardown: make sure the last commits reach the disk
    if let Err(e) = store.sync() {
        tracing::error!("Final sync failed: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

/// Resolve when a shutdown signal arrives
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Received Ctrl+C, shutting down");
}
