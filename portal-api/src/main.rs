//! # Marketing Portal API Server
//!
//! HTTP backend for the marketing-consulting portal: session validation,
//! projects, approvals, report exports, workflow buttons and webhooks, on
//! top of Azure Cosmos DB.
//!
//! ## Usage
//!
//! ```bash
//! STORAGE_BACKEND=memory NEXTAUTH_SECRET=$(openssl rand -hex 32) cargo run -p portal-api
//! ```

use anyhow::Context;
use portal_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat, StorageBackend},
};
use portal_shared::db::{CosmosStore, MemoryStore, SharedStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portal_api=debug,portal_shared=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn build_store(config: &Config) -> anyhow::Result<SharedStore> {
    let store: SharedStore = match config.cosmos.backend {
        StorageBackend::Cosmos => Arc::new(
            CosmosStore::new(config.cosmos.client_config()).context("Failed to configure Cosmos DB client")?,
        ),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new(&config.cosmos.database_id))
        }
    };
    Ok(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, exiting...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.api.log_format);

    tracing::info!("Marketing Portal API v{} starting...", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config)?;

    // The memory store always starts empty and needs its containers
    if config.cosmos.init_on_startup || config.cosmos.backend == StorageBackend::Memory {
        let report = store
            .initialize_database()
            .await
            .context("Failed to initialize database")?;
        tracing::info!(
            database = %store.database_id(),
            containers = report.len(),
            "Database initialized"
        );
    }

    let bind_address = config.bind_address();
    let state = AppState::new(store, config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
