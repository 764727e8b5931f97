use actix::prelude::*;
use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod actors;
mod config;
mod domain;
mod gateway;
mod metrics;
mod store;
mod utils;

use actors::BroadcastHub;
use config::{AppConfig, StoreBackend};
use domain::order::OrderService;
use gateway::AppState;
use store::{InMemoryOrderStore, OrderStore, ScyllaOrderStore};
use utils::{retry_with_backoff, RetryConfig};

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_board=debug"))
        )
        .init();

    tracing::info!("🚀 Starting order board");

    let config = AppConfig::from_env()?;
    tracing::info!(?config, "Loaded configuration");

    // === 1. Order store ===
    let store: Arc<dyn OrderStore> = match &config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory order store, orders are lost on restart");
            Arc::new(InMemoryOrderStore::new())
        }
        StoreBackend::Scylla { node, keyspace } => {
            let store = retry_with_backoff(&RetryConfig::default(), "scylla_connect", |_attempt| {
                ScyllaOrderStore::connect(node, keyspace)
            })
            .await?;
            Arc::new(store)
        }
    };

    // === 2. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        "📊 Metrics registry created with {} metrics",
        metrics.registry().gather().len()
    );

    // === 3. Broadcast hub (owns the push connection registry) ===
    let hub = BroadcastHub::new(metrics.clone()).start();

    // === 4. Order service, the single mutation path ===
    let service = OrderService::new(store, hub.clone(), metrics.clone())
        .with_max_content_len(config.max_content_len);

    let state = web::Data::new(AppState::new(
        Arc::new(service),
        hub,
        metrics,
        config.connection_buffer,
    ));

    // === 5. HTTP + push channel ===
    tracing::info!(host = %config.host, port = config.port, "🌐 Server is listening");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(metrics::configure)
            .configure(gateway::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    tracing::info!("🛑 Server stopped");
    Ok(())
}
