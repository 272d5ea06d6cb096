use actix::prelude::*;
use actix_web::web;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod archive;
mod config;
mod domain;
mod gateway;
mod metrics;
mod server;
mod store;

use archive::{FsReceiptArchive, InMemoryReceiptArchive, ReceiptArchive, RedisReceiptArchive};
use config::{AppConfig, ArchiveBackend, StoreBackend};
use domain::order::OrderReconciler;
use gateway::{BroadcastHub, OrderGateway};
use store::{InMemoryOrderStore, OrderStore, ScyllaOrderStore};

#[actix::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_broadcast=debug"))
        )
        .init();

    tracing::info!("🚀 Starting order broadcast service");

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    // === 1. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 2. Order Store ===
    let store: Arc<dyn OrderStore> = match config.store {
        StoreBackend::Scylla => Arc::new(
            ScyllaOrderStore::connect(&config.scylla_nodes, &config.scylla_keyspace, &config.partition_key)
                .await?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory order store, orders are lost on restart");
            Arc::new(InMemoryOrderStore::with_partition_key(config.partition_key.clone()))
        }
    };

    // === 3. Receipt Archive ===
    let archive: Option<Arc<dyn ReceiptArchive>> = match config.archive {
        ArchiveBackend::Redis => Some(Arc::new(RedisReceiptArchive::connect(&config.redis_url).await?)),
        ArchiveBackend::Fs => Some(Arc::new(FsReceiptArchive::open(&config.receipt_dir).await?)),
        ArchiveBackend::Memory => Some(Arc::new(InMemoryReceiptArchive::new())),
        ArchiveBackend::None => {
            tracing::warn!("Receipt archive disabled, completed orders will not be archived");
            None
        }
    };
    tracing::info!(store = ?config.store, archive = ?config.archive, "✅ Backends ready");

    // === 4. Broadcast hub and shared gateway ===
    let hub = BroadcastHub::new(Some(metrics.clone())).start();
    let reconciler = OrderReconciler::new(store.clone(), archive, config.partition_key.clone());
    tracing::info!(partition_key = %reconciler.partition_key(), "Order reconciler ready");

    let gateway = web::Data::new(OrderGateway::new(reconciler, store, hub, metrics.clone()));

    // === 5. Serve until shutdown ===
    server::run(config, gateway, metrics).await?;

    tracing::info!("👋 Order broadcast service stopped");
    Ok(())
}
