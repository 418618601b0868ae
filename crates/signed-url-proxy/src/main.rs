//! Signed URL Proxy - HTTP front for the signed URL cache
//!
//! Resolves storage object paths to short-lived signed URLs, serving them
//! from a two-tier cache and minting through the storage provider on a miss.

mod config;
mod error;
mod server;
mod types;

use crate::config::{cache_ttl, load_config};
use crate::error::Result;
use crate::server::{start_server, ServerState, SharedState};
use signed_url_cache::{CacheConfig, FileStore, InMemoryStore, KeyValueStore, SignedUrlCache};
use std::sync::Arc;
use std::time::Duration;
use storage_signer::{SignerConfig, StorageSigner};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("signed_url_proxy=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting signed URL proxy...");

    let config = load_config()?;
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Bucket: {}", config.storage_bucket);
    info!("Cache TTL: {} seconds", config.cache_ttl_secs);

    let persistent: Arc<dyn KeyValueStore> = match &config.cache_dir {
        Some(dir) => {
            let store = FileStore::new(dir.clone());
            store.init().await?;
            Arc::new(store)
        }
        None => Arc::new(InMemoryStore::new()),
    };

    let signer = StorageSigner::new(SignerConfig::new(
        &config.storage_url,
        &config.storage_bucket,
        &config.storage_api_key,
    ))?;

    let cache_config = CacheConfig {
        ttl: cache_ttl(config.cache_ttl_secs)?,
        max_memory_entries: config.memory_cache_size,
        mint_expiry: Duration::from_secs(config.signed_url_expiry_secs),
        legacy_prefix: format!("{}/", config.storage_bucket),
        ..CacheConfig::default()
    };
    let cache = SignedUrlCache::new(cache_config, persistent, Arc::new(signer));
    cache.init().await;

    let state: SharedState = Arc::new(ServerState::new(cache));

    // Start HTTP server (blocking)
    start_server(state, config.port).await?;

    Ok(())
}
