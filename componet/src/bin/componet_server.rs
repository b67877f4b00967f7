//! Query server over the configured catalog store.
//!
//! Configuration comes from `COMPONET_CONFIG` (a JSON `ServiceConfig`) plus
//! the `COMPONET_*` overrides. Set `COMPONET_LOG_FORMAT=json` for structured
//! logs.

use componet::config::ServiceConfig;
use componet::logging::setup::{init_logging, LoggingConfig};
use componet::metadata::MetadataRegistry;
use componet::pipeline::QueryPipeline;
use componet::server;
use componet::sources::CatalogStore;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging = match std::env::var("COMPONET_LOG_FORMAT").as_deref() {
        Ok("json") => LoggingConfig::production(),
        _ => LoggingConfig::default(),
    };
    init_logging(logging)?;

    let config = ServiceConfig::from_env()?;

    let registry = match &config.metadata_path {
        Some(path) => MetadataRegistry::from_path(path)?,
        None => MetadataRegistry::builtin()?,
    };
    info!(
        version = registry.version(),
        fingerprint = %registry.fingerprint(),
        entries = registry.entries().len(),
        "Loaded metadata table"
    );

    let store = CatalogStore::from_config(&config.catalog, &config.store).await?;
    info!(table = %store.table(), "Catalog store ready");

    let pipeline = QueryPipeline::new(Arc::new(registry), Arc::new(store), &config);
    server::serve(&config.bind_address, pipeline).await?;
    Ok(())
}
