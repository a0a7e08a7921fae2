//! Tour quoting desk: package catalog, quote pricing, reference numbering,
//! quote history and thermal tickets behind an Axum JSON API.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod logging;
pub mod pricing;
pub mod routes;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::CatalogCache;
use crate::config::{Config, HistoryBackend};
use crate::document::{DocumentSink, ThermalTicket};
use crate::history::{CsvHistoryStore, History, HistoryStore, MemoryHistoryStore, PgHistoryStore};
use crate::pricing::OptionCatalog;

pub use routes::app;

/// How long a loaded catalog file is trusted before re-reading it
const CATALOG_TTL: Duration = Duration::from_secs(5 * 60);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: CatalogCache,
    pub options: Arc<OptionCatalog>,
    pub history: Arc<History>,
    pub tickets: Arc<dyn DocumentSink>,
}

impl AppState {
    /// Assemble state from already-built parts
    pub fn new(config: Config, catalog: CatalogCache, options: OptionCatalog, history: History) -> Self {
        let tickets = ThermalTicket::new(
            config.agency.clone(),
            config.exchange_rate,
            config.primary_currency.clone(),
            config.secondary_currency.clone(),
        );

        Self {
            config: Arc::new(config),
            catalog,
            options: Arc::new(options),
            history: Arc::new(history),
            tickets: Arc::new(tickets),
        }
    }

    /// Build state from configuration: option table, history backend and
    /// catalog cache.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let options = match &config.options_file {
            Some(path) => {
                let json = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading options file {}", path.display()))?;
                OptionCatalog::from_json(&json)
                    .with_context(|| format!("parsing options file {}", path.display()))?
            }
            None => OptionCatalog::default(),
        };
        tracing::info!("{} quote options configured", options.options.len());

        let store: Arc<dyn HistoryStore> = match &config.history_backend {
            HistoryBackend::Csv(path) => {
                tracing::info!("History backend: CSV file {}", path.display());
                Arc::new(CsvHistoryStore::new(path.clone()))
            }
            HistoryBackend::Postgres(url) => {
                tracing::info!("History backend: PostgreSQL");
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(url)
                    .await
                    .context("connecting to DATABASE_URL")?;
                let store = PgHistoryStore::new(pool);
                store.ensure_schema().await?;
                Arc::new(store)
            }
            HistoryBackend::Memory => {
                tracing::warn!("History backend: memory, records are lost on restart");
                Arc::new(MemoryHistoryStore::default())
            }
        };

        let history = History::new(store, config.numbering());
        let catalog = CatalogCache::from_file(config.data_file.clone(), CATALOG_TTL);

        // Fail fast on a missing or malformed catalog
        let loaded = catalog.get().await?;
        tracing::info!(
            "Catalog loaded from {}: {} entries",
            config.data_file.display(),
            loaded.entries().len()
        );

        Ok(Self::new(config, catalog, options, history))
    }
}
