//! In-memory caching using moka
//!
//! The catalog file is re-read at most every few minutes, so price edits
//! show up without a restart.

use moka::future::Cache;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::catalog::Catalog;
use crate::error::{AppError, Result};

const CATALOG_KEY: &str = "catalog";

/// Where the catalog comes from
#[derive(Debug, Clone)]
enum CatalogSource {
    File(PathBuf),
    Fixed(Arc<Catalog>),
}

/// Catalog cache shared by all handlers
#[derive(Clone)]
pub struct CatalogCache {
    source: CatalogSource,
    catalogs: Cache<String, Arc<Catalog>>,
}

impl CatalogCache {
    /// Cache over a CSV file, reloaded after `ttl`
    pub fn from_file(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            source: CatalogSource::File(path.into()),
            catalogs: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Catalog held in memory for the life of the cache
    pub fn fixed(catalog: Catalog) -> Self {
        Self {
            source: CatalogSource::Fixed(Arc::new(catalog)),
            catalogs: Cache::builder().max_capacity(1).build(),
        }
    }

    /// Current catalog, loading it from disk on a miss
    pub async fn get(&self) -> Result<Arc<Catalog>> {
        let path = match &self.source {
            CatalogSource::Fixed(catalog) => return Ok(Arc::clone(catalog)),
            CatalogSource::File(path) => path.clone(),
        };

        if let Some(cached) = self.catalogs.get(CATALOG_KEY).await {
            tracing::debug!("Cache HIT for catalog");
            return Ok(cached);
        }

        tracing::debug!("Cache MISS for catalog, loading {}", path.display());
        let catalog = tokio::task::spawn_blocking(move || Catalog::load(&path))
            .await
            .map_err(|e| AppError::Internal(format!("catalog load task failed: {}", e)))??;

        if catalog.is_empty() {
            tracing::warn!("Catalog is empty");
        }

        let catalog = Arc::new(catalog);
        self.catalogs
            .insert(CATALOG_KEY.to_string(), Arc::clone(&catalog))
            .await;
        Ok(catalog)
    }

    /// Drop the cached catalog so the next request reloads it
    pub fn invalidate(&self) {
        self.catalogs.invalidate_all();
        info!("Catalog cache invalidated");
    }

    /// Cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            catalog_cached: self.catalogs.entry_count() > 0,
            file_backed: matches!(self.source, CatalogSource::File(_)),
        }
    }
}

/// Cache statistics for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub catalog_cached: bool,
    pub file_backed: bool,
}
