//! # Catalog Store
//!
//! TTL-aware index of `(source, locator) -> url` claims. Writes are
//! additive: a refresh appends rows and [`CatalogStore::find`] collapses to
//! the newest claim per source, so a source supersedes its own stale claim
//! without a delete-before-insert window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::catalog::providers::{CatalogProvider, FileCatalog, MemoryCatalog};
use crate::catalog::types::{
    CatalogConfig, CatalogEntry, CatalogResult, CatalogRow, RowFilter, UnitKey, locator, now,
};

#[derive(Clone)]
pub struct CatalogStore {
    provider: Arc<dyn CatalogProvider>,
    grace_period: Duration,
}

impl CatalogStore {
    /// Open a catalog store. A configured path gets the persistent file
    /// backend, otherwise the catalog lives in memory.
    pub async fn open(config: CatalogConfig) -> CatalogResult<Self> {
        let provider: Arc<dyn CatalogProvider> = match &config.path {
            Some(path) => Arc::new(FileCatalog::open(path.clone()).await?),
            None => Arc::new(MemoryCatalog::new()),
        };
        Ok(Self {
            provider,
            grace_period: config.grace_period,
        })
    }

    /// An in-memory store with the default grace period.
    pub fn in_memory() -> Self {
        Self {
            provider: Arc::new(MemoryCatalog::new()),
            grace_period: CatalogConfig::default().grace_period,
        }
    }

    /// Record a claim. The entry expires `expires` from now.
    pub async fn add_entry(
        &self,
        source_id: &str,
        expires: Duration,
        type_id: &str,
        unit_key: &UnitKey,
        url: &str,
    ) -> CatalogResult<()> {
        let row = CatalogRow {
            row_id: self.provider.next_row_id(),
            entry: CatalogEntry {
                source_id: source_id.to_string(),
                expiration: now() + expires.as_secs(),
                locator: locator(type_id, unit_key),
                unit_key: unit_key.clone(),
                url: url.to_string(),
            },
        };
        self.provider.insert(row).await
    }

    /// Delete all claims one source has made for one unit.
    pub async fn delete_entry(
        &self,
        source_id: &str,
        type_id: &str,
        unit_key: &UnitKey,
    ) -> CatalogResult<u64> {
        self.provider
            .delete(RowFilter::Unit {
                source_id: source_id.to_string(),
                locator: locator(type_id, unit_key),
            })
            .await
    }

    /// Remove all claims contributed by one source.
    pub async fn purge(&self, source_id: &str) -> CatalogResult<u64> {
        self.provider
            .delete(RowFilter::Source(source_id.to_string()))
            .await
    }

    /// Remove claims that expired more than the grace period ago. The only
    /// automatic eviction path: entries stay stale-but-present through the
    /// grace period so a transient refresh failure does not churn the
    /// catalog.
    pub async fn purge_expired(&self) -> CatalogResult<u64> {
        let cutoff = now().saturating_sub(self.grace_period.as_secs());
        let removed = self.provider.delete(RowFilter::ExpiredBefore(cutoff)).await?;
        if removed > 0 {
            debug!(removed, "purged expired catalog entries");
        }
        Ok(removed)
    }

    /// Remove claims whose source is no longer registered.
    pub async fn purge_orphans(&self, valid_source_ids: &[String]) -> CatalogResult<u64> {
        let removed = self
            .provider
            .delete(RowFilter::SourceNotIn(valid_source_ids.to_vec()))
            .await?;
        if removed > 0 {
            debug!(removed, "purged orphaned catalog entries");
        }
        Ok(removed)
    }

    /// All current claims for a unit, one entry per contributing source.
    /// Expired rows are excluded; duplicate rows from repeated refreshes
    /// collapse to the newest per source (highest row ID wins).
    pub async fn find(&self, type_id: &str, unit_key: &UnitKey) -> CatalogResult<Vec<CatalogEntry>> {
        let loc = locator(type_id, unit_key);
        let rows = self.provider.select(&loc, now()).await?;

        let mut newest: HashMap<String, CatalogRow> = HashMap::new();
        for row in rows {
            match newest.get(&row.entry.source_id) {
                Some(existing) if existing.row_id >= row.row_id => {}
                _ => {
                    newest.insert(row.entry.source_id.clone(), row);
                }
            }
        }
        Ok(newest.into_values().map(|row| row.entry).collect())
    }

    /// Whether the source still has a warm (non-expired) catalog.
    pub async fn has_entries(&self, source_id: &str) -> CatalogResult<bool> {
        self.provider.any_live(source_id, now()).await
    }
}
