//! # Memory Catalog
//!
//! In-memory catalog backend. Used on its own when no catalog path is
//! configured, and as the table behind the file backend.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::catalog::types::{CatalogResult, CatalogRow, RowFilter};

use super::CatalogProvider;

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    rows: RwLock<Vec<CatalogRow>>,
    next_id: AtomicU64,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table with previously persisted rows.
    pub(crate) fn with_rows(rows: Vec<CatalogRow>) -> Self {
        let next = rows.iter().map(|r| r.row_id + 1).max().unwrap_or(0);
        Self {
            rows: RwLock::new(rows),
            next_id: AtomicU64::new(next),
        }
    }

    /// Snapshot of all rows, in insertion order.
    pub(crate) fn snapshot(&self) -> Vec<CatalogRow> {
        self.rows.read().clone()
    }
}

#[async_trait]
impl CatalogProvider for MemoryCatalog {
    async fn insert(&self, row: CatalogRow) -> CatalogResult<()> {
        self.rows.write().push(row);
        Ok(())
    }

    async fn delete(&self, filter: RowFilter) -> CatalogResult<u64> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|row| !filter.matches(row));
        Ok((before - rows.len()) as u64)
    }

    async fn select(&self, locator: &str, now: u64) -> CatalogResult<Vec<CatalogRow>> {
        let rows = self.rows.read();
        Ok(rows
            .iter()
            .filter(|row| row.entry.locator == locator && row.entry.expiration > now)
            .cloned()
            .collect())
    }

    async fn any_live(&self, source_id: &str, now: u64) -> CatalogResult<bool> {
        let rows = self.rows.read();
        Ok(rows
            .iter()
            .any(|row| row.entry.source_id == source_id && row.entry.expiration > now))
    }

    fn next_row_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{CatalogEntry, UnitKey, locator};

    fn row(provider: &MemoryCatalog, source_id: &str, loc: &str, expiration: u64) -> CatalogRow {
        CatalogRow {
            row_id: provider.next_row_id(),
            entry: CatalogEntry {
                source_id: source_id.to_string(),
                expiration,
                locator: loc.to_string(),
                unit_key: UnitKey::new(),
                url: format!("http://{source_id}/unit"),
            },
        }
    }

    #[tokio::test]
    async fn select_skips_expired_rows() {
        let catalog = MemoryCatalog::new();
        let loc = locator("rpm", &UnitKey::new());
        catalog.insert(row(&catalog, "s1", &loc, 100)).await.unwrap();
        catalog.insert(row(&catalog, "s2", &loc, 300)).await.unwrap();

        let live = catalog.select(&loc, 200).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].entry.source_id, "s2");
    }

    #[tokio::test]
    async fn delete_is_filtered() {
        let catalog = MemoryCatalog::new();
        catalog.insert(row(&catalog, "s1", "a", 100)).await.unwrap();
        catalog.insert(row(&catalog, "s1", "b", 100)).await.unwrap();
        catalog.insert(row(&catalog, "s2", "a", 100)).await.unwrap();

        let removed = catalog
            .delete(RowFilter::Source("s1".to_string()))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(catalog.any_live("s2", 0).await.unwrap());
        assert!(!catalog.any_live("s1", 0).await.unwrap());
    }

    #[tokio::test]
    async fn row_ids_are_monotonic() {
        let catalog = MemoryCatalog::new();
        let first = catalog.next_row_id();
        let second = catalog.next_row_id();
        assert!(second > first);
    }
}
