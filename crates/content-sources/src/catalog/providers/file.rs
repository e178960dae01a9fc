//! # File Catalog
//!
//! Persistent catalog backend. The table is held in memory and flushed to a
//! JSON file after every mutation, written to a temp file and renamed into
//! place so readers never observe a partial catalog.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::catalog::types::{CatalogResult, CatalogRow, RowFilter};
use crate::error::SourceError;

use super::CatalogProvider;
use super::memory::MemoryCatalog;

pub struct FileCatalog {
    path: PathBuf,
    table: MemoryCatalog,
}

impl FileCatalog {
    /// Open the catalog file, loading any previously persisted rows.
    /// A missing file starts an empty catalog.
    pub async fn open(path: PathBuf) -> CatalogResult<Self> {
        let rows = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<CatalogRow>>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(SourceError::IoError(e)),
        };
        debug!(path = %path.display(), rows = rows.len(), "opened catalog");
        Ok(Self {
            path,
            table: MemoryCatalog::with_rows(rows),
        })
    }

    async fn flush(&self) -> CatalogResult<()> {
        let rows = self.table.snapshot();
        let bytes = serde_json::to_vec(&rows)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogProvider for FileCatalog {
    async fn insert(&self, row: CatalogRow) -> CatalogResult<()> {
        self.table.insert(row).await?;
        self.flush().await
    }

    async fn delete(&self, filter: RowFilter) -> CatalogResult<u64> {
        let removed = self.table.delete(filter).await?;
        if removed > 0 {
            self.flush().await?;
        }
        Ok(removed)
    }

    async fn select(&self, locator: &str, now: u64) -> CatalogResult<Vec<CatalogRow>> {
        self.table.select(locator, now).await
    }

    async fn any_live(&self, source_id: &str, now: u64) -> CatalogResult<bool> {
        self.table.any_live(source_id, now).await
    }

    fn next_row_id(&self) -> u64 {
        self.table.next_row_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{CatalogEntry, UnitKey};

    fn row(provider: &FileCatalog, source_id: &str, loc: &str) -> CatalogRow {
        CatalogRow {
            row_id: provider.next_row_id(),
            entry: CatalogEntry {
                source_id: source_id.to_string(),
                expiration: u64::MAX,
                locator: loc.to_string(),
                unit_key: UnitKey::new(),
                url: format!("http://{source_id}/unit"),
            },
        }
    }

    #[tokio::test]
    async fn rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let catalog = FileCatalog::open(path.clone()).await.unwrap();
        let inserted = row(&catalog, "s1", "abc");
        catalog.insert(inserted).await.unwrap();
        drop(catalog);

        let reopened = FileCatalog::open(path).await.unwrap();
        let rows = reopened.select("abc", 0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entry.source_id, "s1");
    }

    #[tokio::test]
    async fn row_ids_continue_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let catalog = FileCatalog::open(path.clone()).await.unwrap();
        let first = row(&catalog, "s1", "abc");
        let first_id = first.row_id;
        catalog.insert(first).await.unwrap();
        drop(catalog);

        let reopened = FileCatalog::open(path).await.unwrap();
        assert!(reopened.next_row_id() > first_id);
    }

    #[tokio::test]
    async fn delete_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let catalog = FileCatalog::open(path.clone()).await.unwrap();
        let inserted = row(&catalog, "s1", "abc");
        catalog.insert(inserted).await.unwrap();
        catalog
            .delete(RowFilter::Source("s1".to_string()))
            .await
            .unwrap();
        drop(catalog);

        let reopened = FileCatalog::open(path).await.unwrap();
        assert!(reopened.select("abc", 0).await.unwrap().is_empty());
    }
}
