//! # Catalog Provider
//!
//! Defines the storage trait that all catalog backends implement.

use async_trait::async_trait;

use crate::catalog::types::{CatalogResult, CatalogRow, RowFilter};

/// A trait for catalog backends that can store and query claim rows
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Append a row. Rows are never updated in place.
    async fn insert(&self, row: CatalogRow) -> CatalogResult<()>;

    /// Delete all rows matching the filter in one atomic step.
    /// Returns the number of rows removed.
    async fn delete(&self, filter: RowFilter) -> CatalogResult<u64>;

    /// All rows for the given locator whose expiration is after `now`.
    async fn select(&self, locator: &str, now: u64) -> CatalogResult<Vec<CatalogRow>>;

    /// Whether at least one non-expired row exists for the source.
    async fn any_live(&self, source_id: &str, now: u64) -> CatalogResult<bool>;

    /// Reserve the next insertion-order row ID.
    fn next_row_id(&self) -> u64;
}
