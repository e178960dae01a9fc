//! # Catalog Types
//!
//! Common types used across the catalog storage layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::SourceError;

/// The unit key of a content unit. Keys iterate in sorted order, which is
/// what makes the locator digest independent of caller insertion order.
pub type UnitKey = BTreeMap<String, String>;

/// A claim made by a content source that it can supply a content unit.
///
/// Entries are append-only: a refresh adds new rows and read-time logic
/// collapses duplicates to the newest row per source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// ID of the contributing content source
    pub source_id: String,
    /// Epoch seconds after which the entry is ignored
    pub expiration: u64,
    /// Digest identifying the content unit (see [`locator`])
    pub locator: String,
    /// The unit key, echoed for convenience
    pub unit_key: UnitKey,
    /// Remote download location claimed by the source
    pub url: String,
}

/// A physical catalog row. Wraps a [`CatalogEntry`] with the insertion-order
/// row ID used as the newest-wins tie-break.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRow {
    pub row_id: u64,
    #[serde(flatten)]
    pub entry: CatalogEntry,
}

/// Filter for atomic bulk deletes. A single filtered delete avoids
/// read-then-delete races between concurrent purges.
#[derive(Debug, Clone)]
pub enum RowFilter {
    /// All rows contributed by one source
    Source(String),
    /// All rows for one unit of one source
    Unit { source_id: String, locator: String },
    /// Rows whose expiration is older than the given epoch seconds
    ExpiredBefore(u64),
    /// Rows whose source is not in the given set
    SourceNotIn(Vec<String>),
}

impl RowFilter {
    /// Whether the filter matches the given row.
    pub fn matches(&self, row: &CatalogRow) -> bool {
        match self {
            RowFilter::Source(id) => row.entry.source_id == *id,
            RowFilter::Unit { source_id, locator } => {
                row.entry.source_id == *source_id && row.entry.locator == *locator
            }
            RowFilter::ExpiredBefore(cutoff) => row.entry.expiration < *cutoff,
            RowFilter::SourceNotIn(ids) => !ids.contains(&row.entry.source_id),
        }
    }
}

/// Configuration for the catalog store
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Path of the persisted catalog file. When `None` the catalog lives
    /// in memory only.
    pub path: Option<PathBuf>,
    /// Extra time an expired entry is tolerated before physical deletion
    pub grace_period: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            grace_period: Duration::from_secs(3600),
        }
    }
}

/// Result of a catalog storage operation
pub type CatalogResult<T> = std::result::Result<T, SourceError>;

/// Compute the locator digest for a content unit.
///
/// The digest is stable across callers: the unit key is consumed in sorted
/// key order, so identical `(type_id, unit_key)` pairs always produce the
/// same locator regardless of how the mapping was built.
pub fn locator(type_id: &str, unit_key: &UnitKey) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(type_id.as_bytes());
    for (key, value) in unit_key {
        hasher.update(b"\x1f");
        hasher.update(key.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(value.as_bytes());
    }

    let hash = hasher.finalize();
    format!("{hash:x}")
}

/// Current time as epoch seconds.
pub(crate) fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_key(pairs: &[(&str, &str)]) -> UnitKey {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn locator_is_order_independent() {
        let forward = unit_key(&[("name", "bash"), ("version", "5.2"), ("arch", "x86_64")]);
        let reversed = unit_key(&[("arch", "x86_64"), ("version", "5.2"), ("name", "bash")]);
        assert_eq!(locator("rpm", &forward), locator("rpm", &reversed));
    }

    #[test]
    fn locator_differs_by_type() {
        let key = unit_key(&[("name", "bash")]);
        assert_ne!(locator("rpm", &key), locator("deb", &key));
    }

    #[test]
    fn locator_differs_by_key() {
        let bash = unit_key(&[("name", "bash")]);
        let zsh = unit_key(&[("name", "zsh")]);
        assert_ne!(locator("rpm", &bash), locator("rpm", &zsh));
    }

    #[test]
    fn locator_separates_fields() {
        // "ab"+"c" must not collide with "a"+"bc"
        let one = unit_key(&[("ab", "c")]);
        let two = unit_key(&[("a", "bc")]);
        assert_ne!(locator("rpm", &one), locator("rpm", &two));
    }
}
