//! # Content Catalog
//!
//! The persisted index of claims made by content sources about which units
//! they can supply and where.

pub mod providers;
pub mod store;
pub mod types;

pub use providers::{CatalogProvider, FileCatalog, MemoryCatalog};
pub use store::CatalogStore;
pub use types::{CatalogConfig, CatalogEntry, UnitKey, locator};
