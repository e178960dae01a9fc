//! # Content Sources
//!
//! A library for downloading content units from alternate content sources
//! with fallback to a primary origin, backed by a TTL-based catalog of what
//! each source claims to provide.
//!
//! ## Features
//!
//! - Priority-ordered fallback across alternate sources, primary always last
//! - Persistent content catalog with expiration and grace-period eviction
//! - Batched dispatch: requests sharing a winning source download together
//! - Cooperative cancellation across an in-flight batch of transfers
//! - Closed set of source kinds constructed from TOML descriptors

pub mod catalog;
pub mod cataloger;
pub mod config;
pub mod coordinator;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod listener;
pub mod registry;
pub mod report;
pub mod request;
pub mod source;
pub mod transport;

pub use catalog::{CatalogConfig, CatalogEntry, CatalogStore, UnitKey, locator};
pub use cataloger::{Cataloger, HttpCataloger, LocalCataloger, ManifestEntry};
pub use config::{CoordinatorConfig, TransportConfig, create_client};
pub use coordinator::Coordinator;
pub use descriptor::{SourceDescriptor, SourceKind, parse_duration};
pub use error::SourceError;
pub use factory::{DefaultSourceFactory, SourceFactory};
pub use listener::Listener;
pub use registry::{DEFAULT_SOURCES_PATH, SourceRegistry};
pub use report::{DownloadDetails, DownloadReport, RefreshReport};
pub use request::{Candidate, CandidateSource, Request};
pub use source::{ContentSource, PRIMARY_ID, PrimarySource};
pub use transport::{HttpTransport, LocalTransport, Transfer, TransferEvent, Transport};
