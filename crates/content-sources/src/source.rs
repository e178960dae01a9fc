//! # Content Sources
//!
//! A content source is an alternate origin that may supply a content unit
//! instead of the primary origin. Sources are constructed once per
//! coordinator run from on-disk descriptors and are immutable afterwards.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::catalog::CatalogStore;
use crate::descriptor::{SourceDescriptor, SourceKind};
use crate::error::SourceError;
use crate::factory::SourceFactory;
use crate::report::RefreshReport;
use crate::transport::Transport;

/// Reserved source ID for the caller-supplied primary downloader.
pub const PRIMARY_ID: &str = "___primary___";

/// An alternate content source backed by a descriptor.
#[derive(Debug, Clone)]
pub struct ContentSource {
    id: String,
    descriptor: SourceDescriptor,
    expires: Duration,
}

impl ContentSource {
    /// Build a source from its descriptor, rejecting invalid descriptors.
    pub fn new(id: impl Into<String>, descriptor: SourceDescriptor) -> Result<Self, SourceError> {
        let id = id.into();
        descriptor.validate(&id)?;
        let expires = descriptor.expires()?;
        Ok(Self {
            id,
            descriptor,
            expires,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> SourceKind {
        self.descriptor.kind
    }

    /// Lower priority is tried first.
    pub fn priority(&self) -> i32 {
        self.descriptor.priority
    }

    /// TTL stamped on catalog entries this source contributes.
    pub fn expires(&self) -> Duration {
        self.expires
    }

    pub fn max_concurrent(&self) -> usize {
        self.descriptor.max_concurrent
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    /// Ordering key for candidate resolution: priority, then source ID for
    /// a deterministic tie-break.
    pub fn sort_key(&self) -> (i32, &str) {
        (self.priority(), self.id())
    }

    /// Re-index this source into the catalog, one report per source URL.
    /// Failures are contained per URL; refresh of the remaining URLs
    /// continues.
    pub async fn refresh(
        &self,
        catalog: &CatalogStore,
        factory: &dyn SourceFactory,
        cancel: &CancellationToken,
    ) -> Vec<RefreshReport> {
        let mut reports = Vec::new();
        let urls = match self.descriptor.urls() {
            Ok(urls) => urls,
            Err(e) => {
                let mut report = RefreshReport::new(&self.id, &self.descriptor.base_url);
                report.errors.push(e.to_string());
                return vec![report];
            }
        };
        let cataloger = match factory.cataloger(self) {
            Ok(cataloger) => cataloger,
            Err(e) => {
                let mut report = RefreshReport::new(&self.id, &self.descriptor.base_url);
                report.errors.push(e.to_string());
                return vec![report];
            }
        };
        for url in urls {
            if cancel.is_cancelled() {
                break;
            }
            let mut report = RefreshReport::new(&self.id, url.as_str());
            info!(source_id = %self.id, url = %url, "refreshing");
            match cataloger.refresh(catalog, &self.id, self.expires, &url).await {
                Ok(added) => {
                    info!(source_id = %self.id, added, "refresh succeeded");
                    report.succeeded = true;
                    report.added_count = added;
                }
                Err(e) => {
                    error!(source_id = %self.id, url = %url, error = %e, "refresh failed");
                    report.errors.push(e.to_string());
                }
            }
            reports.push(report);
        }
        reports
    }
}

/// The caller-supplied default downloader, wrapped so it can participate in
/// candidate ordering. Always sorts last, has no catalog entries and is
/// never refreshed or purged.
#[derive(Clone)]
pub struct PrimarySource {
    transport: Arc<dyn Transport>,
}

impl PrimarySource {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn id(&self) -> &'static str {
        PRIMARY_ID
    }

    pub fn downloader(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }
}
