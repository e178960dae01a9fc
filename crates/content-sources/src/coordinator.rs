//! # Coordinator
//!
//! Orchestrates catalog refresh and multi-source download dispatch. One
//! `download()` call drives sequential refresh -> collate -> dispatch loops:
//! pending requests are grouped by their currently selected source, each
//! group goes to that source's transport as a single batched call, and
//! failed requests fall through to their next candidate on the following
//! pass. The retry bound is the finite candidate list per request; no
//! retry counters exist and a source is never retried for the same request.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::catalog::CatalogStore;
use crate::config::CoordinatorConfig;
use crate::error::SourceError;
use crate::factory::{DefaultSourceFactory, SourceFactory};
use crate::listener::{EventBridge, Listener};
use crate::registry::SourceRegistry;
use crate::report::{DownloadReport, RefreshReport};
use crate::request::{CandidateSource, Request};
use crate::source::PrimarySource;
use crate::transport::{Transfer, Transport};

pub struct Coordinator {
    registry: SourceRegistry,
    catalog: CatalogStore,
    factory: Arc<dyn SourceFactory>,
}

impl Coordinator {
    /// Load source descriptors and open the catalog store.
    pub async fn new(config: CoordinatorConfig) -> Result<Self, SourceError> {
        let registry = SourceRegistry::load(config.sources_path.as_deref())?;
        let catalog = CatalogStore::open(config.catalog.clone()).await?;
        let factory = Arc::new(DefaultSourceFactory::new(&config.transport)?);
        Ok(Self {
            registry,
            catalog,
            factory,
        })
    }

    /// Assemble a coordinator from already-built parts.
    pub fn with_parts(
        registry: SourceRegistry,
        catalog: CatalogStore,
        factory: Arc<dyn SourceFactory>,
    ) -> Self {
        Self {
            registry,
            catalog,
            factory,
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Download files using available alternate content sources.
    ///
    /// Each request is attempted against its candidate sources in priority
    /// order, with `primary` as the last resort. Requests are mutated in
    /// place: afterwards the caller checks `downloaded` and `errors` per
    /// request. Exhausting every candidate is not an error; storage
    /// failures are.
    ///
    /// Cancellation is cooperative: once `cancel` fires, no new batches are
    /// dispatched and in-flight transports are signalled, but whatever
    /// already downloaded stays downloaded.
    pub async fn download(
        &self,
        primary: Arc<dyn Transport>,
        requests: &mut [Request],
        listener: Option<Arc<dyn Listener>>,
        cancel: &CancellationToken,
    ) -> Result<DownloadReport, SourceError> {
        // refresh once per call, not per request
        self.refresh(false, cancel).await?;

        let primary = PrimarySource::new(primary);
        for request in requests.iter_mut() {
            request
                .find_sources(&primary, &self.registry, &self.catalog)
                .await?;
        }

        let mut report = DownloadReport {
            total_sources: self.registry.len(),
            ..DownloadReport::default()
        };

        while !cancel.is_cancelled() {
            let groups = collate(requests);
            if groups.is_empty() {
                break;
            }
            report.total_passes += 1;
            debug!(pass = report.total_passes, sources = groups.len(), "dispatching");

            for (source_id, (source, ids)) in groups {
                if cancel.is_cancelled() {
                    break;
                }
                let bridge = self
                    .dispatch(&source, &ids, requests, listener.clone(), cancel)
                    .await;
                let details = report.downloads.entry(source_id).or_default();
                details.total_succeeded += bridge.total_succeeded;
                details.total_failed += bridge.total_failed;
            }
        }
        Ok(report)
    }

    /// Run one batched transfer against one source and fold the transfer
    /// events back into the requests.
    async fn dispatch(
        &self,
        source: &CandidateSource,
        ids: &[usize],
        requests: &mut [Request],
        listener: Option<Arc<dyn Listener>>,
        cancel: &CancellationToken,
    ) -> EventBridge {
        let mut bridge = EventBridge::new(cancel.clone(), listener);

        let transport = match source {
            CandidateSource::Alternate(source) => match self.factory.transport(source) {
                Ok(transport) => transport,
                Err(e) => {
                    // the whole group falls through to its next candidates
                    bridge.fail_unsettled(ids, &e.to_string(), requests);
                    return bridge;
                }
            },
            CandidateSource::Primary(primary) => primary.downloader(),
        };

        let transfers: Vec<Transfer> = ids
            .iter()
            .filter_map(|&id| {
                let request = &requests[id];
                request.current_source().map(|candidate| Transfer {
                    id,
                    url: candidate.url.clone(),
                    destination: request.destination.clone(),
                })
            })
            .collect();

        let (events_tx, mut events_rx) = mpsc::channel(32);
        let fetch = transport.fetch(transfers, events_tx, cancel.clone());
        let apply = async {
            while let Some(event) = events_rx.recv().await {
                bridge.handle(event, requests);
            }
        };
        let (fetched, ()) = tokio::join!(fetch, apply);

        if let Err(e) = fetched {
            warn!(source_id = source.id(), error = %e, "batched transfer aborted");
            bridge.fail_unsettled(ids, &e.to_string(), requests);
        }
        bridge
    }

    /// Refresh the content catalog using the loaded sources.
    ///
    /// A source with a warm catalog is skipped unless `force` is set. One
    /// source failing is contained in its report and does not stop the
    /// rest. Expired entries are purged once at the end, unless refresh was
    /// cancelled mid-loop.
    pub async fn refresh(
        &self,
        force: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<RefreshReport>, SourceError> {
        let mut reports = Vec::new();
        for source in self.registry.iter() {
            if cancel.is_cancelled() {
                return Ok(reports);
            }
            if !force && self.catalog.has_entries(source.id()).await? {
                continue;
            }
            reports.extend(
                source
                    .refresh(&self.catalog, self.factory.as_ref(), cancel)
                    .await,
            );
        }
        // eviction failure must not take down an otherwise healthy call
        if let Err(e) = self.catalog.purge_expired().await {
            warn!(error = %e, "purge of expired catalog entries failed");
        }
        Ok(reports)
    }

    /// Purge catalog entries contributed by sources that no longer exist.
    pub async fn purge_orphans(&self) -> Result<u64, SourceError> {
        self.catalog.purge_orphans(&self.registry.ids()).await
    }
}

/// Group the not-yet-downloaded requests by their currently selected
/// source. Exhausted requests drop out silently; their accumulated errors
/// stay behind for the caller.
fn collate(requests: &[Request]) -> BTreeMap<String, (CandidateSource, Vec<usize>)> {
    let mut groups: BTreeMap<String, (CandidateSource, Vec<usize>)> = BTreeMap::new();
    for (id, request) in requests.iter().enumerate() {
        if request.downloaded {
            continue;
        }
        let Some(candidate) = request.current_source() else {
            continue;
        };
        groups
            .entry(candidate.source.id().to_string())
            .or_insert_with(|| (candidate.source.clone(), Vec::new()))
            .1
            .push(id);
    }
    groups
}
