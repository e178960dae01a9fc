//! # Download Requests
//!
//! A request asks for exactly one content unit. It collaborates with the
//! coordinator and the catalog: candidate sources are resolved up front and
//! consumed strictly forward as attempts fail, so a source is never offered
//! twice for the same request.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::{CatalogStore, UnitKey};
use crate::error::SourceError;
use crate::registry::SourceRegistry;
use crate::source::{ContentSource, PrimarySource};

/// Where a candidate's bytes would come from.
#[derive(Clone)]
pub enum CandidateSource {
    /// A catalog-matched alternate source
    Alternate(Arc<ContentSource>),
    /// The caller-supplied primary downloader, always the last resort
    Primary(PrimarySource),
}

impl CandidateSource {
    pub fn id(&self) -> &str {
        match self {
            CandidateSource::Alternate(source) => source.id(),
            CandidateSource::Primary(primary) => primary.id(),
        }
    }
}

/// One `(source, url)` pair a request may be satisfied from.
#[derive(Clone)]
pub struct Candidate {
    pub source: CandidateSource,
    pub url: String,
}

/// A download request for one content unit. Created by the caller, mutated
/// only by the coordinator during a single download call; afterwards the
/// caller inspects `downloaded` and `errors`.
pub struct Request {
    /// Content unit type ID
    pub type_id: String,
    /// Content unit key
    pub unit_key: UnitKey,
    /// URL used when downloading from the primary source
    pub url: String,
    /// Absolute path to store the downloaded file
    pub destination: PathBuf,
    /// Monotonic: set once when any candidate succeeds
    pub downloaded: bool,
    /// One failure reason per exhausted candidate
    pub errors: Vec<String>,
    candidates: VecDeque<Candidate>,
}

impl Request {
    pub fn new(
        type_id: impl Into<String>,
        unit_key: UnitKey,
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            type_id: type_id.into(),
            unit_key,
            url: url.into(),
            destination: destination.into(),
            downloaded: false,
            errors: Vec::new(),
            candidates: VecDeque::new(),
        }
    }

    /// Resolve the ordered candidate list: catalog-matched sources by
    /// ascending priority (ties broken by source ID), then the primary.
    /// A request with zero catalog matches still gets the primary, so every
    /// request is attempted at least once.
    pub async fn find_sources(
        &mut self,
        primary: &PrimarySource,
        registry: &SourceRegistry,
        catalog: &CatalogStore,
    ) -> Result<(), SourceError> {
        let mut matched: Vec<(Arc<ContentSource>, String)> = Vec::new();
        for entry in catalog.find(&self.type_id, &self.unit_key).await? {
            // a source that dropped out of the registry orphans its entries
            let Some(source) = registry.get(&entry.source_id) else {
                continue;
            };
            matched.push((Arc::clone(source), entry.url));
        }
        matched.sort_by(|(a, _), (b, _)| a.sort_key().cmp(&b.sort_key()));

        self.candidates = matched
            .into_iter()
            .map(|(source, url)| Candidate {
                source: CandidateSource::Alternate(source),
                url,
            })
            .collect();
        self.candidates.push_back(Candidate {
            source: CandidateSource::Primary(primary.clone()),
            url: self.url.clone(),
        });
        Ok(())
    }

    /// Peek the currently selected candidate without consuming it.
    pub fn current_source(&self) -> Option<&Candidate> {
        self.candidates.front()
    }

    /// Give up on the current candidate and move to the next.
    pub fn advance(&mut self) -> Option<Candidate> {
        self.candidates.pop_front()
    }

    /// Whether every candidate has been tried and failed.
    pub fn is_exhausted(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{SourceDescriptor, SourceKind};
    use crate::source::PRIMARY_ID;
    use crate::transport::{Transfer, TransferEvent, Transport};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn fetch(
            &self,
            _transfers: Vec<Transfer>,
            _events: mpsc::Sender<TransferEvent>,
            _cancel: CancellationToken,
        ) -> Result<(), SourceError> {
            Ok(())
        }
    }

    fn source(id: &str, priority: i32) -> ContentSource {
        ContentSource::new(
            id,
            SourceDescriptor {
                name: id.to_string(),
                kind: SourceKind::Http,
                enabled: true,
                priority,
                expires: "24h".to_string(),
                base_url: format!("https://{id}.example.com/"),
                paths: Vec::new(),
                max_concurrent: 10,
            },
        )
        .unwrap()
    }

    fn unit_key(name: &str) -> UnitKey {
        UnitKey::from([("name".to_string(), name.to_string())])
    }

    fn primary() -> PrimarySource {
        PrimarySource::new(Arc::new(NullTransport))
    }

    async fn seed(catalog: &CatalogStore, source_id: &str, name: &str) {
        catalog
            .add_entry(
                source_id,
                Duration::from_secs(600),
                "rpm",
                &unit_key(name),
                &format!("https://{source_id}.example.com/{name}.rpm"),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn candidates_ordered_by_priority_primary_last() {
        let catalog = CatalogStore::in_memory();
        seed(&catalog, "s2", "bash").await;
        seed(&catalog, "s1", "bash").await;
        let registry = SourceRegistry::from_sources([source("s1", 1), source("s2", 2)]);

        let mut request = Request::new("rpm", unit_key("bash"), "https://primary/bash.rpm", "/tmp/bash.rpm");
        request
            .find_sources(&primary(), &registry, &catalog)
            .await
            .unwrap();

        let order: Vec<_> = request.candidates.iter().map(|c| c.source.id()).collect();
        assert_eq!(order, ["s1", "s2", PRIMARY_ID]);
    }

    #[tokio::test]
    async fn equal_priority_breaks_ties_by_id() {
        let catalog = CatalogStore::in_memory();
        seed(&catalog, "zeta", "bash").await;
        seed(&catalog, "alpha", "bash").await;
        let registry = SourceRegistry::from_sources([source("zeta", 1), source("alpha", 1)]);

        let mut request = Request::new("rpm", unit_key("bash"), "https://primary/bash.rpm", "/tmp/bash.rpm");
        request
            .find_sources(&primary(), &registry, &catalog)
            .await
            .unwrap();

        let order: Vec<_> = request.candidates.iter().map(|c| c.source.id()).collect();
        assert_eq!(order, ["alpha", "zeta", PRIMARY_ID]);
    }

    #[tokio::test]
    async fn no_catalog_match_still_gets_primary() {
        let catalog = CatalogStore::in_memory();
        let registry = SourceRegistry::default();

        let mut request = Request::new("rpm", unit_key("bash"), "https://primary/bash.rpm", "/tmp/bash.rpm");
        request
            .find_sources(&primary(), &registry, &catalog)
            .await
            .unwrap();

        assert_eq!(request.candidates.len(), 1);
        assert_eq!(request.current_source().unwrap().source.id(), PRIMARY_ID);
        assert_eq!(request.current_source().unwrap().url, "https://primary/bash.rpm");
    }

    #[tokio::test]
    async fn unregistered_source_entries_are_ignored() {
        let catalog = CatalogStore::in_memory();
        seed(&catalog, "gone", "bash").await;
        seed(&catalog, "s1", "bash").await;
        let registry = SourceRegistry::from_sources([source("s1", 1)]);

        let mut request = Request::new("rpm", unit_key("bash"), "https://primary/bash.rpm", "/tmp/bash.rpm");
        request
            .find_sources(&primary(), &registry, &catalog)
            .await
            .unwrap();

        let order: Vec<_> = request.candidates.iter().map(|c| c.source.id()).collect();
        assert_eq!(order, ["s1", PRIMARY_ID]);
    }

    #[tokio::test]
    async fn cursor_is_forward_only() {
        let catalog = CatalogStore::in_memory();
        seed(&catalog, "s1", "bash").await;
        let registry = SourceRegistry::from_sources([source("s1", 1)]);

        let mut request = Request::new("rpm", unit_key("bash"), "https://primary/bash.rpm", "/tmp/bash.rpm");
        request
            .find_sources(&primary(), &registry, &catalog)
            .await
            .unwrap();

        assert_eq!(request.current_source().unwrap().source.id(), "s1");
        request.advance();
        assert_eq!(request.current_source().unwrap().source.id(), PRIMARY_ID);
        request.advance();
        assert!(request.is_exhausted());
        assert!(request.current_source().is_none());
    }
}
