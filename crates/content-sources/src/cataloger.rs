//! # Catalogers
//!
//! A cataloger inspects one source URL and records what the source can
//! supply. Sources publish a `manifest.json` listing their units; one
//! catalog entry is added per unit, stamped with the source's TTL.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::catalog::{CatalogStore, UnitKey};
use crate::error::SourceError;

pub const MANIFEST_NAME: &str = "manifest.json";

/// One unit listed in a source manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub type_id: String,
    pub unit_key: UnitKey,
    /// Unit location relative to the manifest's URL
    pub path: String,
}

/// Populates the catalog from one source URL.
#[async_trait]
pub trait Cataloger: Send + Sync {
    /// Index the source content under `url`, adding one catalog entry per
    /// unit. Returns the number of entries added.
    async fn refresh(
        &self,
        catalog: &CatalogStore,
        source_id: &str,
        expires: Duration,
        url: &Url,
    ) -> Result<u64, SourceError>;
}

async fn add_manifest(
    catalog: &CatalogStore,
    source_id: &str,
    expires: Duration,
    base: &Url,
    entries: Vec<ManifestEntry>,
) -> Result<u64, SourceError> {
    let mut added = 0;
    for entry in entries {
        let unit_url = base.join(entry.path.trim_start_matches('/'))?;
        catalog
            .add_entry(
                source_id,
                expires,
                &entry.type_id,
                &entry.unit_key,
                unit_url.as_str(),
            )
            .await?;
        added += 1;
    }
    debug!(source_id, added, url = %base, "catalog refreshed");
    Ok(added)
}

/// Cataloger for HTTP-indexed sources.
pub struct HttpCataloger {
    client: Client,
}

impl HttpCataloger {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Cataloger for HttpCataloger {
    async fn refresh(
        &self,
        catalog: &CatalogStore,
        source_id: &str,
        expires: Duration,
        url: &Url,
    ) -> Result<u64, SourceError> {
        let manifest_url = url.join(MANIFEST_NAME)?;
        let entries: Vec<ManifestEntry> = self
            .client
            .get(manifest_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        add_manifest(catalog, source_id, expires, url, entries).await
    }
}

/// Cataloger for filesystem-backed sources.
#[derive(Debug, Default)]
pub struct LocalCataloger;

impl LocalCataloger {
    pub fn new() -> Self {
        Self
    }

    fn to_dir(url: &Url) -> Result<PathBuf, SourceError> {
        if url.scheme() != "file" {
            return Err(SourceError::UrlError(format!(
                "local source requires a file:// base URL, got {url}"
            )));
        }
        Ok(PathBuf::from(url.path()))
    }
}

#[async_trait]
impl Cataloger for LocalCataloger {
    async fn refresh(
        &self,
        catalog: &CatalogStore,
        source_id: &str,
        expires: Duration,
        url: &Url,
    ) -> Result<u64, SourceError> {
        let manifest_path = Self::to_dir(url)?.join(MANIFEST_NAME);
        let text = tokio::fs::read_to_string(&manifest_path).await?;
        let entries: Vec<ManifestEntry> = serde_json::from_str(&text)
            .map_err(|e| SourceError::Generic(format!("invalid manifest {manifest_path:?}: {e}")))?;
        add_manifest(catalog, source_id, expires, url, entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_key(name: &str) -> UnitKey {
        UnitKey::from([("name".to_string(), name.to_string())])
    }

    #[tokio::test]
    async fn local_cataloger_indexes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = serde_json::to_string(&vec![
            ManifestEntry {
                type_id: "rpm".to_string(),
                unit_key: unit_key("bash"),
                path: "packages/bash.rpm".to_string(),
            },
            ManifestEntry {
                type_id: "rpm".to_string(),
                unit_key: unit_key("zsh"),
                path: "/packages/zsh.rpm".to_string(),
            },
        ])
        .unwrap();
        tokio::fs::write(dir.path().join(MANIFEST_NAME), manifest)
            .await
            .unwrap();

        let catalog = CatalogStore::in_memory();
        let base = Url::parse(&format!("file://{}/", dir.path().display())).unwrap();
        let added = LocalCataloger::new()
            .refresh(&catalog, "local-1", Duration::from_secs(600), &base)
            .await
            .unwrap();

        assert_eq!(added, 2);
        let found = catalog.find("rpm", &unit_key("bash")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].url.ends_with("packages/bash.rpm"));
    }

    #[tokio::test]
    async fn missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = CatalogStore::in_memory();
        let base = Url::parse(&format!("file://{}/", dir.path().display())).unwrap();
        let result = LocalCataloger::new()
            .refresh(&catalog, "local-1", Duration::from_secs(600), &base)
            .await;
        assert!(result.is_err());
    }
}
