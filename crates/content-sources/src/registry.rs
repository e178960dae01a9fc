//! # Source Registry
//!
//! Loads content source descriptors from a directory of TOML files into
//! named, orderable sources. Disabled and invalid sources are skipped with
//! a log line rather than failing the load; a broken descriptor file must
//! not take down every other source.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::descriptor::parse_descriptors;
use crate::error::SourceError;
use crate::source::ContentSource;

/// Default descriptor directory.
pub const DEFAULT_SOURCES_PATH: &str = "/etc/content/sources.d";

#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, Arc<ContentSource>>,
}

impl SourceRegistry {
    /// Load all enabled sources from descriptor files under `path` (or the
    /// platform default). A missing directory yields an empty registry.
    pub fn load(path: Option<&Path>) -> Result<Self, SourceError> {
        let dir = path.unwrap_or(Path::new(DEFAULT_SOURCES_PATH));
        let mut registry = Self::default();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %dir.display(), "sources directory not found");
                return Ok(registry);
            }
            Err(e) => return Err(SourceError::IoError(e)),
        };

        for entry in entries {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "toml") {
                continue;
            }
            let text = std::fs::read_to_string(&path)?;
            let descriptors = match parse_descriptors(&text) {
                Ok(descriptors) => descriptors,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping descriptor file");
                    continue;
                }
            };
            for (id, descriptor) in descriptors {
                if !descriptor.enabled {
                    debug!(source_id = %id, "source disabled");
                    continue;
                }
                match ContentSource::new(id.clone(), descriptor) {
                    Ok(source) => registry.insert(source),
                    Err(e) => warn!(source_id = %id, error = %e, "skipping invalid source"),
                }
            }
        }
        debug!(count = registry.len(), "loaded content sources");
        Ok(registry)
    }

    /// Build a registry from already-constructed sources.
    pub fn from_sources(sources: impl IntoIterator<Item = ContentSource>) -> Self {
        let mut registry = Self::default();
        for source in sources {
            registry.insert(source);
        }
        registry
    }

    pub fn insert(&mut self, source: ContentSource) {
        self.sources.insert(source.id().to_string(), Arc::new(source));
    }

    pub fn get(&self, source_id: &str) -> Option<&Arc<ContentSource>> {
        self.sources.get(source_id)
    }

    /// IDs of all registered sources, used to purge catalog orphans.
    pub fn ids(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }

    /// Sources in stable (ID) order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ContentSource>> {
        self.sources.values()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"
        [unit-world]
        name = "Unit World"
        kind = "http"
        priority = 1
        base_url = "https://unit-world.example.com/content/"

        [disabled-source]
        name = "Disabled"
        kind = "http"
        enabled = false
        base_url = "https://disabled.example.com/"
    "#;

    const INVALID: &str = r#"
        [broken]
        name = "Broken"
        kind = "http"
        expires = "10w"
        base_url = "https://broken.example.com/"
    "#;

    #[test]
    fn loads_enabled_sources_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sources.toml"), GOOD).unwrap();
        std::fs::write(dir.path().join("ignored.conf"), "not toml").unwrap();

        let registry = SourceRegistry::load(Some(dir.path())).unwrap();
        assert_eq!(registry.ids(), ["unit-world"]);
        assert_eq!(registry.get("unit-world").unwrap().priority(), 1);
    }

    #[test]
    fn invalid_source_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), GOOD).unwrap();
        std::fs::write(dir.path().join("bad.toml"), INVALID).unwrap();

        let registry = SourceRegistry::load(Some(dir.path())).unwrap();
        assert_eq!(registry.ids(), ["unit-world"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let registry = SourceRegistry::load(Some(Path::new("/nonexistent/sources.d"))).unwrap();
        assert!(registry.is_empty());
    }
}
