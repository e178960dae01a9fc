//! # Source Factory
//!
//! Maps a source's kind to its cataloger and transport. The kind set is
//! closed; adding a source kind means adding an arm here, not discovering a
//! plugin at runtime. The trait is also the seam used to substitute
//! scripted capabilities in tests.

use std::sync::Arc;

use reqwest::Client;

use crate::cataloger::{Cataloger, HttpCataloger, LocalCataloger};
use crate::config::{TransportConfig, create_client};
use crate::descriptor::SourceKind;
use crate::error::SourceError;
use crate::source::ContentSource;
use crate::transport::{HttpTransport, LocalTransport, Transport};

/// Creates the capabilities backing a content source.
pub trait SourceFactory: Send + Sync {
    fn cataloger(&self, source: &ContentSource) -> Result<Arc<dyn Cataloger>, SourceError>;
    fn transport(&self, source: &ContentSource) -> Result<Arc<dyn Transport>, SourceError>;
}

/// Production factory for the built-in source kinds. All HTTP-backed
/// capabilities share one client.
pub struct DefaultSourceFactory {
    client: Client,
}

impl DefaultSourceFactory {
    pub fn new(config: &TransportConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: create_client(config)?,
        })
    }
}

impl SourceFactory for DefaultSourceFactory {
    fn cataloger(&self, source: &ContentSource) -> Result<Arc<dyn Cataloger>, SourceError> {
        Ok(match source.kind() {
            SourceKind::Http => Arc::new(HttpCataloger::new(self.client.clone())),
            SourceKind::Local => Arc::new(LocalCataloger::new()),
        })
    }

    fn transport(&self, source: &ContentSource) -> Result<Arc<dyn Transport>, SourceError> {
        Ok(match source.kind() {
            SourceKind::Http => Arc::new(HttpTransport::with_client(
                self.client.clone(),
                source.max_concurrent(),
            )),
            SourceKind::Local => Arc::new(LocalTransport::new()),
        })
    }
}
