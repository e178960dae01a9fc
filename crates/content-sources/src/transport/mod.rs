//! # Transport
//!
//! The capability interface used to move a batch of files. A transport is
//! handed the full batch collated for one source and reports per-transfer
//! progress over a channel; it decides its own internal concurrency.

pub mod http;
pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;

pub use http::HttpTransport;
pub use local::LocalTransport;

/// One file movement within a batch. `id` is opaque to the transport and
/// echoed back in every event for that transfer.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub id: usize,
    pub url: String,
    pub destination: PathBuf,
}

/// Per-transfer notifications emitted by a transport while a batch runs.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    Started { id: usize },
    Succeeded { id: usize },
    Failed { id: usize, error: String },
}

impl TransferEvent {
    pub fn id(&self) -> usize {
        match self {
            TransferEvent::Started { id }
            | TransferEvent::Succeeded { id }
            | TransferEvent::Failed { id, .. } => *id,
        }
    }
}

/// A capability that downloads a batch of files.
///
/// Contract: every transfer that is started MUST end in exactly one
/// `Succeeded` or `Failed` event. Transfers not yet started when the token
/// is cancelled may be skipped silently. An `Err` return covers transfers
/// the transport could not account for; the caller fails those itself.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(
        &self,
        transfers: Vec<Transfer>,
        events: mpsc::Sender<TransferEvent>,
        cancel: CancellationToken,
    ) -> Result<(), SourceError>;
}

/// Prepare the destination's parent directory.
pub(crate) async fn ensure_parent(destination: &std::path::Path) -> std::io::Result<()> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}
