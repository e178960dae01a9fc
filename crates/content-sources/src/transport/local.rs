//! # Local Transport
//!
//! Copies units from a filesystem-backed source. Transfer URLs are
//! `file://` URLs or plain paths.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;

use super::{Transfer, TransferEvent, Transport, ensure_parent};

#[derive(Debug, Default)]
pub struct LocalTransport;

impl LocalTransport {
    pub fn new() -> Self {
        Self
    }

    fn to_path(url: &str) -> Result<PathBuf, SourceError> {
        if let Some(stripped) = url.strip_prefix("file://") {
            Ok(PathBuf::from(stripped))
        } else if url.contains("://") {
            Err(SourceError::UrlError(format!(
                "unsupported scheme for local transport: {url}"
            )))
        } else {
            Ok(PathBuf::from(url))
        }
    }

    async fn copy_one(transfer: &Transfer) -> Result<(), SourceError> {
        let path = Self::to_path(&transfer.url)?;
        ensure_parent(&transfer.destination).await?;
        tokio::fs::copy(&path, &transfer.destination).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Transport for LocalTransport {
    async fn fetch(
        &self,
        transfers: Vec<Transfer>,
        events: mpsc::Sender<TransferEvent>,
        cancel: CancellationToken,
    ) -> Result<(), SourceError> {
        for transfer in transfers {
            if cancel.is_cancelled() {
                break;
            }
            let _ = events.send(TransferEvent::Started { id: transfer.id }).await;
            let event = match Self::copy_one(&transfer).await {
                Ok(()) => TransferEvent::Succeeded { id: transfer.id },
                Err(e) => TransferEvent::Failed {
                    id: transfer.id,
                    error: e.to_string(),
                },
            };
            let _ = events.send(event).await;
        }
        Ok(())
    }
}
