//! # HTTP Transport
//!
//! Streams each transfer to disk with reqwest. Transfers within one batch
//! run concurrently up to the source's `max_concurrent`.

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{TransportConfig, create_client};
use crate::error::SourceError;

use super::{Transfer, TransferEvent, Transport, ensure_parent};

pub struct HttpTransport {
    client: Client,
    max_concurrent: usize,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig, max_concurrent: usize) -> Result<Self, SourceError> {
        Ok(Self::with_client(create_client(config)?, max_concurrent))
    }

    /// Build on an existing client so transports for many sources share one
    /// connection pool.
    pub fn with_client(client: Client, max_concurrent: usize) -> Self {
        Self {
            client,
            max_concurrent: max_concurrent.max(1),
        }
    }

    async fn fetch_one(&self, transfer: &Transfer) -> Result<(), SourceError> {
        let response = self
            .client
            .get(&transfer.url)
            .send()
            .await?
            .error_for_status()?;

        ensure_parent(&transfer.destination).await?;
        let mut file = tokio::fs::File::create(&transfer.destination).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn fetch(
        &self,
        transfers: Vec<Transfer>,
        events: mpsc::Sender<TransferEvent>,
        cancel: CancellationToken,
    ) -> Result<(), SourceError> {
        futures::stream::iter(transfers)
            .for_each_concurrent(self.max_concurrent, |transfer| {
                let events = events.clone();
                let cancel = cancel.clone();
                async move {
                    // not yet started, skip silently once cancelled
                    if cancel.is_cancelled() {
                        return;
                    }
                    let _ = events.send(TransferEvent::Started { id: transfer.id }).await;
                    let outcome = tokio::select! {
                        _ = cancel.cancelled() => {
                            Err(SourceError::Generic("transfer canceled".to_string()))
                        }
                        result = self.fetch_one(&transfer) => result,
                    };
                    let event = match outcome {
                        Ok(()) => {
                            debug!(url = %transfer.url, "transfer complete");
                            TransferEvent::Succeeded { id: transfer.id }
                        }
                        Err(e) => TransferEvent::Failed {
                            id: transfer.id,
                            error: e.to_string(),
                        },
                    };
                    let _ = events.send(event).await;
                }
            })
            .await;
        Ok(())
    }
}
