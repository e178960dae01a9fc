//! # Download Listener
//!
//! The external progress interface, and the bridge that adapts per-transfer
//! transport events into request state changes.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::request::Request;
use crate::transport::TransferEvent;

/// Download progress notifications. All methods default to no-ops; a
/// listener only affects reporting, never the download loop itself.
pub trait Listener: Send + Sync {
    /// Downloading has started for the request.
    fn download_started(&self, request: &Request) {
        let _ = request;
    }

    /// Downloading has succeeded for the request.
    fn download_succeeded(&self, request: &Request) {
        let _ = request;
    }

    /// Downloading has failed for the request with no sources left to try.
    fn download_failed(&self, request: &Request) {
        let _ = request;
    }
}

/// Applies transport events to requests for one batched transfer.
///
/// Failure routing: a failed transfer advances the request to its next
/// candidate, and the external listener only hears about the failure when
/// that candidate was the last one. Fallback sources are expected to fail
/// sometimes; reporting each miss would be noise.
pub(crate) struct EventBridge {
    cancel: CancellationToken,
    listener: Option<Arc<dyn Listener>>,
    settled: HashSet<usize>,
    pub total_succeeded: u64,
    pub total_failed: u64,
}

impl EventBridge {
    pub fn new(cancel: CancellationToken, listener: Option<Arc<dyn Listener>>) -> Self {
        Self {
            cancel,
            listener,
            settled: HashSet::new(),
            total_succeeded: 0,
            total_failed: 0,
        }
    }

    pub fn handle(&mut self, event: TransferEvent, requests: &mut [Request]) {
        match event {
            TransferEvent::Started { id } => {
                if self.cancel.is_cancelled() {
                    return;
                }
                if let Some(listener) = &self.listener {
                    listener.download_started(&requests[id]);
                }
            }
            TransferEvent::Succeeded { id } => {
                self.total_succeeded += 1;
                self.settled.insert(id);
                if self.cancel.is_cancelled() {
                    return;
                }
                let request = &mut requests[id];
                request.downloaded = true;
                if let Some(listener) = &self.listener {
                    listener.download_succeeded(request);
                }
            }
            TransferEvent::Failed { id, error } => {
                self.total_failed += 1;
                self.settled.insert(id);
                if self.cancel.is_cancelled() {
                    return;
                }
                let request = &mut requests[id];
                debug!(id, error = %error, "transfer failed");
                request.errors.push(error);
                request.advance();
                if request.is_exhausted() {
                    // that was the last candidate
                    if let Some(listener) = &self.listener {
                        listener.download_failed(request);
                    }
                }
            }
        }
    }

    /// Fail every transfer in the batch the transport never accounted for.
    /// Mirrors a transport-level abort: each affected request records the
    /// error and falls through to its next candidate.
    pub fn fail_unsettled(&mut self, ids: &[usize], error: &str, requests: &mut [Request]) {
        for &id in ids {
            if !self.settled.contains(&id) {
                self.handle(
                    TransferEvent::Failed {
                        id,
                        error: error.to_string(),
                    },
                    requests,
                );
            }
        }
    }
}
