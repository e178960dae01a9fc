//! Download and refresh outcome summaries, aggregated per source.

use std::collections::HashMap;

use serde::Serialize;

/// Outcome of refreshing one source URL.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub source_id: String,
    pub url: String,
    pub succeeded: bool,
    /// Number of catalog entries added
    pub added_count: u64,
    pub errors: Vec<String>,
}

impl RefreshReport {
    pub fn new(source_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            url: url.into(),
            succeeded: false,
            added_count: 0,
            errors: Vec::new(),
        }
    }
}

/// Per-source transfer counts within one download call.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DownloadDetails {
    pub total_succeeded: u64,
    pub total_failed: u64,
}

/// Summary of one download call. Per-request outcomes live on the requests
/// themselves; this aggregates the per-source totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadReport {
    /// Number of collation passes through the download loop
    pub total_passes: u64,
    /// Number of sources loaded in the registry
    pub total_sources: usize,
    /// Transfer counts keyed by source ID
    pub downloads: HashMap<String, DownloadDetails>,
}
