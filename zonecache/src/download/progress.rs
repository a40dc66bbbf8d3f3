//! Progress reporting for zone downloads.

use std::sync::Arc;

use serde::Serialize;

/// Snapshot of a running download, delivered after every tile attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    /// Tiles stored for the zone so far.
    pub downloaded: u64,
    /// Tiles that failed in this run.
    pub failed: u64,
    /// Tiles attempted in this run.
    pub attempted: u64,
    /// Planned tile count for the zone.
    pub total: u64,
    /// `downloaded / total` as a percentage.
    pub percent: f64,
}

/// Progress callback invoked from the download task.
pub type ProgressCallback = Arc<dyn Fn(&DownloadProgress) + Send + Sync>;
