//! Download state tracking for a single zone run.

use crate::coord::TileCoord;

use super::progress::DownloadProgress;

/// Counters for one download run.
///
/// `downloaded` and `bytes` include tiles stored by earlier runs when a zone
/// is resumed; `attempted` and `failed` cover this run only.
#[derive(Debug, Clone, Default)]
pub struct DownloadState {
    /// Planned tile count for the zone.
    pub total: u64,
    /// Tiles stored for the zone.
    pub downloaded: u64,
    /// Bytes stored for the zone.
    pub bytes: u64,
    /// Tiles attempted in this run.
    pub attempted: u64,
    /// Tiles that failed in this run.
    pub failed: Vec<TileCoord>,
}

impl DownloadState {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Starts from counts already stored by an earlier run.
    pub fn resumed(total: u64, downloaded: u64, bytes: u64) -> Self {
        Self {
            total,
            downloaded,
            bytes,
            ..Default::default()
        }
    }

    /// Every planned tile is stored and nothing failed in this run.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.downloaded >= self.total
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn failure_count(&self) -> u64 {
        self.failed.len() as u64
    }

    /// Stored tiles as a percentage of the planned total.
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.downloaded as f64 / self.total as f64) * 100.0
        }
    }

    pub fn record_success(&mut self, bytes: u64) {
        self.attempted += 1;
        self.downloaded += 1;
        self.bytes += bytes;
    }

    pub fn record_failure(&mut self, tile: TileCoord) {
        self.attempted += 1;
        self.failed.push(tile);
    }

    pub fn progress(&self) -> DownloadProgress {
        DownloadProgress {
            downloaded: self.downloaded,
            failed: self.failure_count(),
            attempted: self.attempted,
            total: self.total,
            percent: self.progress_percent(),
        }
    }
}
