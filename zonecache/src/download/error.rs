//! Error types for zone downloads.

use thiserror::Error;

use crate::store::StoreError;
use crate::zone::ZoneId;

/// Result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Errors that abort a zone download.
///
/// Individual tile fetch failures are not errors at this level; they are
/// counted on the zone and reported in the download report.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Bounds or zoom levels are unusable. Nothing was persisted.
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    /// The zone plans more tiles than the configured cap. Nothing was persisted.
    #[error("Zone too large: {tiles} tiles planned, maximum is {max}")]
    ZoneTooLarge { tiles: u64, max: u64 },

    /// Writing a tile or zone record failed.
    #[error("Storage write failed: {0}")]
    StorageWrite(#[source] StoreError),

    /// Reading a zone record failed.
    #[error("Storage read failed: {0}")]
    StorageRead(#[source] StoreError),

    #[error("Zone not found: {0}")]
    ZoneNotFound(ZoneId),

    /// Another download already holds this zone.
    #[error("Zone {0} is already being downloaded")]
    ZoneBusy(ZoneId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_too_large_display() {
        let err = DownloadError::ZoneTooLarge {
            tiles: 12000,
            max: 5000,
        };
        assert_eq!(
            err.to_string(),
            "Zone too large: 12000 tiles planned, maximum is 5000"
        );
    }

    #[test]
    fn test_storage_write_keeps_source() {
        use std::error::Error as _;

        let err = DownloadError::StorageWrite(StoreError::Unavailable("full".into()));
        assert!(err.source().is_some());
    }
}
