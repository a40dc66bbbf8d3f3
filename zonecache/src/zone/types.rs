//! Zone and tile record types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coord::{GeoBounds, TileCoord};
use crate::poi::Point;

/// Unique zone identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id can be used verbatim as a file name.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Download status of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneStatus {
    /// A download is in progress, or was interrupted before finalizing.
    Downloading,
    /// Every planned tile was stored.
    Complete,
    /// At least one planned tile is missing.
    Partial,
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ZoneStatus::Downloading => "Downloading",
            ZoneStatus::Complete => "Complete",
            ZoneStatus::Partial => "Partial",
        };
        f.pad(label)
    }
}

/// A user-requested offline region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub bounds: GeoBounds,
    pub zoom_levels: Vec<u8>,
    /// Planned tile count.
    pub tile_count: u64,
    /// Tiles actually stored.
    pub downloaded_tiles: u64,
    /// POI snapshot taken when the download was requested.
    pub points_of_interest: Vec<Point>,
    pub created_at: DateTime<Utc>,
    /// Last time a download run wrote this record.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    pub status: ZoneStatus,
    pub failed_tile_count: u64,
    pub total_bytes: u64,
}

impl Zone {
    /// Creates a zone record in `Downloading` status with no tiles stored.
    pub fn new(
        name: impl Into<String>,
        bounds: GeoBounds,
        zoom_levels: Vec<u8>,
        tile_count: u64,
        points_of_interest: Vec<Point>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ZoneId::generate(),
            name: name.into(),
            bounds,
            zoom_levels,
            tile_count,
            downloaded_tiles: 0,
            points_of_interest,
            created_at: now,
            updated_at: now,
            status: ZoneStatus::Downloading,
            failed_tile_count: 0,
            total_bytes: 0,
        }
    }

    pub fn poi_count(&self) -> usize {
        self.points_of_interest.len()
    }

    /// Serializable view consumed by zone cards and progress bars.
    pub fn summary(&self) -> ZoneSummary {
        ZoneSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            bounds: self.bounds,
            zoom_levels: self.zoom_levels.clone(),
            tile_count: self.tile_count,
            downloaded_tiles: self.downloaded_tiles,
            poi_count: self.poi_count(),
            created_at: self.created_at,
            status: self.status,
            total_bytes: self.total_bytes,
            failed_tile_count: self.failed_tile_count,
        }
    }
}

/// Zone record without the POI payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummary {
    pub id: ZoneId,
    pub name: String,
    pub bounds: GeoBounds,
    pub zoom_levels: Vec<u8>,
    pub tile_count: u64,
    pub downloaded_tiles: u64,
    pub poi_count: usize,
    pub created_at: DateTime<Utc>,
    pub status: ZoneStatus,
    pub total_bytes: u64,
    pub failed_tile_count: u64,
}

/// A stored tile image, owned by exactly one zone.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRecord {
    pub zone_id: ZoneId,
    pub coord: TileCoord,
    pub data: Vec<u8>,
    pub cached_at: DateTime<Utc>,
}

impl TileRecord {
    pub fn new(zone_id: ZoneId, coord: TileCoord, data: Vec<u8>) -> Self {
        Self {
            zone_id,
            coord,
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_path_safe() {
        let a = ZoneId::generate();
        let b = ZoneId::generate();
        assert_ne!(a, b);
        assert!(a.is_path_safe());
    }

    #[test]
    fn test_path_safety_rejects_traversal() {
        assert!(!ZoneId::new("../etc").is_path_safe());
        assert!(!ZoneId::new("").is_path_safe());
        assert!(ZoneId::new("zone_1-a").is_path_safe());
    }

    #[test]
    fn test_new_zone_starts_downloading() {
        let zone = Zone::new("Paris", GeoBounds::new(49.0, 48.0, 3.0, 2.0), vec![10], 20, vec![]);
        assert_eq!(zone.status, ZoneStatus::Downloading);
        assert_eq!(zone.downloaded_tiles, 0);
        assert_eq!(zone.failed_tile_count, 0);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let mut zone = Zone::new(
            "Paris",
            GeoBounds::new(49.0, 48.0, 3.0, 2.0),
            vec![10],
            20,
            vec![Point::new("p1", 48.5, 2.5)],
        );
        zone.status = ZoneStatus::Partial;
        zone.failed_tile_count = 1;

        let json = serde_json::to_value(zone.summary()).unwrap();
        assert_eq!(json["status"], "Partial");
        assert_eq!(json["poiCount"], 1);
        assert_eq!(json["failedTileCount"], 1);
        assert_eq!(json["zoomLevels"], serde_json::json!([10]));
        assert!(json.get("pointsOfInterest").is_none());
    }

    #[test]
    fn test_zone_json_roundtrip_keeps_snapshot() {
        let zone = Zone::new(
            "Paris",
            GeoBounds::new(49.0, 48.0, 3.0, 2.0),
            vec![10, 12],
            100,
            vec![Point::new("p1", 48.5, 2.5)],
        );
        let json = serde_json::to_string(&zone).unwrap();
        let back: Zone = serde_json::from_str(&json).unwrap();
        assert_eq!(back, zone);
    }
}
