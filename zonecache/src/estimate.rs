//! Pre-flight cost estimate for a zone download.
//!
//! Estimates never touch the network or the store; invalid input yields a
//! zeroed estimate so the UI can show "nothing to download" without an error
//! path.

use serde::Serialize;

use crate::coord::{self, GeoBounds};
use crate::poi::{self, Point};

/// Assumed size of one raster tile in bytes (15 KiB).
pub const AVERAGE_TILE_SIZE: u64 = 15 * 1024;

/// Estimated cost of downloading a zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneEstimate {
    pub tile_count: u64,
    pub estimated_bytes: u64,
    pub poi_count: usize,
}

impl ZoneEstimate {
    /// Whether the planned tile count exceeds `max_tiles`.
    pub fn exceeds(&self, max_tiles: u64) -> bool {
        self.tile_count > max_tiles
    }
}

/// Computes [`ZoneEstimate`]s.
#[derive(Debug, Clone, Copy)]
pub struct ZoneEstimator {
    average_tile_size: u64,
}

impl Default for ZoneEstimator {
    fn default() -> Self {
        Self {
            average_tile_size: AVERAGE_TILE_SIZE,
        }
    }
}

impl ZoneEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_average_tile_size(mut self, bytes: u64) -> Self {
        self.average_tile_size = bytes;
        self
    }

    pub fn average_tile_size(&self) -> u64 {
        self.average_tile_size
    }

    pub fn estimate(&self, bounds: &GeoBounds, zoom_levels: &[u8], points: &[Point]) -> ZoneEstimate {
        if bounds.validate().is_err() || coord::validate_zoom_levels(zoom_levels).is_err() {
            return ZoneEstimate::default();
        }

        let tile_count = coord::count_tiles_for_bounds(bounds, zoom_levels);
        ZoneEstimate {
            tile_count,
            estimated_bytes: tile_count.saturating_mul(self.average_tile_size),
            poi_count: poi::count_in_bounds(bounds, points),
        }
    }
}

/// Estimates with the default average tile size.
pub fn estimate(bounds: &GeoBounds, zoom_levels: &[u8], points: &[Point]) -> ZoneEstimate {
    ZoneEstimator::default().estimate(bounds, zoom_levels, points)
}
