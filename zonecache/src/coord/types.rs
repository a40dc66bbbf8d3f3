//! Coordinate type definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted for offline zones
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// Tile coordinates in the slippy-map scheme.
///
/// `x` grows west to east, `y` grows north to south, both in `0..2^zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub zoom: u8,
    /// Column (west to east)
    pub x: u32,
    /// Row (north to south)
    pub y: u32,
}

impl TileCoord {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Number of tiles along one axis at this tile's zoom level.
    #[inline]
    pub fn axis_len(&self) -> u64 {
        1u64 << self.zoom
    }

    /// Whether `x` and `y` lie inside the grid for this zoom.
    pub fn is_valid(&self) -> bool {
        self.zoom <= MAX_ZOOM
            && u64::from(self.x) < self.axis_len()
            && u64::from(self.y) < self.axis_len()
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A geographic bounding box in degrees.
///
/// Boxes crossing the antimeridian (`west > east`) are not normalized and
/// are rejected by [`GeoBounds::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Checks the box invariants.
    pub fn validate(&self) -> Result<(), CoordError> {
        let all = [self.north, self.south, self.east, self.west];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(CoordError::InvalidBounds("non-finite coordinate".into()));
        }
        if self.north.abs() > 90.0 || self.south.abs() > 90.0 {
            return Err(CoordError::InvalidBounds(format!(
                "latitude out of range (north {}, south {})",
                self.north, self.south
            )));
        }
        if self.east.abs() > 180.0 || self.west.abs() > 180.0 {
            return Err(CoordError::InvalidBounds(format!(
                "longitude out of range (east {}, west {})",
                self.east, self.west
            )));
        }
        if self.north < self.south {
            return Err(CoordError::InvalidBounds(format!(
                "north {} is below south {}",
                self.north, self.south
            )));
        }
        if self.west > self.east {
            return Err(CoordError::InvalidBounds(format!(
                "west {} is east of east {} (antimeridian crossing unsupported)",
                self.west, self.east
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Inclusive containment test.
    #[inline]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south && lat <= self.north && lng >= self.west && lng <= self.east
    }
}

impl fmt::Display for GeoBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N{:.4} S{:.4} E{:.4} W{:.4}",
            self.north, self.south, self.east, self.west
        )
    }
}

/// Errors from coordinate validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between {MIN_LAT} and {MAX_LAT})")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between {MIN_LON} and {MAX_LON})")]
    InvalidLongitude(f64),

    #[error("Invalid zoom level: {0} (must be between {MIN_ZOOM} and {MAX_ZOOM})")]
    InvalidZoom(u8),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),
}
