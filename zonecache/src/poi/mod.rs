//! Points of interest and the bounding-box locator.
//!
//! The cache never owns the authoritative point set. A [`PointSource`]
//! supplies "all known points" and a zone keeps the subset that fell inside
//! its bounds at download time.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::GeoBounds;

/// A point of interest captured into a zone snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    /// Free-form attributes carried through untouched.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub properties: serde_json::Value,
}

impl Point {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            properties: serde_json::Value::Null,
        }
    }
}

/// Errors surfaced by a point source.
#[derive(Debug, Error)]
pub enum PointSourceError {
    #[error("Failed to read points: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse points: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Point source unavailable: {0}")]
    Unavailable(String),
}

/// Provider of the full current point set.
pub trait PointSource: Send + Sync {
    fn all_points(&self) -> impl Future<Output = Result<Vec<Point>, PointSourceError>> + Send;
}

/// Point source backed by an in-memory list.
#[derive(Debug, Clone, Default)]
pub struct StaticPointSource {
    points: Arc<Vec<Point>>,
}

impl StaticPointSource {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points: Arc::new(points),
        }
    }

    /// Loads a JSON array of points from disk.
    pub fn from_json_file(path: &Path) -> Result<Self, PointSourceError> {
        let content = std::fs::read_to_string(path)?;
        let points: Vec<Point> = serde_json::from_str(&content)?;
        Ok(Self::new(points))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl PointSource for StaticPointSource {
    async fn all_points(&self) -> Result<Vec<Point>, PointSourceError> {
        Ok(self.points.as_ref().clone())
    }
}

/// Selects the points lying inside `bounds` (edges inclusive).
///
/// Linear in the number of supplied points.
pub fn points_in_bounds(bounds: &GeoBounds, all_points: &[Point]) -> Vec<Point> {
    all_points
        .iter()
        .filter(|p| bounds.contains(p.lat, p.lng))
        .cloned()
        .collect()
}

/// Counts the points inside `bounds` without cloning them.
pub fn count_in_bounds(bounds: &GeoBounds, all_points: &[Point]) -> usize {
    all_points
        .iter()
        .filter(|p| bounds.contains(p.lat, p.lng))
        .count()
}
