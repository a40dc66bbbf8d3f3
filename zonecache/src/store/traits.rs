//! Core trait for zone and tile persistence.
//!
//! Tiles are keyed by `(zone, zoom, x, y)` and zones by their id. Every
//! operation is idempotent: writing an existing key overwrites it and
//! deleting a missing key succeeds.
//!
//! # Deletion order
//!
//! [`ZoneStore::delete_zone`] removes a zone's tiles strictly before its
//! metadata record. An interrupted delete therefore leaves orphaned tiles,
//! which [`ZoneStore::sweep_orphans`] reclaims, and never a zone record that
//! claims tiles which are gone.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tracing::info;

use crate::coord::TileCoord;
use crate::zone::{TileRecord, Zone, ZoneId};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error in a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Zone metadata could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored record exists but is unreadable.
    #[error("Corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// The key cannot be represented by this store.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Backend-specific failure.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence for zone metadata and tile blobs.
///
/// Implementations keep a secondary `(zoom, x, y) → zones` index so that
/// availability lookups do not scan every stored tile.
pub trait ZoneStore: Send + Sync {
    /// Stores a tile, replacing any previous blob under the same key.
    fn put_tile(&self, record: TileRecord) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Fetches a tile owned by `zone_id`.
    fn get_tile(
        &self,
        zone_id: &ZoneId,
        coord: TileCoord,
    ) -> BoxFuture<'_, Result<Option<TileRecord>, StoreError>>;

    /// Whether `zone_id` owns a stored tile at `coord`.
    fn contains_tile(&self, zone_id: &ZoneId, coord: TileCoord) -> bool;

    /// Coordinates of every tile owned by `zone_id`.
    fn tiles_for_zone(&self, zone_id: &ZoneId) -> Vec<TileCoord>;

    /// Zones owning a stored tile at `coord`.
    fn zones_with_tile(&self, coord: TileCoord) -> Vec<ZoneId>;

    /// Ids of every zone that owns at least one stored tile.
    fn tile_owners(&self) -> Vec<ZoneId>;

    /// Total bytes of the tiles owned by `zone_id`.
    fn tile_bytes_for_zone(&self, zone_id: &ZoneId) -> BoxFuture<'_, Result<u64, StoreError>> {
        let zone_id = zone_id.clone();
        Box::pin(async move {
            let mut bytes = 0;
            for coord in self.tiles_for_zone(&zone_id) {
                if let Some(record) = self.get_tile(&zone_id, coord).await? {
                    bytes += record.size_bytes();
                }
            }
            Ok(bytes)
        })
    }

    /// Removes every tile owned by `zone_id`, returning how many were removed.
    fn delete_tiles_by_zone(&self, zone_id: &ZoneId) -> BoxFuture<'_, Result<u64, StoreError>>;

    /// Stores zone metadata, replacing any previous record.
    fn put_zone(&self, zone: &Zone) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Fetches zone metadata.
    fn get_zone(&self, zone_id: &ZoneId) -> BoxFuture<'_, Result<Option<Zone>, StoreError>>;

    /// Lists all zone records.
    fn list_zones(&self) -> BoxFuture<'_, Result<Vec<Zone>, StoreError>>;

    /// Removes only the metadata record. Returns whether it existed.
    ///
    /// Callers wanting a full delete use [`ZoneStore::delete_zone`].
    fn remove_zone_record(&self, zone_id: &ZoneId) -> BoxFuture<'_, Result<bool, StoreError>>;

    /// Deletes a zone and all its tiles, tiles first.
    ///
    /// Returns whether the zone record existed.
    fn delete_zone(&self, zone_id: &ZoneId) -> BoxFuture<'_, Result<bool, StoreError>> {
        let zone_id = zone_id.clone();
        Box::pin(async move {
            let removed = self.delete_tiles_by_zone(&zone_id).await?;
            let existed = self.remove_zone_record(&zone_id).await?;
            info!(zone = %zone_id, tiles = removed, existed, "Deleted zone");
            Ok(existed)
        })
    }

    /// Deletes tiles whose owning zone record no longer exists.
    ///
    /// Returns the number of tiles reclaimed.
    fn sweep_orphans(&self) -> BoxFuture<'_, Result<u64, StoreError>> {
        Box::pin(async move {
            let mut reclaimed = 0;
            for owner in self.tile_owners() {
                if self.get_zone(&owner).await?.is_none() {
                    reclaimed += self.delete_tiles_by_zone(&owner).await?;
                }
            }
            if reclaimed > 0 {
                info!(tiles = reclaimed, "Reclaimed orphaned tiles");
            }
            Ok(reclaimed)
        })
    }
}
