//! Offline availability lookups.
//!
//! A tile counts as available if any zone owns it. Storage read failures are
//! reported as a miss and logged, never surfaced to the map layer.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::coord::{self, TileCoord};
use crate::store::ZoneStore;

/// Answers "is this tile already cached?" against the store's secondary index.
#[derive(Clone)]
pub struct AvailabilityChecker {
    store: Arc<dyn ZoneStore>,
}

impl AvailabilityChecker {
    pub fn new(store: Arc<dyn ZoneStore>) -> Self {
        Self { store }
    }

    /// Whether the tile containing `(lat, lng)` at `zoom` is stored by any zone.
    pub fn is_available(&self, lat: f64, lng: f64, zoom: u8) -> bool {
        match coord::try_to_tile(lat, lng, zoom) {
            Ok(tile) => self.is_tile_available(tile),
            Err(e) => {
                debug!(lat, lng, zoom, error = %e, "Availability check on invalid coordinates");
                false
            }
        }
    }

    pub fn is_tile_available(&self, tile: TileCoord) -> bool {
        !self.store.zones_with_tile(tile).is_empty()
    }

    /// Image bytes for the tile containing `(lat, lng)` from any owning zone.
    pub async fn get_any_tile(&self, lat: f64, lng: f64, zoom: u8) -> Option<Vec<u8>> {
        let tile = coord::try_to_tile(lat, lng, zoom).ok()?;

        for zone_id in self.store.zones_with_tile(tile) {
            match self.store.get_tile(&zone_id, tile).await {
                Ok(Some(record)) => return Some(record.data),
                Ok(None) => {
                    debug!(zone = %zone_id, tile = %tile, "Indexed tile missing from store");
                }
                Err(e) => {
                    warn!(zone = %zone_id, tile = %tile, error = %e, "Tile read failed, treating as miss");
                }
            }
        }
        None
    }
}

impl std::fmt::Debug for AvailabilityChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityChecker").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::to_tile;
    use crate::store::{BoxFuture, MemoryStore, StoreError};
    use crate::zone::{TileRecord, Zone, ZoneId};

    const LAT: f64 = 48.8566;
    const LNG: f64 = 2.3522;

    #[tokio::test]
    async fn test_available_after_store_from_any_zone() {
        let store = Arc::new(MemoryStore::new());
        let checker = AvailabilityChecker::new(store.clone());
        assert!(!checker.is_available(LAT, LNG, 12));

        store
            .put_tile(TileRecord::new(ZoneId::new("other"), to_tile(LAT, LNG, 12), vec![9]))
            .await
            .unwrap();

        assert!(checker.is_available(LAT, LNG, 12));
        assert!(!checker.is_available(LAT, LNG, 13));
        assert_eq!(checker.get_any_tile(LAT, LNG, 12).await, Some(vec![9]));
    }

    #[tokio::test]
    async fn test_invalid_coordinates_unavailable() {
        let checker = AvailabilityChecker::new(Arc::new(MemoryStore::new()));
        assert!(!checker.is_available(f64::NAN, LNG, 12));
        assert!(!checker.is_available(LAT, LNG, 40));
        assert_eq!(checker.get_any_tile(LAT, 500.0, 12).await, None);
    }

    /// Store whose index claims a tile but whose reads fail.
    struct BrokenReads {
        tile: TileCoord,
    }

    impl ZoneStore for BrokenReads {
        fn put_tile(&self, _: TileRecord) -> BoxFuture<'_, Result<(), StoreError>> {
            Box::pin(async { Ok(()) })
        }
        fn get_tile(
            &self,
            _: &ZoneId,
            _: TileCoord,
        ) -> BoxFuture<'_, Result<Option<TileRecord>, StoreError>> {
            Box::pin(async { Err(StoreError::Unavailable("disk gone".into())) })
        }
        fn contains_tile(&self, _: &ZoneId, coord: TileCoord) -> bool {
            coord == self.tile
        }
        fn tiles_for_zone(&self, _: &ZoneId) -> Vec<TileCoord> {
            vec![self.tile]
        }
        fn zones_with_tile(&self, coord: TileCoord) -> Vec<ZoneId> {
            if coord == self.tile {
                vec![ZoneId::new("z")]
            } else {
                vec![]
            }
        }
        fn tile_owners(&self) -> Vec<ZoneId> {
            vec![ZoneId::new("z")]
        }
        fn delete_tiles_by_zone(&self, _: &ZoneId) -> BoxFuture<'_, Result<u64, StoreError>> {
            Box::pin(async { Ok(0) })
        }
        fn put_zone(&self, _: &Zone) -> BoxFuture<'_, Result<(), StoreError>> {
            Box::pin(async { Ok(()) })
        }
        fn get_zone(&self, _: &ZoneId) -> BoxFuture<'_, Result<Option<Zone>, StoreError>> {
            Box::pin(async { Ok(None) })
        }
        fn list_zones(&self) -> BoxFuture<'_, Result<Vec<Zone>, StoreError>> {
            Box::pin(async { Ok(vec![]) })
        }
        fn remove_zone_record(&self, _: &ZoneId) -> BoxFuture<'_, Result<bool, StoreError>> {
            Box::pin(async { Ok(false) })
        }
    }

    #[tokio::test]
    async fn test_read_failure_degrades_to_miss() {
        let tile = to_tile(LAT, LNG, 12);
        let checker = AvailabilityChecker::new(Arc::new(BrokenReads { tile }));

        assert!(checker.is_available(LAT, LNG, 12));
        assert_eq!(checker.get_any_tile(LAT, LNG, 12).await, None);
    }
}
