//! In-memory zone store.
//!
//! Backed by sharded `DashMap`s so concurrent downloads of different zones
//! never contend on a single lock. Used for tests and for hosts that bring
//! their own persistence.

use dashmap::DashMap;

use crate::coord::TileCoord;
use crate::store::index::TileIndex;
use crate::store::traits::{BoxFuture, StoreError, ZoneStore};
use crate::zone::{TileRecord, Zone, ZoneId};

/// Zone store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tiles: DashMap<(ZoneId, TileCoord), TileRecord>,
    zones: DashMap<ZoneId, Zone>,
    index: TileIndex,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes of all stored tile blobs.
    pub fn tile_bytes(&self) -> u64 {
        self.tiles.iter().map(|entry| entry.value().size_bytes()).sum()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }
}

impl ZoneStore for MemoryStore {
    fn put_tile(&self, record: TileRecord) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let zone_id = record.zone_id.clone();
            let coord = record.coord;
            self.tiles.insert((zone_id.clone(), coord), record);
            self.index.insert(&zone_id, coord);
            Ok(())
        })
    }

    fn get_tile(
        &self,
        zone_id: &ZoneId,
        coord: TileCoord,
    ) -> BoxFuture<'_, Result<Option<TileRecord>, StoreError>> {
        let key = (zone_id.clone(), coord);
        Box::pin(async move { Ok(self.tiles.get(&key).map(|entry| entry.value().clone())) })
    }

    fn contains_tile(&self, zone_id: &ZoneId, coord: TileCoord) -> bool {
        self.index.zone_contains(zone_id, &coord)
    }

    fn tiles_for_zone(&self, zone_id: &ZoneId) -> Vec<TileCoord> {
        self.index.coords_for(zone_id)
    }

    fn zones_with_tile(&self, coord: TileCoord) -> Vec<ZoneId> {
        self.index.zones_at(&coord)
    }

    fn tile_owners(&self) -> Vec<ZoneId> {
        self.index.owners()
    }

    fn tile_bytes_for_zone(&self, zone_id: &ZoneId) -> BoxFuture<'_, Result<u64, StoreError>> {
        let bytes = self
            .tiles
            .iter()
            .filter(|entry| &entry.key().0 == zone_id)
            .map(|entry| entry.value().size_bytes())
            .sum();
        Box::pin(async move { Ok(bytes) })
    }

    fn delete_tiles_by_zone(&self, zone_id: &ZoneId) -> BoxFuture<'_, Result<u64, StoreError>> {
        let zone_id = zone_id.clone();
        Box::pin(async move {
            let coords = self.index.remove_zone(&zone_id);
            let mut removed = 0;
            for coord in coords {
                if self.tiles.remove(&(zone_id.clone(), coord)).is_some() {
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    fn put_zone(&self, zone: &Zone) -> BoxFuture<'_, Result<(), StoreError>> {
        let zone = zone.clone();
        Box::pin(async move {
            self.zones.insert(zone.id.clone(), zone);
            Ok(())
        })
    }

    fn get_zone(&self, zone_id: &ZoneId) -> BoxFuture<'_, Result<Option<Zone>, StoreError>> {
        let zone_id = zone_id.clone();
        Box::pin(async move { Ok(self.zones.get(&zone_id).map(|entry| entry.value().clone())) })
    }

    fn list_zones(&self) -> BoxFuture<'_, Result<Vec<Zone>, StoreError>> {
        Box::pin(async move {
            let mut zones: Vec<Zone> = self
                .zones
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
            zones.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(zones)
        })
    }

    fn remove_zone_record(&self, zone_id: &ZoneId) -> BoxFuture<'_, Result<bool, StoreError>> {
        let zone_id = zone_id.clone();
        Box::pin(async move { Ok(self.zones.remove(&zone_id).is_some()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::GeoBounds;

    fn zone(name: &str) -> Zone {
        Zone::new(name, GeoBounds::new(49.0, 48.0, 3.0, 2.0), vec![10], 20, vec![])
    }

    #[tokio::test]
    async fn test_put_and_get_tile() {
        let store = MemoryStore::new();
        let zone_id = ZoneId::new("z1");
        let coord = TileCoord::new(10, 517, 351);

        store
            .put_tile(TileRecord::new(zone_id.clone(), coord, vec![1, 2, 3]))
            .await
            .unwrap();

        let record = store.get_tile(&zone_id, coord).await.unwrap().unwrap();
        assert_eq!(record.data, vec![1, 2, 3]);
        assert!(store.contains_tile(&zone_id, coord));
        assert_eq!(store.zones_with_tile(coord), vec![zone_id]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_indexed_tile_is_always_readable() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let zone_id = ZoneId::new("z1");
        let coords: Vec<TileCoord> = (0..400).map(|y| TileCoord::new(12, 7, y)).collect();

        let writer = {
            let store = store.clone();
            let zone_id = zone_id.clone();
            let coords = coords.clone();
            tokio::spawn(async move {
                for coord in coords {
                    store
                        .put_tile(TileRecord::new(zone_id.clone(), coord, vec![1; 8]))
                        .await
                        .unwrap();
                }
            })
        };

        while !writer.is_finished() {
            for coord in &coords {
                if store.contains_tile(&zone_id, *coord) {
                    assert!(store.get_tile(&zone_id, *coord).await.unwrap().is_some());
                }
            }
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
        assert_eq!(store.tile_bytes_for_zone(&zone_id).await.unwrap(), 400 * 8);
    }

    #[tokio::test]
    async fn test_put_tile_overwrites() {
        let store = MemoryStore::new();
        let zone_id = ZoneId::new("z1");
        let coord = TileCoord::new(10, 1, 1);

        store
            .put_tile(TileRecord::new(zone_id.clone(), coord, vec![1]))
            .await
            .unwrap();
        store
            .put_tile(TileRecord::new(zone_id.clone(), coord, vec![9, 9]))
            .await
            .unwrap();

        assert_eq!(store.tile_count(), 1);
        assert_eq!(store.tile_bytes(), 2);
        let record = store.get_tile(&zone_id, coord).await.unwrap().unwrap();
        assert_eq!(record.data, vec![9, 9]);
    }

    #[tokio::test]
    async fn test_tiles_are_isolated_per_zone() {
        let store = MemoryStore::new();
        let a = ZoneId::new("a");
        let b = ZoneId::new("b");
        let coord = TileCoord::new(10, 1, 1);

        store
            .put_tile(TileRecord::new(a.clone(), coord, vec![1]))
            .await
            .unwrap();

        assert!(store.get_tile(&b, coord).await.unwrap().is_none());
        assert!(!store.contains_tile(&b, coord));
    }

    #[tokio::test]
    async fn test_delete_zone_cascades() {
        let store = MemoryStore::new();
        let zone = zone("Paris");
        store.put_zone(&zone).await.unwrap();
        for y in 0..3 {
            store
                .put_tile(TileRecord::new(zone.id.clone(), TileCoord::new(10, 0, y), vec![0; 4]))
                .await
                .unwrap();
        }

        assert!(store.delete_zone(&zone.id).await.unwrap());

        assert!(store.get_zone(&zone.id).await.unwrap().is_none());
        assert!(store.tiles_for_zone(&zone.id).is_empty());
        assert_eq!(store.tile_count(), 0);
        assert!(store.zones_with_tile(TileCoord::new(10, 0, 0)).is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_zone_is_noop() {
        let store = MemoryStore::new();
        assert!(!store.delete_zone(&ZoneId::new("missing")).await.unwrap());
        assert_eq!(store.delete_tiles_by_zone(&ZoneId::new("missing")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_zones_ordered_by_creation() {
        let store = MemoryStore::new();
        let first = zone("first");
        let mut second = zone("second");
        second.created_at = first.created_at + chrono::Duration::seconds(1);

        store.put_zone(&second).await.unwrap();
        store.put_zone(&first).await.unwrap();

        let names: Vec<_> = store
            .list_zones()
            .await
            .unwrap()
            .into_iter()
            .map(|z| z.name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_sweep_orphans_reclaims_tiles_without_zone() {
        let store = MemoryStore::new();
        let kept = zone("kept");
        store.put_zone(&kept).await.unwrap();
        store
            .put_tile(TileRecord::new(kept.id.clone(), TileCoord::new(10, 0, 0), vec![1]))
            .await
            .unwrap();

        let orphan = ZoneId::new("orphan");
        store
            .put_tile(TileRecord::new(orphan.clone(), TileCoord::new(10, 0, 1), vec![1]))
            .await
            .unwrap();
        store
            .put_tile(TileRecord::new(orphan.clone(), TileCoord::new(10, 0, 2), vec![1]))
            .await
            .unwrap();

        assert_eq!(store.sweep_orphans().await.unwrap(), 2);
        assert_eq!(store.tile_count(), 1);
        assert_eq!(store.tiles_for_zone(&kept.id).len(), 1);
    }
}
