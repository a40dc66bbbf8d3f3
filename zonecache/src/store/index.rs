//! Secondary tile index.
//!
//! Maps `(zoom, x, y)` to the set of zones owning a tile there, and each zone
//! to the set of coordinates it owns. Both directions live in sharded
//! `DashMap`s, so lookups never take a store-wide lock.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::coord::TileCoord;
use crate::zone::ZoneId;

/// Two-way index between tile coordinates and owning zones.
#[derive(Debug, Default)]
pub struct TileIndex {
    by_coord: DashMap<TileCoord, HashSet<ZoneId>>,
    by_zone: DashMap<ZoneId, HashSet<TileCoord>>,
}

impl TileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `zone_id` owns a tile at `coord`. Returns `false` if it
    /// was already recorded.
    pub fn insert(&self, zone_id: &ZoneId, coord: TileCoord) -> bool {
        let added = self
            .by_zone
            .entry(zone_id.clone())
            .or_default()
            .insert(coord);
        self.by_coord
            .entry(coord)
            .or_default()
            .insert(zone_id.clone());
        added
    }

    /// Drops a single `(zone, coord)` entry. Returns whether it was present.
    pub fn remove(&self, zone_id: &ZoneId, coord: TileCoord) -> bool {
        let removed = self
            .by_zone
            .get_mut(zone_id)
            .is_some_and(|mut coords| coords.remove(&coord));
        self.by_zone.remove_if(zone_id, |_, coords| coords.is_empty());

        if let Some(mut owners) = self.by_coord.get_mut(&coord) {
            owners.remove(zone_id);
        }
        self.by_coord.remove_if(&coord, |_, owners| owners.is_empty());
        removed
    }

    /// Drops every coordinate owned by `zone_id`, returning them.
    pub fn remove_zone(&self, zone_id: &ZoneId) -> HashSet<TileCoord> {
        let coords = self
            .by_zone
            .remove(zone_id)
            .map(|(_, coords)| coords)
            .unwrap_or_default();

        for coord in &coords {
            let now_empty = match self.by_coord.get_mut(coord) {
                Some(mut owners) => {
                    owners.remove(zone_id);
                    owners.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.by_coord.remove_if(coord, |_, owners| owners.is_empty());
            }
        }

        coords
    }

    /// Zones owning a tile at `coord`, sorted for stable output.
    pub fn zones_at(&self, coord: &TileCoord) -> Vec<ZoneId> {
        let mut zones: Vec<ZoneId> = self
            .by_coord
            .get(coord)
            .map(|owners| owners.iter().cloned().collect())
            .unwrap_or_default();
        zones.sort();
        zones
    }

    /// Whether any zone owns a tile at `coord`.
    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.by_coord
            .get(coord)
            .is_some_and(|owners| !owners.is_empty())
    }

    pub fn zone_contains(&self, zone_id: &ZoneId, coord: &TileCoord) -> bool {
        self.by_zone
            .get(zone_id)
            .is_some_and(|coords| coords.contains(coord))
    }

    /// Coordinates owned by `zone_id`, sorted.
    pub fn coords_for(&self, zone_id: &ZoneId) -> Vec<TileCoord> {
        let mut coords: Vec<TileCoord> = self
            .by_zone
            .get(zone_id)
            .map(|coords| coords.iter().copied().collect())
            .unwrap_or_default();
        coords.sort();
        coords
    }

    /// Zones with at least one indexed tile.
    pub fn owners(&self) -> Vec<ZoneId> {
        self.by_zone
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Total number of indexed (zone, tile) pairs.
    pub fn len(&self) -> usize {
        self.by_zone.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let index = TileIndex::new();
        let zone = ZoneId::new("a");
        let coord = TileCoord::new(10, 517, 351);

        assert!(!index.contains(&coord));
        assert!(index.insert(&zone, coord));
        assert!(!index.insert(&zone, coord));

        assert!(index.contains(&coord));
        assert!(index.zone_contains(&zone, &coord));
        assert_eq!(index.zones_at(&coord), vec![zone]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_overlapping_zones_are_tracked_separately() {
        let index = TileIndex::new();
        let a = ZoneId::new("a");
        let b = ZoneId::new("b");
        let coord = TileCoord::new(10, 1, 1);

        index.insert(&a, coord);
        index.insert(&b, coord);
        assert_eq!(index.zones_at(&coord), vec![a.clone(), b.clone()]);

        let removed = index.remove_zone(&a);
        assert_eq!(removed.len(), 1);
        assert!(index.contains(&coord));
        assert_eq!(index.zones_at(&coord), vec![b.clone()]);

        index.remove_zone(&b);
        assert!(!index.contains(&coord));
        assert!(index.is_empty());
        assert!(index.owners().is_empty());
    }

    #[test]
    fn test_remove_single_entry() {
        let index = TileIndex::new();
        let a = ZoneId::new("a");
        let b = ZoneId::new("b");
        let shared = TileCoord::new(10, 1, 1);
        let own = TileCoord::new(10, 1, 2);
        index.insert(&a, shared);
        index.insert(&a, own);
        index.insert(&b, shared);

        assert!(index.remove(&a, shared));
        assert!(!index.remove(&a, shared));
        assert_eq!(index.zones_at(&shared), vec![b.clone()]);
        assert_eq!(index.coords_for(&a), vec![own]);

        index.remove(&a, own);
        assert_eq!(index.owners(), vec![b]);
    }

    #[test]
    fn test_remove_unknown_zone_is_noop() {
        let index = TileIndex::new();
        assert!(index.remove_zone(&ZoneId::new("missing")).is_empty());
    }

    #[test]
    fn test_coords_for_is_sorted() {
        let index = TileIndex::new();
        let zone = ZoneId::new("a");
        index.insert(&zone, TileCoord::new(10, 2, 0));
        index.insert(&zone, TileCoord::new(8, 5, 5));
        index.insert(&zone, TileCoord::new(10, 1, 9));

        assert_eq!(
            index.coords_for(&zone),
            vec![
                TileCoord::new(8, 5, 5),
                TileCoord::new(10, 1, 9),
                TileCoord::new(10, 2, 0),
            ]
        );
    }
}
