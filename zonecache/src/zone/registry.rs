//! CRUD over zone records plus aggregate storage statistics.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::store::{StoreError, ZoneStore};
use crate::zone::{Zone, ZoneId, ZoneStatus};

/// Storage used by a single zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneUsage {
    pub id: ZoneId,
    pub name: String,
    pub status: ZoneStatus,
    pub tiles: u64,
    pub bytes: u64,
}

/// Aggregate storage across every zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub zone_count: usize,
    pub total_bytes: u64,
    pub total_tiles: u64,
    pub per_zone: Vec<ZoneUsage>,
}

/// Registry of downloaded zones.
#[derive(Clone)]
pub struct ZoneRegistry {
    store: Arc<dyn ZoneStore>,
}

impl ZoneRegistry {
    pub fn new(store: Arc<dyn ZoneStore>) -> Self {
        Self { store }
    }

    /// All zones, oldest first.
    pub async fn list(&self) -> Result<Vec<Zone>, StoreError> {
        self.store.list_zones().await
    }

    pub async fn get(&self, zone_id: &ZoneId) -> Result<Option<Zone>, StoreError> {
        self.store.get_zone(zone_id).await
    }

    /// Persists a zone record, replacing any record with the same id.
    pub async fn create(&self, zone: &Zone) -> Result<(), StoreError> {
        self.store.put_zone(zone).await?;
        info!(zone = %zone.id, name = %zone.name, "Registered zone");
        Ok(())
    }

    /// Deletes a zone and every tile it owns. Returns whether it existed.
    pub async fn delete(&self, zone_id: &ZoneId) -> Result<bool, StoreError> {
        self.store.delete_zone(zone_id).await
    }

    /// Sums tile counts and bytes over every zone record.
    ///
    /// Tile counts come from the store index, bytes from the zone records.
    pub async fn stats(&self) -> Result<StorageStats, StoreError> {
        let zones = self.store.list_zones().await?;
        let per_zone: Vec<ZoneUsage> = zones
            .into_iter()
            .map(|zone| ZoneUsage {
                tiles: self.store.tiles_for_zone(&zone.id).len() as u64,
                bytes: zone.total_bytes,
                id: zone.id,
                name: zone.name,
                status: zone.status,
            })
            .collect();

        Ok(StorageStats {
            zone_count: per_zone.len(),
            total_bytes: per_zone.iter().map(|u| u.bytes).sum(),
            total_tiles: per_zone.iter().map(|u| u.tiles).sum(),
            per_zone,
        })
    }
}

impl std::fmt::Debug for ZoneRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneRegistry").finish_non_exhaustive()
    }
}
