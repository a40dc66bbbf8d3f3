//! File-backed zone store.
//!
//! # Layout
//!
//! ```text
//! {root}/
//! ├── zones/{zone_id}.json          zone metadata
//! └── tiles/{zone_id}/{z}/{x}/{y}.png
//! ```
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a
//! crash never leaves a half-written tile or zone record under its real name.
//! The secondary index is rebuilt from the `tiles/` tree when the store is
//! opened.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::coord::TileCoord;
use crate::store::index::TileIndex;
use crate::store::traits::{BoxFuture, StoreError, ZoneStore};
use crate::zone::{TileRecord, Zone, ZoneId};

const ZONES_DIR: &str = "zones";
const TILES_DIR: &str = "tiles";
const TILE_EXTENSION: &str = "png";

/// Zone store persisted under a root directory.
#[derive(Debug)]
pub struct DiskStore {
    root: PathBuf,
    index: TileIndex,
}

impl DiskStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(ZONES_DIR)).await?;
        fs::create_dir_all(root.join(TILES_DIR)).await?;

        let store = Self {
            root,
            index: TileIndex::new(),
        };
        let indexed = store.rebuild_index().await?;
        info!(root = %store.root.display(), tiles = indexed, "Opened disk store");
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn zone_path(&self, zone_id: &ZoneId) -> Result<PathBuf, StoreError> {
        check_zone_id(zone_id)?;
        Ok(self
            .root
            .join(ZONES_DIR)
            .join(format!("{}.json", zone_id.as_str())))
    }

    fn zone_tiles_dir(&self, zone_id: &ZoneId) -> Result<PathBuf, StoreError> {
        check_zone_id(zone_id)?;
        Ok(self.root.join(TILES_DIR).join(zone_id.as_str()))
    }

    fn tile_path(&self, zone_id: &ZoneId, coord: TileCoord) -> Result<PathBuf, StoreError> {
        Ok(self
            .zone_tiles_dir(zone_id)?
            .join(coord.zoom.to_string())
            .join(coord.x.to_string())
            .join(format!("{}.{}", coord.y, TILE_EXTENSION)))
    }

    /// Drops index entries of `zone_id` whose tile file is gone. Returns how
    /// many were dropped.
    async fn prune_missing(&self, zone_id: &ZoneId) -> usize {
        let mut pruned = 0;
        for coord in self.index.coords_for(zone_id) {
            let Ok(path) = self.tile_path(zone_id, coord) else {
                continue;
            };
            if !fs::try_exists(&path).await.unwrap_or(true) {
                self.index.remove(zone_id, coord);
                pruned += 1;
            }
        }
        pruned
    }

    /// Walks `tiles/` and records every tile file in the index.
    async fn rebuild_index(&self) -> Result<usize, StoreError> {
        let mut count = 0;
        let mut zones = fs::read_dir(self.root.join(TILES_DIR)).await?;

        while let Some(zone_entry) = zones.next_entry().await? {
            if !zone_entry.file_type().await?.is_dir() {
                continue;
            }
            let zone_id = ZoneId::new(zone_entry.file_name().to_string_lossy().into_owned());
            if !zone_id.is_path_safe() {
                warn!(dir = %zone_entry.path().display(), "Skipping unexpected tile directory");
                continue;
            }

            let mut zooms = fs::read_dir(zone_entry.path()).await?;
            while let Some(zoom_entry) = zooms.next_entry().await? {
                let Some(zoom) = parse_name::<u8>(&zoom_entry.file_name()) else {
                    continue;
                };
                let mut columns = fs::read_dir(zoom_entry.path()).await?;
                while let Some(column_entry) = columns.next_entry().await? {
                    let Some(x) = parse_name::<u32>(&column_entry.file_name()) else {
                        continue;
                    };
                    let mut rows = fs::read_dir(column_entry.path()).await?;
                    while let Some(row_entry) = rows.next_entry().await? {
                        let path = row_entry.path();
                        if path.extension().and_then(|e| e.to_str()) != Some(TILE_EXTENSION) {
                            continue;
                        }
                        let Some(y) = path
                            .file_stem()
                            .and_then(|s| s.to_str())
                            .and_then(|s| s.parse::<u32>().ok())
                        else {
                            continue;
                        };
                        self.index.insert(&zone_id, TileCoord::new(zoom, x, y));
                        count += 1;
                    }
                }
            }
        }

        Ok(count)
    }
}

fn check_zone_id(zone_id: &ZoneId) -> Result<(), StoreError> {
    if zone_id.is_path_safe() {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(format!(
            "zone id '{}' is not usable as a file name",
            zone_id
        )))
    }
}

fn parse_name<T: std::str::FromStr>(name: &std::ffi::OsStr) -> Option<T> {
    name.to_str().and_then(|s| s.parse().ok())
}

/// Writes `data` to a temporary sibling and renames it over `path`.
async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

impl ZoneStore for DiskStore {
    fn put_tile(&self, record: TileRecord) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let path = self.tile_path(&record.zone_id, record.coord)?;
            write_atomic(&path, &record.data).await?;
            self.index.insert(&record.zone_id, record.coord);
            debug!(zone = %record.zone_id, tile = %record.coord, bytes = record.data.len(), "Stored tile");
            Ok(())
        })
    }

    fn get_tile(
        &self,
        zone_id: &ZoneId,
        coord: TileCoord,
    ) -> BoxFuture<'_, Result<Option<TileRecord>, StoreError>> {
        let zone_id = zone_id.clone();
        Box::pin(async move {
            let path = self.tile_path(&zone_id, coord)?;
            let data = match fs::read(&path).await {
                Ok(data) => data,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let cached_at = fs::metadata(&path)
                .await
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            Ok(Some(TileRecord {
                zone_id,
                coord,
                data,
                cached_at,
            }))
        })
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
        let zone_id = zone_id.clone();
        Box::pin(async move {
            let mut bytes = 0;
            for coord in self.index.coords_for(&zone_id) {
                match fs::metadata(self.tile_path(&zone_id, coord)?).await {
                    Ok(meta) => bytes += meta.len(),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
            Ok(bytes)
        })
    }

    fn delete_tiles_by_zone(&self, zone_id: &ZoneId) -> BoxFuture<'_, Result<u64, StoreError>> {
        let zone_id = zone_id.clone();
        Box::pin(async move {
            let dir = self.zone_tiles_dir(&zone_id)?;
            match fs::remove_dir_all(&dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    let pruned = self.prune_missing(&zone_id).await;
                    warn!(zone = %zone_id, error = %e, pruned, "Tile directory only partly removed");
                    return Err(e.into());
                }
            }
            let removed = self.index.remove_zone(&zone_id).len() as u64;
            Ok(removed)
        })
    }

    fn put_zone(&self, zone: &Zone) -> BoxFuture<'_, Result<(), StoreError>> {
        let zone = zone.clone();
        Box::pin(async move {
            let path = self.zone_path(&zone.id)?;
            let json = serde_json::to_vec_pretty(&zone)?;
            write_atomic(&path, &json).await
        })
    }

    fn get_zone(&self, zone_id: &ZoneId) -> BoxFuture<'_, Result<Option<Zone>, StoreError>> {
        let zone_id = zone_id.clone();
        Box::pin(async move {
            let path = self.zone_path(&zone_id)?;
            read_zone(&path).await
        })
    }

    fn list_zones(&self) -> BoxFuture<'_, Result<Vec<Zone>, StoreError>> {
        Box::pin(async move {
            let mut zones = Vec::new();
            let mut entries = fs::read_dir(self.root.join(ZONES_DIR)).await?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                match read_zone(&path).await {
                    Ok(Some(zone)) => zones.push(zone),
                    Ok(None) => {}
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable zone record"),
                }
            }

            zones.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(zones)
        })
    }

    fn remove_zone_record(&self, zone_id: &ZoneId) -> BoxFuture<'_, Result<bool, StoreError>> {
        let zone_id = zone_id.clone();
        Box::pin(async move {
            let path = self.zone_path(&zone_id)?;
            match fs::remove_file(&path).await {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }
}

async fn read_zone(path: &Path) -> Result<Option<Zone>, StoreError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::Corrupt {
            key: path.display().to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::GeoBounds;
    use tempfile::TempDir;

    fn zone() -> Zone {
        Zone::new("Paris", GeoBounds::new(49.0, 48.0, 3.0, 2.0), vec![10], 20, vec![])
    }

    #[tokio::test]
    async fn test_tile_written_to_expected_path() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::open(dir.path()).await.unwrap();
        let zone_id = ZoneId::new("z1");
        let coord = TileCoord::new(10, 517, 351);

        store
            .put_tile(TileRecord::new(zone_id.clone(), coord, vec![7, 7, 7]))
            .await
            .unwrap();

        let path = dir.path().join("tiles/z1/10/517/351.png");
        assert_eq!(std::fs::read(&path).unwrap(), vec![7, 7, 7]);
        assert!(!dir.path().join("tiles/z1/10/517/351.png.tmp").exists());

        let record = store.get_tile(&zone_id, coord).await.unwrap().unwrap();
        assert_eq!(record.data, vec![7, 7, 7]);
    }

    #[tokio::test]
    async fn test_missing_tile_is_none() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::open(dir.path()).await.unwrap();
        let result = store
            .get_tile(&ZoneId::new("z1"), TileCoord::new(1, 0, 0))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_zone_roundtrip_and_listing() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::open(dir.path()).await.unwrap();
        let zone = zone();

        store.put_zone(&zone).await.unwrap();

        assert_eq!(store.get_zone(&zone.id).await.unwrap(), Some(zone.clone()));
        assert_eq!(store.list_zones().await.unwrap(), vec![zone]);
    }

    #[tokio::test]
    async fn test_index_rebuilt_on_reopen() {
        let dir = TempDir::new().unwrap();
        let zone = zone();
        let coord = TileCoord::new(10, 517, 351);
        {
            let store = DiskStore::open(dir.path()).await.unwrap();
            store.put_zone(&zone).await.unwrap();
            store
                .put_tile(TileRecord::new(zone.id.clone(), coord, vec![1]))
                .await
                .unwrap();
        }

        let reopened = DiskStore::open(dir.path()).await.unwrap();
        assert!(reopened.contains_tile(&zone.id, coord));
        assert_eq!(reopened.zones_with_tile(coord), vec![zone.id.clone()]);
    }

    #[tokio::test]
    async fn test_delete_zone_removes_tiles_and_record() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::open(dir.path()).await.unwrap();
        let zone = zone();
        store.put_zone(&zone).await.unwrap();
        store
            .put_tile(TileRecord::new(zone.id.clone(), TileCoord::new(10, 1, 1), vec![1]))
            .await
            .unwrap();

        assert!(store.delete_zone(&zone.id).await.unwrap());
        assert!(store.get_zone(&zone.id).await.unwrap().is_none());
        assert!(!dir.path().join("tiles").join(zone.id.as_str()).exists());
        assert!(store.tiles_for_zone(&zone.id).is_empty());

        // Second delete is a no-op.
        assert!(!store.delete_zone(&zone.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_tile_bytes_for_zone_sums_files() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::open(dir.path()).await.unwrap();
        let zone_id = ZoneId::new("z1");
        store
            .put_tile(TileRecord::new(zone_id.clone(), TileCoord::new(10, 1, 1), vec![0; 100]))
            .await
            .unwrap();
        store
            .put_tile(TileRecord::new(zone_id.clone(), TileCoord::new(10, 1, 2), vec![0; 40]))
            .await
            .unwrap();

        assert_eq!(store.tile_bytes_for_zone(&zone_id).await.unwrap(), 140);
        assert_eq!(store.tile_bytes_for_zone(&ZoneId::new("other")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_prune_drops_entries_for_vanished_files() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::open(dir.path()).await.unwrap();
        let zone_id = ZoneId::new("z1");
        let gone = TileCoord::new(10, 1, 1);
        let kept = TileCoord::new(10, 1, 2);
        for coord in [gone, kept] {
            store
                .put_tile(TileRecord::new(zone_id.clone(), coord, vec![1]))
                .await
                .unwrap();
        }
        std::fs::remove_file(dir.path().join("tiles/z1/10/1/1.png")).unwrap();

        assert_eq!(store.prune_missing(&zone_id).await, 1);
        assert!(!store.contains_tile(&zone_id, gone));
        assert!(store.zones_with_tile(gone).is_empty());
        assert!(store.contains_tile(&zone_id, kept));
    }

    #[tokio::test]
    async fn test_corrupt_zone_record_reported() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("zones/broken.json"), b"{not json").unwrap();

        let result = store.get_zone(&ZoneId::new("broken")).await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));

        // Listing degrades by skipping the unreadable record.
        assert!(store.list_zones().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsafe_zone_id_rejected() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::open(dir.path()).await.unwrap();
        let result = store
            .put_tile(TileRecord::new(ZoneId::new("../escape"), TileCoord::new(0, 0, 0), vec![1]))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }
}
