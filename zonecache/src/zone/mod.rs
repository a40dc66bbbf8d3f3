//! Zone records and the registry that manages them.

mod registry;
mod types;

pub use registry::{StorageStats, ZoneRegistry, ZoneUsage};
pub use types::{TileRecord, Zone, ZoneId, ZoneStatus, ZoneSummary};
