//! Persistent storage for zones and their tiles.
//!
//! Two backends implement [`ZoneStore`]:
//!
//! - [`MemoryStore`] keeps everything in sharded maps
//! - [`DiskStore`] writes JSON zone records and PNG tile files under a root directory
//!
//! Components receive the store as an `Arc<dyn ZoneStore>`.

mod disk;
mod index;
mod memory;
mod traits;

pub use disk::DiskStore;
pub use index::TileIndex;
pub use memory::MemoryStore;
pub use traits::{BoxFuture, StoreError, ZoneStore};
