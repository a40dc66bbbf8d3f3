//! zonecache - offline map tile and zone cache
//!
//! Pre-downloads bounded geographic regions ("zones") as raster tiles at
//! several zoom levels, together with a snapshot of the points of interest
//! inside them, so a map can be shown without network access.
//!
//! # Modules
//!
//! - [`coord`]: Web Mercator lat/lng to tile math
//! - [`estimate`]: pre-flight tile count and size estimates
//! - [`poi`]: point sources and bounding-box filtering
//! - [`provider`]: tile fetching over HTTP
//! - [`store`]: zone and tile persistence
//! - [`download`]: the zone download state machine
//! - [`zone`]: zone records and the registry
//! - [`availability`]: "is this tile cached?" lookups
//! - [`config`]: `config.ini` handling
//! - [`logging`]: tracing subscriber setup

pub mod availability;
pub mod config;
pub mod coord;
pub mod download;
pub mod estimate;
pub mod logging;
pub mod poi;
pub mod provider;
pub mod store;
pub mod zone;
