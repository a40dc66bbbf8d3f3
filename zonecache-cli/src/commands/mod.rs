//! CLI command implementations.

pub mod check;
pub mod common;
pub mod config;
pub mod download;
pub mod estimate;
pub mod zones;
