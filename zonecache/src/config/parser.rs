//! INI parsing: the single place where INI keys map to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;
use crate::coord::MAX_ZOOM;
use crate::download::MAX_CONCURRENCY;

/// Overlays values found in `ini` onto `ConfigFile::default()`.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = non_empty(section, "tile_server") {
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid("provider", "tile_server", v, "must be an http(s) URL"));
            }
            config.provider.tile_server = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = non_empty(section, "client_name") {
            config.provider.client_name = v.to_string();
        }
        if let Some(v) = non_empty(section, "contact") {
            config.provider.contact = v.to_string();
        }
        if let Some(v) = non_empty(section, "timeout") {
            let secs: u64 = parse_number("provider", "timeout", v)?;
            if secs == 0 {
                return Err(invalid("provider", "timeout", v, "must be at least 1 second"));
            }
            config.provider.timeout = secs;
        }
        if let Some(v) = non_empty(section, "max_zoom") {
            let zoom: u8 = parse_number("provider", "max_zoom", v)?;
            if zoom > MAX_ZOOM {
                return Err(invalid(
                    "provider",
                    "max_zoom",
                    v,
                    &format!("must be at most {}", MAX_ZOOM),
                ));
            }
            config.provider.max_zoom = zoom;
        }
    }

    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = non_empty(section, "max_tiles") {
            config.download.max_tiles = parse_number("download", "max_tiles", v)?;
        }
        if let Some(v) = non_empty(section, "concurrency") {
            let n: usize = parse_number("download", "concurrency", v)?;
            config.download.concurrency = n.clamp(1, MAX_CONCURRENCY);
        }
        if let Some(v) = non_empty(section, "max_retries") {
            config.download.max_retries = parse_number("download", "max_retries", v)?;
        }
        if let Some(v) = non_empty(section, "retry_delay_ms") {
            config.download.retry_delay_ms = parse_number("download", "retry_delay_ms", v)?;
        }
        if let Some(v) = non_empty(section, "max_bytes_in_flight") {
            config.download.max_bytes_in_flight = parse_size_value("download", "max_bytes_in_flight", v)?;
        }
        if let Some(v) = non_empty(section, "average_tile_size") {
            config.download.average_tile_size = parse_size_value("download", "average_tile_size", v)?;
        }
    }

    if let Some(section) = ini.section(Some("storage")) {
        if let Some(v) = non_empty(section, "directory") {
            config.storage.directory = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError> {
    value
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a non-negative integer"))
}

fn parse_size_value(section: &str, key: &str, value: &str) -> Result<u64, ConfigFileError> {
    match parse_size(value) {
        Ok(0) => Err(invalid(section, key, value, "must be greater than zero")),
        Ok(bytes) => Ok(bytes),
        Err(e) => Err(invalid(section, key, value, &e.to_string())),
    }
}

/// Expands a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
