//! Serialization of `ConfigFile` to a commented INI string.

use super::settings::ConfigFile;
use super::size::format_size;

pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        "\
; zonecache configuration

[provider]
; Base URL of a {{z}}/{{x}}/{{y}}.png raster tile server
tile_server = {tile_server}
; Sent as the User-Agent \"client_name (contact)\"
client_name = {client_name}
contact = {contact}
; Per-request timeout in seconds
timeout = {timeout}
max_zoom = {max_zoom}

[download]
; Zones planning more tiles than this are refused
max_tiles = {max_tiles}
; Concurrent tile fetches (1-8)
concurrency = {concurrency}
max_retries = {max_retries}
retry_delay_ms = {retry_delay_ms}
max_bytes_in_flight = {max_bytes_in_flight}
average_tile_size = {average_tile_size}

[storage]
directory = {directory}
",
        tile_server = config.provider.tile_server,
        client_name = config.provider.client_name,
        contact = config.provider.contact,
        timeout = config.provider.timeout,
        max_zoom = config.provider.max_zoom,
        max_tiles = config.download.max_tiles,
        concurrency = config.download.concurrency,
        max_retries = config.download.max_retries,
        retry_delay_ms = config.download.retry_delay_ms,
        max_bytes_in_flight = format_size(config.download.max_bytes_in_flight),
        average_tile_size = format_size(config.download.average_tile_size),
        directory = config.storage.directory.display(),
    )
}
