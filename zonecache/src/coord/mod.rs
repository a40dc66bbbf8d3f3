//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator slippy-map tile coordinates, plus enumeration of the
//! tiles covering a bounding box.

mod types;

pub use types::{
    CoordError, GeoBounds, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to the tile containing them.
///
/// The latitude must be inside the Web Mercator range; callers validate
/// beforehand. Results are clamped into `0..2^zoom` so the east edge
/// (`lng = 180`) and the Mercator limits land on the last tile.
#[inline]
pub fn to_tile(lat: f64, lng: f64, zoom: u8) -> TileCoord {
    let n = 2.0_f64.powi(zoom as i32);
    let max_index = n - 1.0;

    let x = ((lng + 180.0) / 360.0 * n).floor().clamp(0.0, max_index);

    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n)
        .floor()
        .clamp(0.0, max_index);

    TileCoord {
        zoom,
        x: x as u32,
        y: y as u32,
    }
}

/// Validating variant of [`to_tile`].
pub fn try_to_tile(lat: f64, lng: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lng) {
        return Err(CoordError::InvalidLongitude(lng));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    Ok(to_tile(lat, lng, zoom))
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lng(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lng = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

    (lat, lng)
}

/// Checks that every zoom level is supported.
pub fn validate_zoom_levels(zoom_levels: &[u8]) -> Result<(), CoordError> {
    match zoom_levels.iter().find(|z| **z > MAX_ZOOM) {
        Some(z) => Err(CoordError::InvalidZoom(*z)),
        None => Ok(()),
    }
}

/// Corner tiles `(north-west, south-east)` of `bounds` at `zoom`.
///
/// Latitudes beyond the Mercator limit are clamped first.
pub fn corner_tiles(bounds: &GeoBounds, zoom: u8) -> (TileCoord, TileCoord) {
    let north = bounds.north.clamp(MIN_LAT, MAX_LAT);
    let south = bounds.south.clamp(MIN_LAT, MAX_LAT);
    (
        to_tile(north, bounds.west, zoom),
        to_tile(south, bounds.east, zoom),
    )
}

/// Enumerates every tile covering `bounds` at each of `zoom_levels`.
///
/// Tiles are ordered zoom-major, then by column, then by row. Repeated zoom
/// levels are enumerated once; zoom levels above [`MAX_ZOOM`] are skipped.
/// Antimeridian-crossing boxes are not special-cased.
pub fn tiles_for_bounds(bounds: &GeoBounds, zoom_levels: &[u8]) -> Vec<TileCoord> {
    let mut tiles = Vec::with_capacity(count_tiles_for_bounds(bounds, zoom_levels) as usize);

    for zoom in distinct_zooms(zoom_levels) {
        let (nw, se) = corner_tiles(bounds, zoom);
        for x in nw.x..=se.x {
            for y in nw.y..=se.y {
                tiles.push(TileCoord { zoom, x, y });
            }
        }
    }

    tiles
}

/// Number of tiles [`tiles_for_bounds`] would return, without allocating.
pub fn count_tiles_for_bounds(bounds: &GeoBounds, zoom_levels: &[u8]) -> u64 {
    distinct_zooms(zoom_levels)
        .map(|zoom| {
            let (nw, se) = corner_tiles(bounds, zoom);
            let cols = u64::from(se.x.saturating_sub(nw.x)) + 1;
            let rows = u64::from(se.y.saturating_sub(nw.y)) + 1;
            cols * rows
        })
        .sum()
}

fn distinct_zooms(zoom_levels: &[u8]) -> impl Iterator<Item = u8> + '_ {
    zoom_levels
        .iter()
        .enumerate()
        .filter(move |(i, z)| **z <= MAX_ZOOM && !zoom_levels[..*i].contains(z))
        .map(|(_, z)| *z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let tile = to_tile(40.7128, -74.0060, 16);
        assert_eq!(tile.x, 19295);
        assert_eq!(tile.y, 24640);
        assert_eq!(tile.zoom, 16);
    }

    #[test]
    fn test_zoom_zero_is_single_tile() {
        assert_eq!(to_tile(0.0, 0.0, 0), TileCoord::new(0, 0, 0));
        assert_eq!(to_tile(MAX_LAT, MAX_LON, 0), TileCoord::new(0, 0, 0));
        assert_eq!(to_tile(MIN_LAT, MIN_LON, 0), TileCoord::new(0, 0, 0));
    }

    #[test]
    fn test_east_edge_clamps_to_last_column() {
        let tile = to_tile(0.0, 180.0, 4);
        assert_eq!(tile.x, 15);
    }

    #[test]
    fn test_try_to_tile_rejects_invalid_latitude() {
        let result = try_to_tile(90.0, 0.0, 10);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_try_to_tile_rejects_invalid_zoom() {
        let result = try_to_tile(10.0, 10.0, MAX_ZOOM + 1);
        assert!(matches!(result, Err(CoordError::InvalidZoom(_))));
    }

    #[test]
    fn test_tile_to_lat_lng_northwest_corner() {
        let tile = TileCoord::new(16, 19295, 24640);
        let (lat, lng) = tile_to_lat_lng(&tile);

        assert!((lat - 40.713).abs() < 0.01, "latitude near 40.713, got {lat}");
        assert!((lng - (-74.007)).abs() < 0.01, "longitude near -74.007, got {lng}");
    }

    #[test]
    fn test_tile_to_lat_lng_at_equator() {
        let tile = TileCoord::new(10, 512, 512);
        let (lat, lng) = tile_to_lat_lng(&tile);
        assert!(lat.abs() < 1e-9);
        assert!(lng.abs() < 1e-9);
    }

    #[test]
    fn test_tiles_for_paris_box_at_zoom_10() {
        let bounds = GeoBounds::new(49.0, 48.0, 3.0, 2.0);
        let tiles = tiles_for_bounds(&bounds, &[10]);

        let (nw, se) = corner_tiles(&bounds, 10);
        assert_eq!(nw, TileCoord::new(10, 517, 351));
        assert_eq!(se, TileCoord::new(10, 520, 355));
        assert_eq!(tiles.len(), 4 * 5);
        assert_eq!(tiles.first(), Some(&nw));
        assert_eq!(tiles.last(), Some(&se));
    }

    #[test]
    fn test_tiles_for_bounds_multiple_zooms() {
        let bounds = GeoBounds::new(49.0, 48.0, 3.0, 2.0);
        let tiles = tiles_for_bounds(&bounds, &[8, 10]);
        let z8 = tiles.iter().filter(|t| t.zoom == 8).count();
        let z10 = tiles.iter().filter(|t| t.zoom == 10).count();
        assert_eq!(z10, 20);
        assert_eq!(z8 + z10, tiles.len());
        assert!(tiles.iter().take(z8).all(|t| t.zoom == 8));
    }

    #[test]
    fn test_tiles_for_bounds_ignores_repeated_zoom() {
        let bounds = GeoBounds::new(49.0, 48.0, 3.0, 2.0);
        assert_eq!(
            tiles_for_bounds(&bounds, &[10, 10]).len(),
            tiles_for_bounds(&bounds, &[10]).len()
        );
    }

    #[test]
    fn test_point_bounds_yield_one_tile_per_zoom() {
        let bounds = GeoBounds::new(51.5, 51.5, -0.12, -0.12);
        let tiles = tiles_for_bounds(&bounds, &[3, 12, 17]);
        assert_eq!(tiles.len(), 3);
    }

    #[test]
    fn test_count_matches_enumeration() {
        let bounds = GeoBounds::new(60.0, -10.0, 40.0, -20.0);
        let zooms = [2, 5, 7];
        assert_eq!(
            count_tiles_for_bounds(&bounds, &zooms),
            tiles_for_bounds(&bounds, &zooms).len() as u64
        );
    }

    #[test]
    fn test_validate_zoom_levels() {
        assert!(validate_zoom_levels(&[0, 10, MAX_ZOOM]).is_ok());
        assert_eq!(
            validate_zoom_levels(&[10, 30]),
            Err(CoordError::InvalidZoom(30))
        );
    }

    #[test]
    fn test_bounds_validation() {
        assert!(GeoBounds::new(49.0, 48.0, 3.0, 2.0).is_valid());
        assert!(!GeoBounds::new(48.0, 49.0, 3.0, 2.0).is_valid());
        assert!(!GeoBounds::new(91.0, 48.0, 3.0, 2.0).is_valid());
        assert!(!GeoBounds::new(49.0, 48.0, 181.0, 2.0).is_valid());
        assert!(!GeoBounds::new(49.0, 48.0, -170.0, 170.0).is_valid());
        assert!(!GeoBounds::new(f64::NAN, 48.0, 3.0, 2.0).is_valid());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_roundtrip_within_one_tile(
                lat in -85.05..85.05_f64,
                lng in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let tile = to_tile(lat, lng, zoom);
                let (corner_lat, corner_lng) = tile_to_lat_lng(&tile);

                let tile_size = 360.0 / (2.0_f64.powi(zoom as i32));

                prop_assert!(
                    (corner_lat - lat).abs() < tile_size,
                    "latitude roundtrip failed: {} -> {} (tile_size {})",
                    lat, corner_lat, tile_size
                );
                prop_assert!(
                    (corner_lng - lng).abs() < tile_size,
                    "longitude roundtrip failed: {} -> {} (tile_size {})",
                    lng, corner_lng, tile_size
                );
            }

            #[test]
            fn test_tile_in_grid(
                lat in -85.05..85.05_f64,
                lng in -180.0..=180.0_f64,
                zoom in 0u8..=MAX_ZOOM
            ) {
                let tile = to_tile(lat, lng, zoom);
                prop_assert!(tile.is_valid(), "tile {} outside grid", tile);
            }

            #[test]
            fn test_rectangle_count_formula(
                south in -80.0..80.0_f64,
                height in 0.0..5.0_f64,
                west in -179.0..170.0_f64,
                width in 0.0..9.0_f64,
                zoom in 0u8..=12
            ) {
                let bounds = GeoBounds::new((south + height).min(85.0), south, west + width, west);
                let (nw, se) = corner_tiles(&bounds, zoom);
                let expected = (se.x - nw.x + 1) as usize * (se.y - nw.y + 1) as usize;
                prop_assert_eq!(tiles_for_bounds(&bounds, &[zoom]).len(), expected);
            }

            #[test]
            fn test_longitude_monotonic(
                lat in 0.0..1.0_f64,
                lng1 in -180.0..-90.0_f64,
                lng2 in -90.0..0.0_f64,
                zoom in 10u8..=15
            ) {
                let tile1 = to_tile(lat, lng1, zoom);
                let tile2 = to_tile(lat, lng2, zoom);
                prop_assert!(tile1.x < tile2.x);
            }
        }
    }
}
