//! Fitting geographic regions into a pixel viewport.

use std::f64::consts::PI;

use tracing::debug;

use super::quadkey::quadkeys_for_bounds;
use super::transform::{geo_to_tile, pixel_to_geo};
use super::types::{BoundingBox, GeoPoint, MapView, PixelPoint};
use super::zoom_table::MAX_ZOOM;

/// Empirical scale between the Mercator y span and the vertical zoom factor.
const VERTICAL_ZOOM_FACTOR: f64 = 40.743_665_431_525_61;

/// View returned when the bounds cannot be interpreted.
const FALLBACK_VIEW: MapView = MapView {
    center: GeoPoint { lat: 0.0, lon: 0.0 },
    zoom: 1.0,
};

/// Mercator y of a latitude in degrees.
fn mercator_y(lat: f64) -> f64 {
    (PI * (0.25 + lat / 360.0)).tan().ln()
}

/// Best center and fractional zoom for showing `bounds` on a
/// `map_width` x `map_height` viewport with `padding` pixels on each side.
///
/// `bounds` is `[west, south, east, north]`. Fewer than four values yield the
/// fallback view centered on (0, 0) at zoom 1. A box whose east edge is not
/// greater than its west edge is treated as crossing the antimeridian.
pub fn best_view(
    bounds: &[f64],
    map_width: f64,
    map_height: f64,
    padding: f64,
    tile_size: u32,
) -> MapView {
    let bounds = match BoundingBox::try_from(bounds) {
        Ok(bounds) => bounds,
        Err(e) => {
            debug!("Using fallback view: {}", e);
            return FALLBACK_VIEW;
        }
    };

    let (width, center_lon) = if bounds.east > bounds.west {
        (bounds.east - bounds.west, (bounds.east + bounds.west) / 2.0)
    } else {
        (
            360.0 - (bounds.west - bounds.east),
            ((bounds.east + bounds.west) / 2.0 + 360.0).rem_euclid(360.0) - 180.0,
        )
    };

    let center_y = (mercator_y(bounds.south) + mercator_y(bounds.north)) / 2.0;
    let center_lat = center_y.sinh().atan().to_degrees();

    let horizontal_resolution = width / (map_width - padding * 2.0);

    let zoom_factor = (map_height * 0.5 - padding)
        / (VERTICAL_ZOOM_FACTOR * (mercator_y(bounds.north) - mercator_y(center_lat)));
    let vertical_resolution = 360.0 / (zoom_factor * tile_size as f64);

    let resolution = horizontal_resolution.max(vertical_resolution);
    let mut zoom = (360.0 / (resolution * tile_size as f64)).log2();
    if !zoom.is_finite() {
        // Degenerate (zero-area) bounds
        zoom = MAX_ZOOM as f64;
    }

    MapView {
        center: GeoPoint::new(center_lat, center_lon),
        zoom,
    }
}

/// Quadkeys of the tiles visible in a `width` x `height` viewport centered on
/// `center` at `zoom`.
pub fn quadkeys_for_view(
    center: GeoPoint,
    zoom: u8,
    width: u32,
    height: u32,
    tile_size: u32,
) -> Vec<String> {
    let tile = geo_to_tile(center, zoom, tile_size);
    let half_columns = (width / tile_size / 2) as i64;
    let half_rows = (height / tile_size / 2) as i64;

    // Tile centers, so each corner maps back into its own tile after clipping.
    let tile_center = |x: i64, y: i64| {
        PixelPoint::new(
            (x as f64 + 0.5) * tile_size as f64,
            (y as f64 + 0.5) * tile_size as f64,
        )
    };

    let top_left = pixel_to_geo(
        tile_center(tile.x as i64 - half_columns, tile.y as i64 - half_rows),
        zoom,
        tile_size,
    );
    let bottom_right = pixel_to_geo(
        tile_center(tile.x as i64 + half_columns, tile.y as i64 + half_rows),
        zoom,
        tile_size,
    );

    let bounds = BoundingBox::new(top_left.lon, bottom_right.lat, bottom_right.lon, top_left.lat);
    quadkeys_for_bounds(&bounds, zoom, tile_size)
}

// =============================================================================
// Tests
// =============================================================================
