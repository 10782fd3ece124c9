//! Spherical Mercator (EPSG:3857) tile system math.
//!
//! All functions are pure. Out-of-range inputs are clipped into the valid
//! domain before anything is computed, so none of them can fail.

use std::f64::consts::PI;

use super::types::{BoundingBox, GeoPoint, PixelPoint, TileIndex};
use super::EARTH_RADIUS;

/// Meters per inch, for converting screen DPI into map scale.
const METERS_PER_INCH: f64 = 0.0254;

/// Width and height of the world map in pixels.
///
/// Equals `tile_size * 2^zoom`; fractional zoom levels are rounded up to a
/// whole pixel count.
pub fn map_size(zoom: f64, tile_size: u32) -> f64 {
    (tile_size as f64 * zoom.exp2()).ceil()
}

/// Meters on the ground represented by one pixel.
pub fn ground_resolution(lat: f64, zoom: f64, tile_size: u32) -> f64 {
    (lat * PI / 180.0).cos() * 2.0 * PI * EARTH_RADIUS / map_size(zoom, tile_size)
}

/// Map scale denominator `N` of the ratio `1 : N` for a screen at `dpi`.
pub fn map_scale(lat: f64, zoom: f64, tile_size: u32, dpi: u32) -> f64 {
    ground_resolution(lat, zoom, tile_size) * dpi as f64 / METERS_PER_INCH
}

/// Convert a global pixel coordinate into a geographic position.
pub fn pixel_to_geo(pixel: PixelPoint, zoom: u8, tile_size: u32) -> GeoPoint {
    let size = map_size(zoom as f64, tile_size);
    let x = pixel.x.clamp(0.0, size - 1.0) / size - 0.5;
    let y = 0.5 - pixel.y.clamp(0.0, size - 1.0) / size;

    GeoPoint {
        lat: 90.0 - 360.0 * (-y * 2.0 * PI).exp().atan() / PI,
        lon: 360.0 * x,
    }
}

/// Project a geographic position into global pixel space.
pub fn geo_to_pixel(geo: GeoPoint, zoom: u8, tile_size: u32) -> PixelPoint {
    let geo = geo.clipped();
    let x = (geo.lon + 180.0) / 360.0;
    let sin_lat = (geo.lat * PI / 180.0).sin();
    let y = 0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI);

    let size = map_size(zoom as f64, tile_size);
    PixelPoint {
        x: (x * size).clamp(0.0, size - 1.0),
        y: (y * size).clamp(0.0, size - 1.0),
    }
}

/// Tile `(x, y)` containing a global pixel.
pub fn pixel_to_tile(pixel: PixelPoint, tile_size: u32) -> (u32, u32) {
    let tile_size = tile_size as f64;
    (
        (pixel.x.max(0.0) / tile_size).floor() as u32,
        (pixel.y.max(0.0) / tile_size).floor() as u32,
    )
}

/// Upper-left global pixel of a tile.
pub fn tile_to_pixel(tile_x: u32, tile_y: u32, tile_size: u32) -> PixelPoint {
    PixelPoint {
        x: tile_x as f64 * tile_size as f64,
        y: tile_y as f64 * tile_size as f64,
    }
}

/// Tile containing a geographic position.
pub fn geo_to_tile(geo: GeoPoint, zoom: u8, tile_size: u32) -> TileIndex {
    let (x, y) = pixel_to_tile(geo_to_pixel(geo, zoom, tile_size), tile_size);
    TileIndex { x, y, zoom }
}

/// Geographic extent of a tile.
pub fn tile_bounding_box(tile_x: u32, tile_y: u32, zoom: u8, tile_size: u32) -> BoundingBox {
    let top_left = tile_to_pixel(tile_x, tile_y, tile_size);
    let bottom_right = PixelPoint {
        x: top_left.x + tile_size as f64,
        y: top_left.y + tile_size as f64,
    };

    let nw = pixel_to_geo(top_left, zoom, tile_size);
    let se = pixel_to_geo(bottom_right, zoom, tile_size);

    BoundingBox {
        west: nw.lon,
        south: se.lat,
        east: se.lon,
        north: nw.lat,
    }
}

/// Rescale a global pixel from one zoom level to another.
pub fn scale_pixel(pixel: PixelPoint, old_zoom: f64, new_zoom: f64) -> PixelPoint {
    let scale = (new_zoom - old_zoom).exp2();
    PixelPoint {
        x: pixel.x * scale,
        y: pixel.y * scale,
    }
}

/// Rescale a list of global pixels from one zoom level to another.
pub fn scale_pixels(pixels: &[PixelPoint], old_zoom: f64, new_zoom: f64) -> Vec<PixelPoint> {
    pixels
        .iter()
        .map(|pixel| scale_pixel(*pixel, old_zoom, new_zoom))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
