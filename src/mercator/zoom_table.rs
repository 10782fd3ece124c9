//! Per-zoom reference table for 256 px slippy-map tiles.
//!
//! The table is built once on first access and is read-only afterwards.

use std::sync::LazyLock;

use serde::Serialize;

use super::transform::ground_resolution;
use super::DEFAULT_TILE_SIZE;

/// Highest zoom level covered by the table.
pub const MAX_ZOOM: u8 = 20;

/// Published map scale denominators (1 : N) for zoom 0..=20.
const SCALE_DENOMINATORS: [f64; MAX_ZOOM as usize + 1] = [
    500_000_000.0,
    250_000_000.0,
    150_000_000.0,
    70_000_000.0,
    35_000_000.0,
    15_000_000.0,
    10_000_000.0,
    4_000_000.0,
    2_000_000.0,
    1_000_000.0,
    500_000.0,
    250_000.0,
    125_000.0,
    62_500.0,
    32_000.0,
    16_000.0,
    8_000.0,
    4_000.0,
    2_000.0,
    1_000.0,
    500.0,
];

/// Reference figures for one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomLevel {
    pub zoom: u8,
    /// Number of tiles covering the world (4^zoom)
    pub tiles: u64,
    /// Width of one tile in degrees of longitude
    pub tile_width: f64,
    /// Ground resolution at the equator
    pub meters_per_pixel: f64,
    pub scale_denominator: f64,
}

/// Zoom levels 0 through [`MAX_ZOOM`], indexed by zoom.
pub static ZOOM_LEVELS: LazyLock<Vec<ZoomLevel>> = LazyLock::new(|| {
    (0..=MAX_ZOOM)
        .map(|zoom| ZoomLevel {
            zoom,
            tiles: 1u64 << (2 * zoom as u32),
            tile_width: 360.0 / (zoom as f64).exp2(),
            meters_per_pixel: ground_resolution(0.0, zoom as f64, DEFAULT_TILE_SIZE),
            scale_denominator: SCALE_DENOMINATORS[zoom as usize],
        })
        .collect()
});

/// Look up the reference row for a zoom level.
pub fn zoom_level(zoom: u8) -> Option<&'static ZoomLevel> {
    ZOOM_LEVELS.get(zoom as usize)
}
