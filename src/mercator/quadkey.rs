//! Quadkey encoding and bounding-box tile enumeration.
//!
//! A quadkey is the base-4 path from the root tile down to a tile: one digit
//! per zoom level, most significant level first. Each digit packs one bit of
//! the x index (value 1) and one bit of the y index (value 2).

use crate::error::QuadkeyError;

use super::transform::geo_to_tile;
use super::types::{BoundingBox, GeoPoint, TileIndex};

/// Longest quadkey that still fits 32-bit tile indices.
pub const MAX_QUADKEY_LEN: usize = 32;

/// Encode a tile index as a quadkey.
pub fn tile_to_quadkey(tile_x: u32, tile_y: u32, zoom: u8) -> String {
    (1..=zoom as u32)
        .rev()
        .map(|i| {
            let mask = 1u32.checked_shl(i - 1).unwrap_or(0);
            let mut digit = b'0';
            if tile_x & mask != 0 {
                digit += 1;
            }
            if tile_y & mask != 0 {
                digit += 2;
            }
            digit as char
        })
        .collect()
}

/// Decode a quadkey into its tile index. The zoom level is the key length.
pub fn quadkey_to_tile(quadkey: &str) -> Result<TileIndex, QuadkeyError> {
    let zoom = quadkey.len();
    if zoom > MAX_QUADKEY_LEN {
        return Err(QuadkeyError::TooLong {
            len: zoom,
            max: MAX_QUADKEY_LEN,
        });
    }

    let mut tile_x = 0u32;
    let mut tile_y = 0u32;
    for (position, digit) in quadkey.chars().enumerate() {
        let mask = 1u32 << (zoom - position - 1);
        match digit {
            '0' => {}
            '1' => tile_x |= mask,
            '2' => tile_y |= mask,
            '3' => {
                tile_x |= mask;
                tile_y |= mask;
            }
            _ => return Err(QuadkeyError::InvalidDigit { digit, position }),
        }
    }

    Ok(TileIndex::new(tile_x, tile_y, zoom as u8))
}

/// Quadkeys of every tile intersecting `bounds` at `zoom`.
///
/// The result is the full cross product of the covering columns and rows,
/// column by column, with no tile listed twice. A box with `west > east`
/// wraps across the antimeridian; when the wrapped span meets itself every
/// column is covered once.
pub fn quadkeys_for_bounds(bounds: &BoundingBox, zoom: u8, tile_size: u32) -> Vec<String> {
    let top_left = geo_to_tile(GeoPoint::new(bounds.north, bounds.west), zoom, tile_size);
    let bottom_right = geo_to_tile(GeoPoint::new(bounds.south, bounds.east), zoom, tile_size);

    let (min_y, max_y) = (
        top_left.y.min(bottom_right.y),
        top_left.y.max(bottom_right.y),
    );

    let columns: Vec<u32> = if bounds.crosses_antimeridian() {
        let last_column = ((1u64 << zoom.min(32)) - 1) as u32;
        if top_left.x as u64 <= bottom_right.x as u64 + 1 {
            (0..=last_column).collect()
        } else {
            (top_left.x..=last_column).chain(0..=bottom_right.x).collect()
        }
    } else {
        (top_left.x.min(bottom_right.x)..=top_left.x.max(bottom_right.x)).collect()
    };

    let mut keys = Vec::with_capacity(columns.len() * (max_y - min_y + 1) as usize);
    for x in columns {
        for y in min_y..=max_y {
            keys.push(tile_to_quadkey(x, y, zoom));
        }
    }
    keys
}

// =============================================================================
// Tests
// =============================================================================
