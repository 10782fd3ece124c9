//! Value types shared by the coordinate transforms and the tile cache.

use serde::Serialize;

use crate::error::BoundsError;

use super::transform::{geo_to_tile, tile_bounding_box};
use super::{MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE};

// =============================================================================
// Points
// =============================================================================

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Clip latitude into the Mercator-valid range and longitude into [-180, 180].
    pub fn clipped(self) -> Self {
        Self {
            lat: self.lat.clamp(MIN_LATITUDE, MAX_LATITUDE),
            lon: self.lon.clamp(MIN_LONGITUDE, MAX_LONGITUDE),
        }
    }
}

/// A position in global pixel space at some zoom level.
///
/// The origin is the top-left corner of the world map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// Tiles
// =============================================================================

/// Address of a single map tile in XYZ (top-left origin) scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileIndex {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileIndex {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Quadkey of this tile.
    pub fn quadkey(&self) -> String {
        super::quadkey::tile_to_quadkey(self.x, self.y, self.zoom)
    }
}

/// Inclusive rectangle of tiles at one zoom level.
///
/// `min` is the top-left tile and `max` the bottom-right tile. The range is
/// what a bounding box snaps to when it is rounded out to whole tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileRange {
    pub min: TileIndex,
    pub max: TileIndex,
}

impl TileRange {
    /// Build a range from two corner tile coordinates, in any order.
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32, zoom: u8) -> Self {
        Self {
            min: TileIndex::new(x0.min(x1), y0.min(y1), zoom),
            max: TileIndex::new(x0.max(x1), y0.max(y1), zoom),
        }
    }

    /// The tiles covering `bounds` at `zoom`.
    ///
    /// The top-left tile contains the (north, west) corner and the
    /// bottom-right tile contains the (south, east) corner.
    pub fn covering(bounds: &BoundingBox, zoom: u8, tile_size: u32) -> Self {
        let top_left = geo_to_tile(GeoPoint::new(bounds.north, bounds.west), zoom, tile_size);
        let bottom_right = geo_to_tile(GeoPoint::new(bounds.south, bounds.east), zoom, tile_size);
        Self::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y, zoom)
    }

    pub fn zoom(&self) -> u8 {
        self.min.zoom
    }

    /// Number of tile columns.
    pub fn width(&self) -> u32 {
        self.max.x - self.min.x + 1
    }

    /// Number of tile rows.
    pub fn height(&self) -> u32 {
        self.max.y - self.min.y + 1
    }

    /// Total number of tiles in the range. Never zero.
    pub fn tile_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn contains(&self, tile: &TileIndex) -> bool {
        tile.zoom == self.zoom()
            && (self.min.x..=self.max.x).contains(&tile.x)
            && (self.min.y..=self.max.y).contains(&tile.y)
    }

    /// Iterate the tiles in row-major order (top row first, left to right).
    pub fn iter(&self) -> impl Iterator<Item = TileIndex> {
        let (min_x, max_x) = (self.min.x, self.max.x);
        let zoom = self.zoom();
        // The column range is rebuilt for every row.
        (self.min.y..=self.max.y)
            .flat_map(move |y| (min_x..=max_x).map(move |x| TileIndex::new(x, y, zoom)))
    }

    /// Geographic extent of the whole range, snapped to tile edges.
    pub fn bounding_box(&self, tile_size: u32) -> BoundingBox {
        let nw = tile_bounding_box(self.min.x, self.min.y, self.zoom(), tile_size);
        let se = tile_bounding_box(self.max.x, self.max.y, self.zoom(), tile_size);
        BoundingBox {
            west: nw.west,
            south: se.south,
            east: se.east,
            north: nw.north,
        }
    }
}

// =============================================================================
// Bounding Box
// =============================================================================

/// A `(west, south, east, north)` rectangle in degrees.
///
/// `west > east` means the box crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Smallest box containing two arbitrary corner points.
    pub fn from_corners(a: GeoPoint, b: GeoPoint) -> Self {
        Self {
            west: a.lon.min(b.lon),
            south: a.lat.min(b.lat),
            east: a.lon.max(b.lon),
            north: a.lat.max(b.lat),
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Arithmetic center of the box, wrapped into [-180, 180) when it
    /// crosses the antimeridian.
    pub fn center(&self) -> GeoPoint {
        let lat = (self.south + self.north) / 2.0;
        let lon = if self.crosses_antimeridian() {
            ((self.west + self.east) / 2.0 + 360.0).rem_euclid(360.0) - 180.0
        } else {
            (self.west + self.east) / 2.0
        };
        GeoPoint::new(lat, lon)
    }

    pub fn north_west(&self) -> GeoPoint {
        GeoPoint::new(self.north, self.west)
    }

    pub fn south_east(&self) -> GeoPoint {
        GeoPoint::new(self.south, self.east)
    }

    /// `[west, south, east, north]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}

impl TryFrom<&[f64]> for BoundingBox {
    type Error = BoundsError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        match values {
            [west, south, east, north, ..] => Ok(Self::new(*west, *south, *east, *north)),
            _ => Err(BoundsError::TooFewComponents { got: values.len() }),
        }
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

// =============================================================================
// Map View
// =============================================================================

/// A center and fractional zoom level for displaying a region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: f64,
}

// =============================================================================
// Tests
// =============================================================================
