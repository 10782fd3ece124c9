//! Web Mercator coordinate transforms.
//!
//! This module converts between the four coordinate spaces of a slippy map:
//!
//! ```text
//!   GeoPoint (lat, lon)  ──geo_to_pixel──▶  PixelPoint (x, y @ zoom)
//!          ▲                                       │
//!          └───────────pixel_to_geo────────────────┤
//!                                                  ▼ pixel_to_tile
//!   Quadkey "213"  ◀──tile_to_quadkey──  TileIndex (x, y, zoom)
//! ```
//!
//! Everything here is pure and deterministic, and safe to call from any
//! thread. Inputs outside the valid domain are clipped rather than rejected.
//!
//! # Components
//!
//! - [`transform`]: projection, resolution and scale math
//! - [`quadkey`]: quadkey encoding and bounding-box enumeration
//! - [`view`]: best-fit view and viewport enumeration
//! - [`zoom_table`]: per-zoom reference table
//!
//! # Example
//!
//! ```
//! use flightmap::mercator::{geo_to_tile, tile_to_quadkey, GeoPoint};
//!
//! let tile = geo_to_tile(GeoPoint::new(52.3676, 4.9041), 10, 256);
//! let key = tile_to_quadkey(tile.x, tile.y, tile.zoom);
//! assert_eq!(key.len(), 10);
//! ```

pub mod quadkey;
pub mod transform;
mod types;
pub mod view;
pub mod zoom_table;

pub use quadkey::{quadkey_to_tile, quadkeys_for_bounds, tile_to_quadkey, MAX_QUADKEY_LEN};
pub use transform::{
    geo_to_pixel, geo_to_tile, ground_resolution, map_scale, map_size, pixel_to_geo,
    pixel_to_tile, scale_pixel, scale_pixels, tile_bounding_box, tile_to_pixel,
};
pub use types::{BoundingBox, GeoPoint, MapView, PixelPoint, TileIndex, TileRange};
pub use view::{best_view, quadkeys_for_view};
pub use zoom_table::{zoom_level, ZoomLevel, MAX_ZOOM, ZOOM_LEVELS};

/// Earth radius used by spherical Mercator, in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Northern limit of the projection, in degrees.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Southern limit of the projection, in degrees.
pub const MIN_LATITUDE: f64 = -85.051_128_78;

pub const MAX_LONGITUDE: f64 = 180.0;

pub const MIN_LONGITUDE: f64 = -180.0;

/// Default square tile size in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;
