//! # flightmap
//!
//! Web Mercator coordinate math and a disk-backed, rate-limited map tile cache.
//!
//! This library turns geographic extents into map imagery for overlaying
//! airports, runways and flight tracks. It converts between geographic,
//! pixel, tile and quadkey coordinates, and stitches slippy-map tiles from a
//! public provider into composed images that are cached on disk.
//!
//! ## Features
//!
//! - **Coordinate engine**: Pixel, geographic, tile and quadkey conversions with clipping
//! - **Best-fit views**: Center and fractional zoom for a bounding box in a viewport
//! - **Polite fetching**: Identifying User-Agent and a fixed pause after every download
//! - **Two-level disk cache**: Single tiles and composed images, written atomically
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`mercator`] - Coordinate transforms, quadkeys, view fitting, zoom table
//! - [`io`] - Tile transport trait and the HTTP fetcher
//! - [`tile`] - Tile stores, PNG codec, rate limiter and the tile cache
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use flightmap::{CacheConfig, GeoPoint, HttpTileFetcher, TileCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = HttpTileFetcher::new("my-app/1.0 (ops@example.com)", None)?;
//!     let cache = TileCache::open(CacheConfig::default(), fetcher).await?;
//!
//!     let composed = cache
//!         .composed_image(
//!             "schiphol",
//!             GeoPoint::new(52.366544, 4.825636),
//!             GeoPoint::new(52.363799, 4.832556),
//!             17,
//!         )
//!         .await?;
//!
//!     let runway = composed.geo_to_image_pixel(GeoPoint::new(52.3650, 4.8290));
//!     println!("runway at {:.0},{:.0} in {}", runway.x, runway.y, composed.path.display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod mercator;
pub mod tile;

// Re-export commonly used types
pub use config::{Cli, Command, ComposeConfig, OutputFormat, QuadkeysConfig, ViewConfig};
pub use error::{BoundsError, CacheError, FetchError, QuadkeyError};
pub use io::{HttpTileFetcher, TileFetcher};
pub use mercator::{
    best_view, geo_to_pixel, geo_to_tile, ground_resolution, map_scale, map_size, pixel_to_geo,
    pixel_to_tile, quadkey_to_tile, quadkeys_for_bounds, quadkeys_for_view, scale_pixel,
    scale_pixels, tile_bounding_box, tile_to_pixel, tile_to_quadkey, BoundingBox, GeoPoint,
    MapView, PixelPoint, TileIndex, TileRange, ZoomLevel, MAX_ZOOM, ZOOM_LEVELS,
};
pub use tile::{CacheConfig, ComposedImage, PngCodec, RasterCodec, RateLimiter, TileCache};
