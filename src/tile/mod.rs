//! Tile cache layer.
//!
//! This module downloads map tiles, keeps them on disk, and stitches them
//! into composed images covering a geographic extent.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   composed_image(name, a, b, zoom)      │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               TileCache                 │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  ImageStore  │  │   PNG codec     │  │
//! │  │  (composed)  │  │  (decode/paste/ │  │
//! │  │              │  │   encode)       │  │
//! │  └──────────────┘  └─────────────────┘  │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  TileStore   │  │  RateLimiter    │  │
//! │  │  (z/x/y.png) │  │  (pause/miss)   │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │ miss
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │         TileFetcher (HTTP GET)          │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileCache`]: Entry point; resolves tiles and builds composed images
//! - [`CacheConfig`]: Store roots, provider URL, rate limit, tile size
//! - [`ComposedImage`]: Stitched raster plus its snapped bounds
//! - [`TileStore`] / [`ImageStore`]: On-disk layout with atomic writes
//! - [`RasterCodec`] / [`PngCodec`]: Image decode and encode
//! - [`RateLimiter`]: Fixed pause after each network fetch

mod cache;
mod codec;
mod rate_limit;
mod store;

pub use cache::{
    CacheConfig, ComposedImage, TileCache, DEFAULT_IMAGE_DIR, DEFAULT_TILE_DIR, DEFAULT_TILE_URL,
    MAX_IMAGE_BYTES,
};
pub use codec::{blank_canvas, paste_tile, PngCodec, RasterCodec, CANVAS_BACKGROUND};
pub use rate_limit::{RateLimiter, DEFAULT_RATE_LIMIT};
pub use store::{ComposedImageKey, ImageStore, TileStore};
