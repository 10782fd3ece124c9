//! Tile cache orchestration.
//!
//! [`TileCache`] ties the stores, the fetcher, the codec and the rate limiter
//! together. It answers two questions:
//!
//! - where is tile `(x, y, zoom)` on disk? ([`TileCache::fetch_tile`])
//! - what does the map look like between these two points?
//!   ([`TileCache::composed_image`])
//!
//! Composed images are keyed by the tile range a request snaps to, so two
//! requests whose corners round out to the same tiles share one entry.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use tokio::fs;
use tracing::{debug, info};

use super::codec::{blank_canvas, paste_tile, PngCodec, RasterCodec};
use super::rate_limit::{RateLimiter, DEFAULT_RATE_LIMIT};
use super::store::{ComposedImageKey, ImageStore, TileStore};
use crate::error::CacheError;
use crate::io::TileFetcher;
use crate::mercator::{
    geo_to_pixel, tile_to_pixel, BoundingBox, GeoPoint, PixelPoint, TileIndex, TileRange,
    DEFAULT_TILE_SIZE, MAX_ZOOM,
};

/// Default directory for single tiles.
pub const DEFAULT_TILE_DIR: &str = "tilecache/osm";

/// Default directory for composed images.
pub const DEFAULT_IMAGE_DIR: &str = "imagecache/osm";

/// Default OpenStreetMap tile server.
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org";

/// Largest RGBA buffer a composed image may allocate (1 GiB).
///
/// Larger requests fail with [`CacheError::ImageTooLarge`] before any tile
/// is fetched.
pub const MAX_IMAGE_BYTES: u64 = 1 << 30;

// =============================================================================
// Configuration
// =============================================================================

/// Settings for opening a [`TileCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub tile_dir: PathBuf,
    pub image_dir: PathBuf,
    /// Provider base URL; tiles are requested at `{base_url}/{zoom}/{x}/{y}.png`
    pub base_url: String,
    /// Pause after each network fetch
    pub rate_limit: Duration,
    pub tile_size: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            tile_dir: PathBuf::from(DEFAULT_TILE_DIR),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            base_url: DEFAULT_TILE_URL.to_string(),
            rate_limit: DEFAULT_RATE_LIMIT,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

// =============================================================================
// Composed Image
// =============================================================================

/// A raster stitched from a rectangle of tiles.
#[derive(Debug, Clone)]
pub struct ComposedImage {
    pub image: RgbaImage,
    /// Geographic extent of `image`, snapped to tile edges
    pub bounds: BoundingBox,
    pub tiles: TileRange,
    /// Location of the cached PNG
    pub path: PathBuf,
    /// Whether the image was loaded from the image store
    pub cache_hit: bool,
    tile_size: u32,
}

impl ComposedImage {
    /// Position of `geo` inside [`Self::image`], in pixels from its top-left corner.
    ///
    /// Points outside the snapped bounds yield coordinates outside the image.
    pub fn geo_to_image_pixel(&self, geo: GeoPoint) -> PixelPoint {
        let global = geo_to_pixel(geo, self.tiles.zoom(), self.tile_size);
        let origin = tile_to_pixel(self.tiles.min.x, self.tiles.min.y, self.tile_size);
        PixelPoint::new(global.x - origin.x, global.y - origin.y)
    }
}

// =============================================================================
// Tile Cache
// =============================================================================

/// Disk-backed tile cache and compositor.
///
/// Tiles are fetched one at a time. After each network fetch the cache waits
/// on its [`RateLimiter`]; tiles already on disk are returned immediately.
///
/// # Example
///
/// ```ignore
/// use flightmap::io::HttpTileFetcher;
/// use flightmap::mercator::GeoPoint;
/// use flightmap::tile::{CacheConfig, TileCache};
///
/// let fetcher = HttpTileFetcher::new("my-app/1.0", None)?;
/// let cache = TileCache::open(CacheConfig::default(), fetcher).await?;
///
/// let composed = cache
///     .composed_image(
///         "schiphol",
///         GeoPoint::new(52.366544, 4.825636),
///         GeoPoint::new(52.363799, 4.832556),
///         17,
///     )
///     .await?;
/// println!("{} covers {:?}", composed.path.display(), composed.bounds);
/// ```
pub struct TileCache<F, C = PngCodec> {
    tiles: TileStore,
    images: ImageStore,
    fetcher: F,
    codec: C,
    base_url: String,
    tile_size: u32,
    limiter: Arc<RateLimiter>,
}

impl<F: TileFetcher> TileCache<F, PngCodec> {
    /// Open a cache using PNG for composed images.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::FileSystem`] if either store root cannot be created.
    pub async fn open(config: CacheConfig, fetcher: F) -> Result<Self, CacheError> {
        Self::with_codec(config, fetcher, PngCodec).await
    }
}

impl<F: TileFetcher, C: RasterCodec> TileCache<F, C> {
    /// Open a cache with a custom raster codec.
    pub async fn with_codec(config: CacheConfig, fetcher: F, codec: C) -> Result<Self, CacheError> {
        let tiles = TileStore::open(config.tile_dir).await?;
        let images = ImageStore::open(config.image_dir).await?;

        Ok(Self {
            tiles,
            images,
            fetcher,
            codec,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tile_size: config.tile_size,
            limiter: Arc::new(RateLimiter::new(config.rate_limit)),
        })
    }

    /// Share a rate limiter with other caches hitting the same provider.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn tile_store(&self) -> &TileStore {
        &self.tiles
    }

    pub fn image_store(&self) -> &ImageStore {
        &self.images
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Provider URL for a tile.
    pub fn tile_url(&self, tile: &TileIndex) -> String {
        format!("{}/{}/{}/{}.png", self.base_url, tile.zoom, tile.x, tile.y)
    }

    /// Return the on-disk path of a tile, downloading it first if needed.
    ///
    /// A download is followed by the rate-limit pause. Failed downloads are
    /// not retried and leave nothing on disk.
    pub async fn fetch_tile(&self, tile: TileIndex) -> Result<PathBuf, CacheError> {
        if self.tiles.contains(&tile).await? {
            debug!(x = tile.x, y = tile.y, zoom = tile.zoom, "Tile store hit");
            return Ok(self.tiles.tile_path(&tile));
        }

        let url = self.tile_url(&tile);
        info!(url = %url, "Fetching tile");
        let data = self.fetcher.fetch(&url).await?;
        let path = self.tiles.write(&tile, &data).await?;

        self.limiter.pause().await;
        Ok(path)
    }

    /// Build, or load from the image store, the map between two corner points.
    ///
    /// The corners may be given in any order. The returned image covers every
    /// tile touched by the box they span, so [`ComposedImage::bounds`] is
    /// generally wider than the request.
    ///
    /// # Errors
    ///
    /// - [`CacheError::InvalidZoom`] if `zoom` exceeds [`MAX_ZOOM`]
    /// - [`CacheError::InvalidName`] if `name` is not a plain directory name
    /// - [`CacheError::ImageTooLarge`] if the raster would exceed [`MAX_IMAGE_BYTES`]
    /// - [`CacheError::Fetch`] if any tile download fails; nothing is cached
    pub async fn composed_image(
        &self,
        name: &str,
        a: GeoPoint,
        b: GeoPoint,
        zoom: u8,
    ) -> Result<ComposedImage, CacheError> {
        self.composed_image_for_bounds(name, &BoundingBox::from_corners(a, b), zoom)
            .await
    }

    /// Same as [`Self::composed_image`] for an explicit bounding box.
    ///
    /// # Errors
    ///
    /// - [`CacheError::CrossesAntimeridian`] if `bounds.west > bounds.east`
    /// - [`CacheError::ImageTooLarge`] if the raster would exceed [`MAX_IMAGE_BYTES`]
    /// - otherwise as [`Self::composed_image`]
    pub async fn composed_image_for_bounds(
        &self,
        name: &str,
        bounds: &BoundingBox,
        zoom: u8,
    ) -> Result<ComposedImage, CacheError> {
        if bounds.crosses_antimeridian() {
            return Err(CacheError::CrossesAntimeridian {
                west: bounds.west,
                east: bounds.east,
            });
        }
        if zoom > MAX_ZOOM {
            return Err(CacheError::InvalidZoom {
                zoom,
                max: MAX_ZOOM,
            });
        }

        let range = TileRange::covering(bounds, zoom, self.tile_size);
        let key = ComposedImageKey::new(name, range)?;
        let snapped = range.bounding_box(self.tile_size);

        if self.images.contains(&key).await? {
            let path = self.images.image_path(&key);
            let data = self.images.read(&key).await?;
            let image = self.decode(&data, &path)?;
            info!(path = %path.display(), "Reusing composed image");
            return Ok(self.finish(image, snapped, range, path, true));
        }

        let image = self.compose(&range).await?;
        let encoded = self
            .codec
            .encode(&image)
            .map_err(|e| CacheError::Encode {
                message: e.to_string(),
            })?;
        let path = self.images.write(&key, &encoded).await?;
        info!(path = %path.display(), "Saved composed image");

        Ok(self.finish(image, snapped, range, path, false))
    }

    /// Fetch every tile of `range` in row-major order and stitch them.
    async fn compose(&self, range: &TileRange) -> Result<RgbaImage, CacheError> {
        let too_large = || CacheError::ImageTooLarge {
            width_tiles: range.width(),
            height_tiles: range.height(),
        };
        let width = range.width().checked_mul(self.tile_size).ok_or_else(too_large)?;
        let height = range.height().checked_mul(self.tile_size).ok_or_else(too_large)?;
        if width as u64 * height as u64 * 4 > MAX_IMAGE_BYTES {
            return Err(too_large());
        }

        info!(
            width,
            height,
            tiles = range.tile_count(),
            zoom = range.zoom(),
            "Creating composed image"
        );

        let mut canvas = blank_canvas(width, height);
        for tile in range.iter() {
            let path = self.fetch_tile(tile).await?;
            let data = fs::read(&path)
                .await
                .map_err(|e| CacheError::file_system(&path, e))?;
            let decoded = self.decode(&data, &path)?;

            let dx = (tile.x - range.min.x) * self.tile_size;
            let dy = (tile.y - range.min.y) * self.tile_size;
            paste_tile(&mut canvas, &decoded, dx, dy);
        }

        Ok(canvas)
    }

    fn decode(&self, data: &[u8], path: &Path) -> Result<RgbaImage, CacheError> {
        self.codec.decode(data).map_err(|e| CacheError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn finish(
        &self,
        image: RgbaImage,
        bounds: BoundingBox,
        tiles: TileRange,
        path: PathBuf,
        cache_hit: bool,
    ) -> ComposedImage {
        ComposedImage {
            image,
            bounds,
            tiles,
            path,
            cache_hit,
            tile_size: self.tile_size,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
