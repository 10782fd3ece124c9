use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised when a raw bounding box cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundsError {
    /// Bounding boxes are `[west, south, east, north]`; anything shorter is unusable
    #[error("Bounding box needs 4 components (west, south, east, north), got {got}")]
    TooFewComponents { got: usize },
}

/// Errors raised when decoding a quadkey string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuadkeyError {
    /// Quadkey digits are limited to '0'..='3'
    #[error("Invalid quadkey digit '{digit}' at position {position}")]
    InvalidDigit { digit: char, position: usize },

    /// Tile coordinates are 32-bit, so a quadkey has at most 32 digits
    #[error("Quadkey too long: {len} digits (maximum is {max})")]
    TooLong { len: usize, max: usize },
}

/// Errors that can occur when fetching a tile from the remote provider
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The provider answered with a non-success status
    #[error("Tile provider returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Errors that can occur in the tile cache
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Creating directories or reading/writing cache files failed
    #[error("File system error at {}: {message}", path.display())]
    FileSystem { path: PathBuf, message: String },

    /// A tile could not be fetched from the network
    #[error("Tile fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A cached tile or composed image is not a decodable raster
    #[error("Failed to decode image {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// A composed image could not be encoded
    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    /// Requested zoom level is beyond the zoom table
    #[error("Invalid zoom level {zoom}: maximum is {max}")]
    InvalidZoom { zoom: u8, max: u8 },

    /// Image names become directory names, so path separators are rejected
    #[error("Invalid image name '{name}': must be non-empty and contain no path separators")]
    InvalidName { name: String },

    /// The composed raster would exceed `MAX_IMAGE_BYTES` or the image buffer's
    /// u32 dimensions
    #[error("Composed image too large: {width_tiles}x{height_tiles} tiles")]
    ImageTooLarge { width_tiles: u32, height_tiles: u32 },

    /// Composed images are single rectangles and cannot wrap past 180 degrees
    #[error("Bounds cross the antimeridian (west {west} > east {east}); compose each side separately")]
    CrossesAntimeridian { west: f64, east: f64 },
}

impl CacheError {
    pub(crate) fn file_system(path: &Path, err: std::io::Error) -> Self {
        CacheError::FileSystem {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
