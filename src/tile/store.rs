//! On-disk layout of the tile store and the composed-image store.
//!
//! ```text
//! {tile_root}/{zoom}/{x}/{y}.png
//! {image_root}/{name}/{tlx}_{tly}-{brx}_{bry}-{zoom}.png
//! ```
//!
//! Files are written once and never modified. Every write goes to a
//! temporary sibling first and is renamed into place.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::CacheError;
use crate::mercator::{TileIndex, TileRange};

const FILE_EXTENSION: &str = "png";

// =============================================================================
// Keys
// =============================================================================

/// Identity of a composed image: caller-chosen name plus snapped tile extent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComposedImageKey {
    pub name: String,
    pub range: TileRange,
}

impl ComposedImageKey {
    /// Build a key, rejecting names that would escape the image root.
    pub fn new(name: impl Into<String>, range: TileRange) -> Result<Self, CacheError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(CacheError::InvalidName { name });
        }
        Ok(Self { name, range })
    }

    /// File name within the name directory, e.g. `134585_86154-134587_86155-18.png`.
    pub fn file_name(&self) -> String {
        let TileRange { min, max } = self.range;
        format!(
            "{}_{}-{}_{}-{}.{}",
            min.x, min.y, max.x, max.y, min.zoom, FILE_EXTENSION
        )
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && !name.contains("..")
}

// =============================================================================
// Stores
// =============================================================================

/// Content-addressed store for single provider tiles.
#[derive(Debug, Clone)]
pub struct TileStore {
    root: PathBuf,
}

impl TileStore {
    /// Open the store, creating its root directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        create_dir(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tile_path(&self, tile: &TileIndex) -> PathBuf {
        self.root
            .join(tile.zoom.to_string())
            .join(tile.x.to_string())
            .join(format!("{}.{}", tile.y, FILE_EXTENSION))
    }

    pub async fn contains(&self, tile: &TileIndex) -> Result<bool, CacheError> {
        exists(&self.tile_path(tile)).await
    }

    /// Persist raw tile bytes, returning the final path.
    pub async fn write(&self, tile: &TileIndex, data: &[u8]) -> Result<PathBuf, CacheError> {
        let path = self.tile_path(tile);
        write_atomic(&path, data).await?;
        Ok(path)
    }
}

/// Store for composed images, grouped by name.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Open the store, creating its root directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        create_dir(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_path(&self, key: &ComposedImageKey) -> PathBuf {
        self.root.join(&key.name).join(key.file_name())
    }

    pub async fn contains(&self, key: &ComposedImageKey) -> Result<bool, CacheError> {
        exists(&self.image_path(key)).await
    }

    pub async fn read(&self, key: &ComposedImageKey) -> Result<Vec<u8>, CacheError> {
        let path = self.image_path(key);
        fs::read(&path)
            .await
            .map_err(|e| CacheError::file_system(&path, e))
    }

    pub async fn write(&self, key: &ComposedImageKey, data: &[u8]) -> Result<PathBuf, CacheError> {
        let path = self.image_path(key);
        write_atomic(&path, data).await?;
        Ok(path)
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn create_dir(path: &Path) -> Result<(), CacheError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| CacheError::file_system(path, e))
}

async fn exists(path: &Path) -> Result<bool, CacheError> {
    fs::try_exists(path)
        .await
        .map_err(|e| CacheError::file_system(path, e))
}

/// Write `data` to a temporary sibling of `path`, then rename it into place.
///
/// Parent directories are created as needed. On failure the temporary file
/// is removed and `path` is left untouched.
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        create_dir(parent).await?;
    }

    let tmp = temp_path(path);
    if let Err(e) = fs::write(&tmp, data).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(CacheError::file_system(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(CacheError::file_system(path, e));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

// =============================================================================
// Tests
// =============================================================================
