//! Raster decode/encode and tile compositing.
//!
//! Tiles arrive from the provider as PNG. The cache decodes each one to RGBA,
//! pastes it into a canvas at its offset within the tile range, and encodes
//! the canvas back to PNG for storage.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::png::PngEncoder;
use image::{imageops, ExtendedColorType, ImageEncoder, ImageError, ImageFormat, Rgba, RgbaImage};

/// Fill color for canvas areas no tile covers.
pub const CANVAS_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

// =============================================================================
// Codec
// =============================================================================

/// Decodes tile bytes and encodes composed rasters.
///
/// The tile cache is generic over this trait so the stored format can be
/// swapped without touching the cache logic.
pub trait RasterCodec: Send + Sync {
    /// Decode encoded image bytes into an RGBA raster.
    fn decode(&self, data: &[u8]) -> Result<RgbaImage, ImageError>;

    /// Encode an RGBA raster.
    fn encode(&self, image: &RgbaImage) -> Result<Bytes, ImageError>;
}

/// PNG codec, matching what slippy-map tile servers deliver.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngCodec;

impl RasterCodec for PngCodec {
    fn decode(&self, data: &[u8]) -> Result<RgbaImage, ImageError> {
        let img = image::load_from_memory_with_format(data, ImageFormat::Png)?;
        Ok(img.into_rgba8())
    }

    fn encode(&self, image: &RgbaImage) -> Result<Bytes, ImageError> {
        let mut output = Cursor::new(Vec::new());
        PngEncoder::new(&mut output).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(Bytes::from(output.into_inner()))
    }
}

// =============================================================================
// Compositing
// =============================================================================

/// Create an opaque black canvas.
pub fn blank_canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, CANVAS_BACKGROUND)
}

/// Paste `tile` with its top-left corner at `(x, y)`.
///
/// Pixels falling outside the canvas are dropped.
pub fn paste_tile(canvas: &mut RgbaImage, tile: &RgbaImage, x: u32, y: u32) {
    imageops::replace(canvas, tile, i64::from(x), i64::from(y));
}

// =============================================================================
// Tests
// =============================================================================
