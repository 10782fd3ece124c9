//! Configuration management for flightmap.
//!
//! This module provides the command-line interface, which supports:
//! - Subcommands for composing maps and inspecting coordinate math
//! - Environment variables with `FLIGHTMAP_` prefix for cache settings
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use flightmap::config::{Cli, Command};
//!
//! let cli = Cli::parse();
//! if let Command::Compose(config) = cli.into_command() {
//!     println!("Tiles in {}", config.cache.tile_dir.display());
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `FLIGHTMAP_TILE_DIR` - Tile store root (default: tilecache/osm)
//! - `FLIGHTMAP_IMAGE_DIR` - Composed image store root (default: imagecache/osm)
//! - `FLIGHTMAP_TILE_URL` - Tile provider base URL (default: https://tile.openstreetmap.org)
//! - `FLIGHTMAP_RATE_LIMIT_MS` - Pause after each download (default: 1000)
//! - `FLIGHTMAP_USER_AGENT` - Identifying User-Agent header (default: flightmap/<version>)
//! - `FLIGHTMAP_TIMEOUT_SECS` - HTTP request timeout, 0 disables (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::io::DEFAULT_USER_AGENT;
use crate::mercator::{best_view, BoundingBox, GeoPoint, DEFAULT_TILE_SIZE, MAX_ZOOM};
use crate::tile::{CacheConfig, DEFAULT_IMAGE_DIR, DEFAULT_TILE_DIR, DEFAULT_TILE_URL};

// =============================================================================
// Default Values
// =============================================================================

/// Default pause after each tile download, in milliseconds.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default viewport width in pixels.
pub const DEFAULT_VIEW_WIDTH: u32 = 800;

/// Default viewport height in pixels.
pub const DEFAULT_VIEW_HEIGHT: u32 = 600;

// =============================================================================
// CLI
// =============================================================================

/// flightmap - Web Mercator tile math and a rate-limited tile cache.
#[derive(Parser, Debug, Clone)]
#[command(name = "flightmap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Stitch the tiles covering two corner points into one image.
    Compose(ComposeConfig),

    /// Compute the center and zoom that fit a bounding box in a viewport.
    View(ViewConfig),

    /// List the quadkeys covering a bounding box.
    Quadkeys(QuadkeysConfig),

    /// Print the per-zoom reference table.
    ZoomLevels(ZoomLevelsConfig),
}

/// How command results are printed.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

// =============================================================================
// Cache Arguments
// =============================================================================

/// Settings shared by every command that touches the tile cache.
#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    /// Directory holding downloaded tiles.
    #[arg(long, default_value = DEFAULT_TILE_DIR, env = "FLIGHTMAP_TILE_DIR")]
    pub tile_dir: PathBuf,

    /// Directory holding composed images.
    #[arg(long, default_value = DEFAULT_IMAGE_DIR, env = "FLIGHTMAP_IMAGE_DIR")]
    pub image_dir: PathBuf,

    /// Tile provider base URL; tiles are requested at {url}/{z}/{x}/{y}.png.
    #[arg(long, default_value = DEFAULT_TILE_URL, env = "FLIGHTMAP_TILE_URL")]
    pub tile_url: String,

    /// Pause after each tile download, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_RATE_LIMIT_MS, env = "FLIGHTMAP_RATE_LIMIT_MS")]
    pub rate_limit_ms: u64,

    /// User-Agent sent to the tile provider.
    ///
    /// Public tile servers block requests that do not identify the client.
    #[arg(long, default_value = DEFAULT_USER_AGENT, env = "FLIGHTMAP_USER_AGENT")]
    pub user_agent: String,

    /// HTTP request timeout in seconds (0 disables).
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, env = "FLIGHTMAP_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Tile edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: u32,
}

impl CacheArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_url.trim().is_empty() {
            return Err(
                "Tile URL is required. Set --tile-url or FLIGHTMAP_TILE_URL".to_string(),
            );
        }
        let url = url::Url::parse(&self.tile_url)
            .map_err(|e| format!("Invalid tile URL '{}': {}", self.tile_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Tile URL must use http or https, got '{}'",
                url.scheme()
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(
                "User agent must not be empty; tile providers reject anonymous clients"
                    .to_string(),
            );
        }
        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Request timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            tile_dir: self.tile_dir.clone(),
            image_dir: self.image_dir.clone(),
            base_url: self.tile_url.clone(),
            rate_limit: Duration::from_millis(self.rate_limit_ms),
            tile_size: self.tile_size,
        }
    }
}

// =============================================================================
// Command Configurations
// =============================================================================

/// Arguments for `flightmap compose`.
#[derive(Args, Debug, Clone)]
pub struct ComposeConfig {
    #[command(flatten)]
    pub cache: CacheArgs,

    /// Name grouping the composed images on disk.
    #[arg(long)]
    pub name: String,

    /// First corner as LAT,LON.
    #[arg(long, value_parser = parse_geo_point, allow_hyphen_values = true)]
    pub from: GeoPoint,

    /// Opposite corner as LAT,LON.
    #[arg(long, value_parser = parse_geo_point, allow_hyphen_values = true)]
    pub to: GeoPoint,

    /// Zoom level. If omitted, the zoom that fits the viewport is used.
    #[arg(short, long)]
    pub zoom: Option<u8>,

    /// Viewport width used to pick a zoom.
    #[arg(long, default_value_t = DEFAULT_VIEW_WIDTH)]
    pub width: u32,

    /// Viewport height used to pick a zoom.
    #[arg(long, default_value_t = DEFAULT_VIEW_HEIGHT)]
    pub height: u32,

    /// Margin kept free on each side of the viewport.
    #[arg(long, default_value_t = 0.0)]
    pub padding: f64,

    /// Also write the composed PNG to this file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl ComposeConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.cache.validate()?;

        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        match self.zoom {
            Some(zoom) => validate_zoom(zoom),
            None => validate_viewport(self.width, self.height, self.padding),
        }
    }

    /// The requested zoom, or the integer zoom at which the corners fit the viewport.
    pub fn resolve_zoom(&self) -> u8 {
        if let Some(zoom) = self.zoom {
            return zoom;
        }
        let bounds = BoundingBox::from_corners(self.from, self.to);
        let view = best_view(
            &bounds.to_array(),
            self.width as f64,
            self.height as f64,
            self.padding,
            self.cache.tile_size,
        );
        view.zoom.floor().clamp(0.0, MAX_ZOOM as f64) as u8
    }
}

/// Arguments for `flightmap view`.
#[derive(Args, Debug, Clone)]
pub struct ViewConfig {
    /// Bounding box as WEST,SOUTH,EAST,NORTH.
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    pub bbox: BoundingBox,

    #[arg(long, default_value_t = DEFAULT_VIEW_WIDTH)]
    pub width: u32,

    #[arg(long, default_value_t = DEFAULT_VIEW_HEIGHT)]
    pub height: u32,

    #[arg(long, default_value_t = 0.0)]
    pub padding: f64,

    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: u32,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl ViewConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }
        validate_viewport(self.width, self.height, self.padding)
    }
}

/// Arguments for `flightmap quadkeys`.
#[derive(Args, Debug, Clone)]
pub struct QuadkeysConfig {
    /// Bounding box as WEST,SOUTH,EAST,NORTH.
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    pub bbox: BoundingBox,

    #[arg(short, long)]
    pub zoom: u8,

    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: u32,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl QuadkeysConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }
        validate_zoom(self.zoom)
    }
}

/// Arguments for `flightmap zoom-levels`.
#[derive(Args, Debug, Clone)]
pub struct ZoomLevelsConfig {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

// =============================================================================
// Parsing and Validation Helpers
// =============================================================================

fn validate_zoom(zoom: u8) -> Result<(), String> {
    if zoom > MAX_ZOOM {
        return Err(format!("zoom must be between 0 and {}", MAX_ZOOM));
    }
    Ok(())
}

fn validate_viewport(width: u32, height: u32, padding: f64) -> Result<(), String> {
    if !padding.is_finite() || padding < 0.0 {
        return Err("padding must be a non-negative number".to_string());
    }
    let usable_width = width as f64 - 2.0 * padding;
    let usable_height = height as f64 - 2.0 * padding;
    if usable_width <= 0.0 || usable_height <= 0.0 {
        return Err("viewport must be larger than twice the padding".to_string());
    }
    Ok(())
}

fn parse_numbers(value: &str) -> Result<Vec<f64>, String> {
    value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", part.trim()))
        })
        .collect()
}

/// Parse a `LAT,LON` pair.
pub fn parse_geo_point(value: &str) -> Result<GeoPoint, String> {
    match parse_numbers(value)?.as_slice() {
        [lat, lon] => Ok(GeoPoint::new(*lat, *lon)),
        _ => Err(format!("expected LAT,LON, got '{}'", value)),
    }
}

/// Parse a `WEST,SOUTH,EAST,NORTH` box.
pub fn parse_bbox(value: &str) -> Result<BoundingBox, String> {
    let numbers = parse_numbers(value)?;
    if numbers.len() > 4 {
        return Err(format!("expected WEST,SOUTH,EAST,NORTH, got '{}'", value));
    }
    BoundingBox::try_from(numbers.as_slice()).map_err(|e| e.to_string())
}

// =============================================================================
// Tests
// =============================================================================
