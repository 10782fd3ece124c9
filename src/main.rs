//! flightmap - Web Mercator tile math and a rate-limited tile cache.
//!
//! This binary composes cached map images and exposes the coordinate math
//! on the command line.

use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flightmap::{
    config::{Cli, Command, ComposeConfig, OutputFormat, QuadkeysConfig, ViewConfig},
    io::HttpTileFetcher,
    mercator::{best_view, quadkeys_for_bounds, ZOOM_LEVELS},
    tile::TileCache,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.into_command() {
        Command::Compose(config) => run_compose(config).await,
        Command::View(config) => run_view(config),
        Command::Quadkeys(config) => run_quadkeys(config),
        Command::ZoomLevels(config) => run_zoom_levels(config.format),
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "flightmap=debug"
    } else {
        "flightmap=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Print `value` as pretty JSON.
fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Compose Command
// =============================================================================

async fn run_compose(config: ComposeConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let fetcher = match HttpTileFetcher::new(&config.cache.user_agent, config.cache.timeout()) {
        Ok(f) => f,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let cache = match TileCache::open(config.cache.to_cache_config(), fetcher).await {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to open tile cache: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let zoom = config.resolve_zoom();
    info!(name = %config.name, zoom, "Composing map");

    let composed = match cache
        .composed_image(&config.name, config.from, config.to, zoom)
        .await
    {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to compose image: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref output) = config.output {
        if let Err(e) = tokio::fs::copy(&composed.path, output).await {
            error!("Failed to write {}: {}", output.display(), e);
            return ExitCode::FAILURE;
        }
        info!("Wrote {}", output.display());
    }

    let (width, height) = composed.image.dimensions();
    match config.format {
        OutputFormat::Text => {
            let b = composed.bounds;
            println!("{}", composed.path.display());
            println!("zoom:   {}", zoom);
            println!("size:   {}x{} px ({} tiles)", width, height, composed.tiles.tile_count());
            println!("bounds: {}, {}, {}, {}", b.west, b.south, b.east, b.north);
            println!("cached: {}", composed.cache_hit);
            ExitCode::SUCCESS
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "path": composed.path,
            "zoom": zoom,
            "width": width,
            "height": height,
            "bounds": composed.bounds,
            "tiles": composed.tiles,
            "cache_hit": composed.cache_hit,
        })),
    }
}

// =============================================================================
// View Command
// =============================================================================

fn run_view(config: ViewConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let view = best_view(
        &config.bbox.to_array(),
        config.width as f64,
        config.height as f64,
        config.padding,
        config.tile_size,
    );

    match config.format {
        OutputFormat::Text => {
            println!("center: {}, {}", view.center.lat, view.center.lon);
            println!("zoom:   {}", view.zoom);
            ExitCode::SUCCESS
        }
        OutputFormat::Json => print_json(&view),
    }
}

// =============================================================================
// Quadkeys Command
// =============================================================================

fn run_quadkeys(config: QuadkeysConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let keys = quadkeys_for_bounds(&config.bbox, config.zoom, config.tile_size);
    match config.format {
        OutputFormat::Text => {
            for key in &keys {
                println!("{}", key);
            }
            ExitCode::SUCCESS
        }
        OutputFormat::Json => print_json(&keys),
    }
}

// =============================================================================
// Zoom Levels Command
// =============================================================================

fn run_zoom_levels(format: OutputFormat) -> ExitCode {
    match format {
        OutputFormat::Text => {
            println!(
                "{:>4}  {:>16}  {:>14}  {:>12}  {:>13}",
                "zoom", "tiles", "tile width", "m/px", "scale"
            );
            for level in ZOOM_LEVELS.iter() {
                println!(
                    "{:>4}  {:>16}  {:>14.9}  {:>12.4}  1:{:<11}",
                    level.zoom,
                    level.tiles,
                    level.tile_width,
                    level.meters_per_pixel,
                    level.scale_denominator
                );
            }
            ExitCode::SUCCESS
        }
        OutputFormat::Json => print_json(&*ZOOM_LEVELS),
    }
}
