//! Tile cache integration tests.
//!
//! Tests verify:
//! - Composed images are reused without touching the network
//! - Requests snapping to the same tiles share one cache entry
//! - Tiles are fetched in row-major order and pasted at their offsets
//! - A failed fetch aborts the build and caches nothing
//! - Oversized and antimeridian-crossing requests are rejected before any fetch
//! - Downloads are followed by the rate-limit pause, cache hits are not

use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use flightmap::error::{CacheError, FetchError};
use flightmap::mercator::{tile_bounding_box, BoundingBox, GeoPoint, TileIndex, TileRange};
use flightmap::tile::{RateLimiter, TileCache, CANVAS_BACKGROUND, MAX_IMAGE_BYTES};

use super::test_utils::{
    count_files, create_test_tile, is_valid_png, test_cache_config, tile_color, tile_from_url,
    TrackingMockFetcher, TEST_BASE_URL, TEST_TILE_SIZE,
};

/// Corners spanning tiles (1, 1) to (2, 2) at zoom 2.
fn equator_corners() -> (GeoPoint, GeoPoint) {
    (GeoPoint::new(10.0, -10.0), GeoPoint::new(-10.0, 10.0))
}

// =============================================================================
// Composed Image Reuse
// =============================================================================

#[tokio::test]
async fn test_composed_image_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let fetcher = TrackingMockFetcher::new(TEST_TILE_SIZE);
    let cache = TileCache::open(test_cache_config(&dir), fetcher.clone())
        .await
        .unwrap();
    let (a, b) = equator_corners();

    let first = cache.composed_image("equator", a, b, 2).await.unwrap();
    assert!(!first.cache_hit);
    assert_eq!(fetcher.request_count(), 4);

    let second = cache.composed_image("equator", a, b, 2).await.unwrap();
    assert!(second.cache_hit);
    assert_eq!(fetcher.request_count(), 4, "second call must not fetch");

    assert_eq!(first.image, second.image);
    assert_eq!(first.bounds, second.bounds);
    assert_eq!(first.path, second.path);
}

#[tokio::test]
async fn test_reuse_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let (a, b) = equator_corners();

    let first = {
        let cache = TileCache::open(test_cache_config(&dir), TrackingMockFetcher::new(8))
            .await
            .unwrap();
        cache.composed_image("equator", a, b, 2).await.unwrap()
    };

    let fetcher = TrackingMockFetcher::new(TEST_TILE_SIZE);
    let cache = TileCache::open(test_cache_config(&dir), fetcher.clone())
        .await
        .unwrap();
    let second = cache.composed_image("equator", a, b, 2).await.unwrap();

    assert!(second.cache_hit);
    assert_eq!(fetcher.request_count(), 0);
    assert_eq!(first.image, second.image);
}

#[tokio::test]
async fn test_equivalent_requests_share_entry() {
    let dir = TempDir::new().unwrap();
    let fetcher = TrackingMockFetcher::new(TEST_TILE_SIZE);
    let cache = TileCache::open(test_cache_config(&dir), fetcher.clone())
        .await
        .unwrap();

    let (a, b) = equator_corners();
    let first = cache.composed_image("equator", a, b, 2).await.unwrap();

    // Different corners, same covering tiles, given in the opposite order
    let second = cache
        .composed_image(
            "equator",
            GeoPoint::new(-5.0, 5.0),
            GeoPoint::new(5.0, -5.0),
            2,
        )
        .await
        .unwrap();

    assert!(second.cache_hit);
    assert_eq!(first.path, second.path);
    assert_eq!(fetcher.request_count(), 4);
}

#[tokio::test]
async fn test_names_are_separate_entries() {
    let dir = TempDir::new().unwrap();
    let fetcher = TrackingMockFetcher::new(TEST_TILE_SIZE);
    let cache = TileCache::open(test_cache_config(&dir), fetcher.clone())
        .await
        .unwrap();
    let (a, b) = equator_corners();

    let first = cache.composed_image("one", a, b, 2).await.unwrap();
    let second = cache.composed_image("two", a, b, 2).await.unwrap();

    // New composed entry, but every tile comes from the tile store
    assert!(!second.cache_hit);
    assert_ne!(first.path, second.path);
    assert_eq!(first.image, second.image);
    assert_eq!(fetcher.request_count(), 4);
}

// =============================================================================
// Layout and Bounds
// =============================================================================

#[tokio::test]
async fn test_cache_paths_follow_layout() {
    let dir = TempDir::new().unwrap();
    let cache = TileCache::open(
        test_cache_config(&dir),
        TrackingMockFetcher::new(TEST_TILE_SIZE),
    )
    .await
    .unwrap();
    let (a, b) = equator_corners();

    let composed = cache.composed_image("equator", a, b, 2).await.unwrap();

    assert_eq!(
        composed.path,
        dir.path().join("images").join("equator").join("1_1-2_2-2.png")
    );
    assert!(is_valid_png(&std::fs::read(&composed.path).unwrap()));

    for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
        let tile = dir.path().join("tiles").join("2").join(x.to_string()).join(format!("{}.png", y));
        assert!(tile.is_file(), "missing {}", tile.display());
    }
    assert_eq!(count_files(&dir.path().join("tiles")), 4);
}

#[tokio::test]
async fn test_bounds_are_snapped_to_tiles() {
    let dir = TempDir::new().unwrap();
    let cache = TileCache::open(
        test_cache_config(&dir),
        TrackingMockFetcher::new(TEST_TILE_SIZE),
    )
    .await
    .unwrap();
    let (a, b) = equator_corners();

    let composed = cache.composed_image("equator", a, b, 2).await.unwrap();
    let top_left = tile_bounding_box(1, 1, 2, TEST_TILE_SIZE);
    let bottom_right = tile_bounding_box(2, 2, 2, TEST_TILE_SIZE);

    assert_eq!(composed.tiles, TileRange::new(1, 1, 2, 2, 2));
    assert_eq!(composed.bounds.west, top_left.west);
    assert_eq!(composed.bounds.north, top_left.north);
    assert_eq!(composed.bounds.east, bottom_right.east);
    assert_eq!(composed.bounds.south, bottom_right.south);

    // Wider than requested, never narrower
    assert!(composed.bounds.west <= -10.0 && composed.bounds.east >= 10.0);
    assert!(composed.bounds.south <= -10.0 && composed.bounds.north >= 10.0);
    assert_eq!(composed.bounds.west, -90.0);
    assert_eq!(composed.bounds.east, 90.0);

    // Snapped bounds are also returned on a hit
    let again = cache.composed_image("equator", a, b, 2).await.unwrap();
    assert_eq!(again.bounds, composed.bounds);
}

// =============================================================================
// Compositing
// =============================================================================

#[tokio::test]
async fn test_tiles_fetched_row_major() {
    let dir = TempDir::new().unwrap();
    let fetcher = TrackingMockFetcher::new(TEST_TILE_SIZE);
    let cache = TileCache::open(test_cache_config(&dir), fetcher.clone())
        .await
        .unwrap();

    // Tiles (3, 5) to (5, 6) at zoom 4: three columns, two rows
    let range = TileRange::new(3, 5, 5, 6, 4);
    let bounds = range.bounding_box(TEST_TILE_SIZE);
    let inset = 0.01;
    let composed = cache
        .composed_image(
            "rows",
            GeoPoint::new(bounds.north - inset, bounds.west + inset),
            GeoPoint::new(bounds.south + inset, bounds.east - inset),
            4,
        )
        .await
        .unwrap();
    assert_eq!(composed.tiles, range);

    let requested: Vec<TileIndex> = fetcher
        .get_requests()
        .await
        .iter()
        .map(|url| tile_from_url(url).unwrap())
        .collect();
    let expected: Vec<TileIndex> = range.iter().collect();
    assert_eq!(requested, expected);
    assert_eq!(requested[0], TileIndex::new(3, 5, 4));
    assert_eq!(requested[3], TileIndex::new(3, 6, 4));

    let urls = fetcher.get_requests().await;
    assert_eq!(urls[0], format!("{}/4/3/5.png", TEST_BASE_URL));
}

#[tokio::test]
async fn test_tiles_pasted_at_offsets() {
    let dir = TempDir::new().unwrap();
    let cache = TileCache::open(
        test_cache_config(&dir),
        TrackingMockFetcher::new(TEST_TILE_SIZE),
    )
    .await
    .unwrap();
    let (a, b) = equator_corners();

    let composed = cache.composed_image("equator", a, b, 2).await.unwrap();
    let ts = TEST_TILE_SIZE;
    assert_eq!(composed.image.dimensions(), (2 * ts, 2 * ts));

    for tile in composed.tiles.iter() {
        let dx = (tile.x - 1) * ts;
        let dy = (tile.y - 1) * ts;
        let color = tile_color(&tile);
        assert_eq!(*composed.image.get_pixel(dx, dy), color);
        assert_eq!(*composed.image.get_pixel(dx + ts - 1, dy + ts - 1), color);
    }
    assert!(composed.image.pixels().all(|p| *p != CANVAS_BACKGROUND));
}

#[tokio::test]
async fn test_geo_to_image_pixel_lands_in_tile() {
    let dir = TempDir::new().unwrap();
    let cache = TileCache::open(
        test_cache_config(&dir),
        TrackingMockFetcher::new(TEST_TILE_SIZE),
    )
    .await
    .unwrap();
    let (a, b) = equator_corners();

    let composed = cache.composed_image("equator", a, b, 2).await.unwrap();

    // (0, 0) sits on the shared corner of the four tiles
    let center = composed.geo_to_image_pixel(GeoPoint::new(0.0, 0.0));
    assert!((center.x - TEST_TILE_SIZE as f64).abs() < 1e-9);
    assert!((center.y - TEST_TILE_SIZE as f64).abs() < 1e-9);

    // The north-west corner of the snapped bounds is the image origin
    let origin = composed.geo_to_image_pixel(composed.bounds.north_west());
    assert!(origin.x.abs() < 1e-6);
    assert!(origin.y.abs() < 1e-6);
}

// =============================================================================
// Failure Handling
// =============================================================================

#[tokio::test]
async fn test_fetch_failure_aborts_build() {
    let dir = TempDir::new().unwrap();
    let fetcher = TrackingMockFetcher::new(TEST_TILE_SIZE).failing_on(3);
    let cache = TileCache::open(test_cache_config(&dir), fetcher.clone())
        .await
        .unwrap();
    let (a, b) = equator_corners();

    let result = cache.composed_image("equator", a, b, 2).await;
    match result {
        Err(CacheError::Fetch(FetchError::Status { status, .. })) => assert_eq!(status, 503),
        other => panic!("expected fetch error, got {:?}", other.map(|c| c.path)),
    }

    // Build stopped at the failing tile, no composed image written
    assert_eq!(fetcher.request_count(), 3);
    assert_eq!(count_files(&dir.path().join("images")), 0);
    assert_eq!(count_files(&dir.path().join("tiles")), 2);

    // Not retried automatically; a fresh attempt only fetches what is missing
    let retry = TrackingMockFetcher::new(TEST_TILE_SIZE);
    let cache = TileCache::open(test_cache_config(&dir), retry.clone())
        .await
        .unwrap();
    let composed = cache.composed_image("equator", a, b, 2).await.unwrap();
    assert!(!composed.cache_hit);
    assert_eq!(retry.request_count(), 2);
}

#[tokio::test]
async fn test_corrupt_cached_tile_is_decode_error() {
    let dir = TempDir::new().unwrap();
    let cache = TileCache::open(
        test_cache_config(&dir),
        TrackingMockFetcher::new(TEST_TILE_SIZE),
    )
    .await
    .unwrap();

    cache
        .tile_store()
        .write(&TileIndex::new(0, 0, 0), b"not a png")
        .await
        .unwrap();

    let result = cache
        .composed_image("world", GeoPoint::new(10.0, 10.0), GeoPoint::new(20.0, 20.0), 0)
        .await;
    assert!(matches!(result, Err(CacheError::Decode { .. })));
    assert_eq!(count_files(&dir.path().join("images")), 0);
}

#[tokio::test]
async fn test_invalid_name_rejected_before_fetch() {
    let dir = TempDir::new().unwrap();
    let fetcher = TrackingMockFetcher::new(TEST_TILE_SIZE);
    let cache = TileCache::open(test_cache_config(&dir), fetcher.clone())
        .await
        .unwrap();
    let (a, b) = equator_corners();

    let result = cache.composed_image("../outside", a, b, 2).await;
    assert!(matches!(result, Err(CacheError::InvalidName { .. })));
    assert_eq!(fetcher.request_count(), 0);
}

#[tokio::test]
async fn test_oversized_image_rejected_before_fetch() {
    let dir = TempDir::new().unwrap();
    let fetcher = TrackingMockFetcher::new(TEST_TILE_SIZE).failing_on(1);
    let cache = TileCache::open(test_cache_config(&dir), fetcher.clone())
        .await
        .unwrap();

    // Nearly the whole world at zoom 16 is far beyond the buffer cap
    let result = cache
        .composed_image("world", GeoPoint::new(80.0, -170.0), GeoPoint::new(-80.0, 170.0), 16)
        .await;
    match result {
        Err(CacheError::ImageTooLarge {
            width_tiles,
            height_tiles,
        }) => {
            let bytes = width_tiles as u64 * height_tiles as u64 * (TEST_TILE_SIZE as u64).pow(2) * 4;
            assert!(bytes > MAX_IMAGE_BYTES);
        }
        other => panic!("expected ImageTooLarge, got {:?}", other.map(|c| c.path)),
    }

    assert_eq!(fetcher.request_count(), 0);
    assert_eq!(count_files(&dir.path().join("images")), 0);
    assert_eq!(count_files(&dir.path().join("tiles")), 0);
}

#[tokio::test]
async fn test_antimeridian_bounds_rejected_before_fetch() {
    let dir = TempDir::new().unwrap();
    let fetcher = TrackingMockFetcher::new(TEST_TILE_SIZE);
    let cache = TileCache::open(test_cache_config(&dir), fetcher.clone())
        .await
        .unwrap();

    let bounds = BoundingBox::new(170.0, -10.0, -170.0, 10.0);
    let result = cache.composed_image_for_bounds("pacific", &bounds, 2).await;
    match result {
        Err(CacheError::CrossesAntimeridian { west, east }) => {
            assert_eq!(west, 170.0);
            assert_eq!(east, -170.0);
        }
        other => panic!("expected CrossesAntimeridian, got {:?}", other.map(|c| c.path)),
    }
    assert_eq!(fetcher.request_count(), 0);
    assert_eq!(count_files(&dir.path().join("images")), 0);

    // The same corners as points never wrap
    let composed = cache
        .composed_image("pacific", bounds.north_west(), bounds.south_east(), 2)
        .await
        .unwrap();
    assert!(!composed.bounds.crosses_antimeridian());
}

#[tokio::test]
async fn test_open_fails_when_root_is_a_file() {
    let dir = TempDir::new().unwrap();
    let mut config = test_cache_config(&dir);
    std::fs::write(dir.path().join("blocked"), b"").unwrap();
    config.image_dir = dir.path().join("blocked").join("images");

    let result = TileCache::open(config, TrackingMockFetcher::new(TEST_TILE_SIZE)).await;
    assert!(matches!(result, Err(CacheError::FileSystem { .. })));
}

// =============================================================================
// Tile Store and Rate Limiting
// =============================================================================

#[tokio::test]
async fn test_tile_store_hit_skips_network() {
    let dir = TempDir::new().unwrap();
    let fetcher = TrackingMockFetcher::new(TEST_TILE_SIZE);
    let cache = TileCache::open(test_cache_config(&dir), fetcher.clone())
        .await
        .unwrap();

    let tile = TileIndex::new(7, 9, 5);
    let seeded = dir.path().join("tiles").join("5").join("7").join("9.png");
    std::fs::create_dir_all(seeded.parent().unwrap()).unwrap();
    std::fs::write(&seeded, create_test_tile(TEST_TILE_SIZE, tile_color(&tile))).unwrap();

    let path = cache.fetch_tile(tile).await.unwrap();
    assert_eq!(path, seeded);
    assert_eq!(fetcher.request_count(), 0);
}

#[tokio::test]
async fn test_rate_limit_applies_only_to_downloads() {
    let dir = TempDir::new().unwrap();
    let mut config = test_cache_config(&dir);
    config.rate_limit = Duration::from_millis(40);
    let cache = TileCache::open(config, TrackingMockFetcher::new(TEST_TILE_SIZE))
        .await
        .unwrap();

    let start = Instant::now();
    cache.fetch_tile(TileIndex::new(0, 0, 1)).await.unwrap();
    cache.fetch_tile(TileIndex::new(1, 0, 1)).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(80));

    let start = Instant::now();
    cache.fetch_tile(TileIndex::new(0, 0, 1)).await.unwrap();
    cache.fetch_tile(TileIndex::new(1, 0, 1)).await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(40));
}

#[tokio::test]
async fn test_shared_rate_limiter() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(30)));

    let a = TileCache::open(test_cache_config(&dir_a), TrackingMockFetcher::new(8))
        .await
        .unwrap()
        .with_rate_limiter(limiter.clone());
    let b = TileCache::open(test_cache_config(&dir_b), TrackingMockFetcher::new(8))
        .await
        .unwrap()
        .with_rate_limiter(limiter);

    let start = Instant::now();
    let (ra, rb) = tokio::join!(
        a.fetch_tile(TileIndex::new(0, 0, 0)),
        b.fetch_tile(TileIndex::new(0, 0, 0))
    );
    ra.unwrap();
    rb.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(60));
}
