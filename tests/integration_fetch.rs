//! Integration tests for fetching payloads out of a SQLite library
//!
//! These tests verify that:
//! 1. The preview always arrives before the original
//! 2. Fetch workers only see data that has been saved
//! 3. Decoded images and metadata come back from stored bytes
//! 4. Cancelling a finished cascade still yields what it delivered

use chrono::Utc;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use photoflow::core::fetch::{FetchPipeline, FetchState};
use photoflow::core::hasher::ImageHash;
use photoflow::core::import::encode_preview;
use photoflow::core::library::{MediaId, MediaStore, NewMediaItem, SqliteStore, Tier};
use photoflow::error::FetchError;
use photoflow::Config;
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Encode a gradient as PNG bytes
fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Insert an item with a real original and a JPEG preview
fn insert_photo(store: &SqliteStore, width: u32, height: u32) -> MediaId {
    let original = png_bytes(width, height);
    let decoded = image::load_from_memory(&original).unwrap();
    let preview = encode_preview(&decoded, 64, 60).unwrap();

    store
        .insert(NewMediaItem::imported(
            Utc::now(),
            ImageHash::new(0),
            Some(original),
            Some(preview),
        ))
        .unwrap()
}

fn open_library(dir: &TempDir) -> SqliteStore {
    SqliteStore::open(&dir.path().join("library.db")).unwrap()
}

#[test]
fn test_image_cascade_delivers_preview_then_original() {
    let dir = TempDir::new().unwrap();
    let store = open_library(&dir);
    let id = insert_photo(&store, 320, 240);
    store.save().unwrap();

    let store: Arc<dyn MediaStore> = Arc::new(store);
    let pipeline = FetchPipeline::new(store, &Config::default()).unwrap();

    let fetch = pipeline.fetch_opportunistic_image(id);
    let preview = fetch.next_timeout(TIMEOUT).unwrap().unwrap();
    assert_eq!(preview.tier, Tier::Preview);
    assert_eq!(preview.value.width(), 64);
    assert_eq!(preview.value.height(), 48);

    let original = fetch.next_timeout(TIMEOUT).unwrap().unwrap();
    assert_eq!(original.tier, Tier::Original);
    assert_eq!(original.value.width(), 320);
    assert_eq!(original.value.height(), 240);

    assert!(fetch.next_timeout(TIMEOUT).is_none());
    assert_eq!(fetch.state(), FetchState::Done);
}

#[test]
fn test_unsaved_items_are_invisible_to_fetches() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(open_library(&dir));
    let id = insert_photo(&store, 16, 16);

    let shared: Arc<dyn MediaStore> = store.clone();
    let pipeline = FetchPipeline::new(shared, &Config::default()).unwrap();

    let result = pipeline.fetch_payload(id, Tier::Original).wait();
    assert!(matches!(result, Err(FetchError::ItemNotFound { .. })));

    store.save().unwrap();
    let bytes = pipeline.fetch_payload(id, Tier::Original).wait().unwrap();
    assert_eq!(bytes, store.payload(id, Tier::Original).unwrap().unwrap());
}

#[test]
fn test_many_fetches_resolve_independently() {
    let dir = TempDir::new().unwrap();
    let store = open_library(&dir);
    let ids: Vec<MediaId> = (1..=6).map(|n| insert_photo(&store, n * 10, n * 5)).collect();
    store.save().unwrap();

    let store: Arc<dyn MediaStore> = Arc::new(store);
    let pipeline = FetchPipeline::new(store, &Config::default()).unwrap();

    let handles: Vec<_> = ids
        .iter()
        .map(|&id| pipeline.fetch_decoded_image(id, Tier::Original))
        .collect();

    for (n, handle) in (1..=6u32).zip(handles) {
        let image = handle.wait().unwrap();
        assert_eq!((image.width(), image.height()), (n * 10, n * 5));
    }
}

#[test]
fn test_metadata_reports_dimensions_without_exif() {
    let dir = TempDir::new().unwrap();
    let store = open_library(&dir);
    let id = insert_photo(&store, 40, 30);
    store.save().unwrap();

    let store: Arc<dyn MediaStore> = Arc::new(store);
    let pipeline = FetchPipeline::new(store, &Config::default()).unwrap();

    let metadata = pipeline.fetch_metadata(id).wait().unwrap();
    assert_eq!(metadata.dimensions_display().as_deref(), Some("40x30"));
    assert!(metadata.date_taken.is_none());
}

#[test]
fn test_cancel_after_finish_keeps_completed_stages() {
    let dir = TempDir::new().unwrap();
    let store = open_library(&dir);
    let id = insert_photo(&store, 64, 64);
    store.save().unwrap();

    let store: Arc<dyn MediaStore> = Arc::new(store);
    let pipeline = FetchPipeline::new(store, &Config::default()).unwrap();

    let fetch = pipeline.fetch_opportunistic(id);
    let deadline = Instant::now() + TIMEOUT;
    while fetch.state() != FetchState::Done {
        assert!(Instant::now() < deadline, "cascade did not finish");
        std::thread::sleep(Duration::from_millis(5));
    }

    // Both stages finished before the cancel, so both are still handed out
    fetch.cancel();
    assert_eq!(fetch.state(), FetchState::Done);
    let tiers: Vec<Tier> = fetch.map(|delivery| delivery.unwrap().tier).collect();
    assert_eq!(tiers, vec![Tier::Preview, Tier::Original]);
}
