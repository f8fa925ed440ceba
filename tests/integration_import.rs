//! Integration tests for importing a folder of photos
//!
//! These tests verify that:
//! 1. Discovery finds images recursively and skips hidden and foreign files
//! 2. A background import reports monotonic progress up to exactly 1.0
//! 3. A failing file stops the import and keeps what was already stored
//! 4. Edited variants link to their source and honour overwrite

use assert_fs::prelude::*;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use photoflow::core::browsing::BrowsingView;
use photoflow::core::fetch::FetchPipeline;
use photoflow::core::filter::{KindClass, KindFilter};
use photoflow::core::import::{import_edited, FileImportJob, ImportQueue};
use photoflow::core::library::{MediaKind, MediaStore, SqliteStore, Tier};
use photoflow::core::scanner::discover_images;
use photoflow::core::status::StatusEventBus;
use photoflow::error::ImportError;
use photoflow::events::{Event, EventChannel, ImportEvent};
use photoflow::Config;
use predicates::prelude::*;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

fn png_bytes(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([seed.wrapping_add(x as u8), (y % 256) as u8, seed])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// A camera-card style folder: nested images, a hidden folder, a sidecar
fn photo_folder() -> assert_fs::TempDir {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("DCIM/100/IMG_0001.png")
        .write_binary(&png_bytes(64, 48, 10))
        .unwrap();
    temp.child("DCIM/100/IMG_0002.png")
        .write_binary(&png_bytes(48, 64, 90))
        .unwrap();
    temp.child("DCIM/101/IMG_0003.png")
        .write_binary(&png_bytes(32, 32, 170))
        .unwrap();
    temp.child(".thumbnails/IMG_0001.png")
        .write_binary(&png_bytes(8, 8, 0))
        .unwrap();
    temp.child("DCIM/100/IMG_0001.xmp")
        .write_str("<x:xmpmeta/>")
        .unwrap();
    temp
}

fn open_library(temp: &assert_fs::TempDir) -> Arc<dyn MediaStore> {
    Arc::new(SqliteStore::open(&temp.path().join("library/photoflow.db")).unwrap())
}

fn queue_for(paths: &[PathBuf], config: &Config) -> ImportQueue {
    let mut queue = ImportQueue::new();
    for path in paths {
        queue.push(FileImportJob::new(path, config));
    }
    queue
}

#[test]
fn test_discovery_skips_hidden_and_sidecars() {
    let temp = photo_folder();

    let found = discover_images(&[temp.path().to_path_buf()], false).unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|p| p.extension().unwrap() == "png"));
    assert!(found.windows(2).all(|w| w[0] < w[1]));

    let with_hidden = discover_images(&[temp.path().to_path_buf()], true).unwrap();
    assert_eq!(with_hidden.len(), 4);

    temp.close().unwrap();
}

#[test]
fn test_missing_folder_fails_discovery() {
    let temp = assert_fs::TempDir::new().unwrap();
    let missing = temp.child("not-there");
    missing.assert(predicate::path::missing());

    let result = discover_images(&[missing.path().to_path_buf()], false);
    assert!(matches!(result, Err(ImportError::Io { .. })));
}

#[test]
fn test_background_import_fills_library() {
    let temp = photo_folder();
    let config = Config::default();
    let store = open_library(&temp);
    temp.child("library/photoflow.db")
        .assert(predicate::path::is_file());

    let paths = discover_images(&[temp.path().join("DCIM")], false).unwrap();
    let (sender, receiver) = EventChannel::new::<Event>();
    let session = queue_for(&paths, &config).start(store.clone(), sender).unwrap();
    let progress = session.progress().clone();
    let summary = session.wait().unwrap();

    assert_eq!(summary.imported.len(), 3);
    assert_eq!(progress.fraction(), 1.0);
    assert_eq!(progress.completed(), 3);

    let fractions: Vec<f64> = receiver
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            Event::Import(ImportEvent::Progress(update)) => Some(update.fraction),
            _ => None,
        })
        .collect();
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(fractions.last().copied(), Some(1.0));

    // Everything lands in the default triage view with dimensions and previews
    let view = BrowsingView::from_store(store.clone(), StatusEventBus::new(), &config).unwrap();
    assert_eq!(view.count(), 3);
    let first = store.by_id(summary.imported[0]).unwrap().unwrap();
    assert_eq!(first.original_filename.as_deref(), Some("IMG_0001.png"));
    assert_eq!((first.dimensions.width, first.dimensions.height), (64, 48));

    // Fetch a preview and write it out like the fetch command does
    let pipeline = FetchPipeline::new(store, &config).unwrap();
    let preview = pipeline
        .fetch_payload(summary.imported[1], Tier::Preview)
        .wait()
        .unwrap();
    assert!(preview.starts_with(&[0xFF, 0xD8]));
    let out = temp.child("out/preview.jpg");
    out.write_binary(&preview).unwrap();
    out.assert(predicate::path::is_file());

    temp.close().unwrap();
}

#[test]
fn test_corrupt_file_stops_import() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("a.png").write_binary(&png_bytes(16, 16, 1)).unwrap();
    temp.child("b.png").write_str("not really a png").unwrap();
    temp.child("c.png").write_binary(&png_bytes(16, 16, 2)).unwrap();

    let config = Config::default();
    let store = open_library(&temp);
    let paths = discover_images(&[temp.path().to_path_buf()], false).unwrap();
    assert_eq!(paths.len(), 3);

    let (sender, receiver) = EventChannel::new::<Event>();
    let session = queue_for(&paths, &config).start(store.clone(), sender).unwrap();
    let result = session.wait();
    assert!(matches!(result, Err(ImportError::Decode { .. })));

    // The first file was committed before the failure; the third never ran
    let items = store.list().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].original_filename.as_deref(), Some("a.png"));

    let failed = receiver.drain().into_iter().any(|event| {
        matches!(event, Event::Import(ImportEvent::Failed { ref label, .. }) if label == "b.png")
    });
    assert!(failed);
}

#[test]
fn test_edited_variant_replaces_on_overwrite() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("IMG_0042.png")
        .write_binary(&png_bytes(40, 30, 7))
        .unwrap();

    let config = Config::default();
    let store = open_library(&temp);
    let summary = queue_for(&[temp.child("IMG_0042.png").path().to_path_buf()], &config)
        .run(store.as_ref())
        .unwrap();
    let source = summary.imported[0];

    let edited = import_edited(
        store.as_ref(),
        png_bytes(40, 30, 200),
        Some(source),
        false,
        &config,
    )
    .unwrap();
    let item = store.by_id(edited).unwrap().unwrap();
    assert_eq!(item.kind, MediaKind::Edited { source: Some(source) });
    assert_eq!(item.original_filename.as_deref(), Some("IMG_0042.png"));

    let conflict =
        import_edited(store.as_ref(), png_bytes(40, 30, 201), Some(source), false, &config);
    assert!(matches!(
        conflict,
        Err(ImportError::EditedPayloadConflict { source_id }) if source_id == source
    ));

    let replaced =
        import_edited(store.as_ref(), png_bytes(20, 15, 202), Some(source), true, &config).unwrap();
    assert_eq!(replaced, edited);
    let item = store.by_id(edited).unwrap().unwrap();
    assert_eq!((item.dimensions.width, item.dimensions.height), (20, 15));

    // A view restricted to edited items shows only the variant
    let mut view = BrowsingView::from_store(store, StatusEventBus::new(), &config).unwrap();
    view.set_filters(KindFilter::only(KindClass::Edited));
    assert_eq!(view.ids(), &[edited]);
}
