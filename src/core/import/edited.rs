//! Importing edited variants of existing items.

use super::encode_preview;
use crate::config::Config;
use crate::core::hasher::PerceptualHasher;
use crate::core::library::{Dimensions, MediaId, MediaKind, MediaStore, NewMediaItem};
use crate::error::ImportError;
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

const EDITED_FILENAME: &str = "Edited Image";

/// Store an edited rendition, optionally linked to the item it came from
///
/// A source item holds at most one edited variant. If one exists, the call
/// fails with [`ImportError::EditedPayloadConflict`] unless `overwrite` is
/// set, in which case the existing variant is replaced and keeps its id.
/// The variant inherits orientation and filename from its source.
pub fn import_edited(
    store: &dyn MediaStore,
    bytes: Vec<u8>,
    source: Option<MediaId>,
    overwrite: bool,
    config: &Config,
) -> Result<MediaId, ImportError> {
    let existing = match source {
        Some(source_id) => store.edited_variant_of(source_id)?,
        None => None,
    };
    if let (Some(source_id), Some(_), false) = (source, existing, overwrite) {
        return Err(ImportError::EditedPayloadConflict { source_id });
    }

    let source_item = match source {
        Some(source_id) => store.by_id(source_id)?,
        None => None,
    };
    let filename = source_item
        .as_ref()
        .and_then(|item| item.original_filename.clone())
        .unwrap_or_else(|| EDITED_FILENAME.to_string());

    let image = image::load_from_memory(&bytes).map_err(|e| ImportError::Decode {
        path: PathBuf::from(&filename),
        reason: e.to_string(),
    })?;
    let preview = encode_preview(&image, config.preview_max_dimension, config.preview_jpeg_quality)
        .map_err(|e| ImportError::Preview {
            path: PathBuf::from(&filename),
            reason: e.to_string(),
        })?;

    let item = NewMediaItem {
        kind: MediaKind::Edited { source },
        created_at: Utc::now(),
        perceptual_hash: PerceptualHasher::new().hash_image(&image),
        file_size: bytes.len() as u64,
        dimensions: Dimensions::new(image.width(), image.height()),
        original_filename: Some(filename),
        orientation: source_item.map(|item| item.orientation).unwrap_or(1),
        original: Some(bytes),
        preview: Some(preview),
    };

    let id = match existing {
        Some(existing_id) => {
            store.replace(existing_id, item)?;
            info!(id = %existing_id, "replaced edited variant");
            existing_id
        }
        None => {
            let id = store.insert(item)?;
            info!(%id, "imported edited variant");
            id
        }
    };
    store.save()?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::ImageHash;
    use crate::core::library::{InMemoryStore, Tier};
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let image = ImageBuffer::from_pixel(width, height, Rgb([shade, shade, shade]));
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    fn source_item(store: &InMemoryStore) -> MediaId {
        let original = Some(png(4, 4, 10));
        let mut item = NewMediaItem::imported(Utc::now(), ImageHash::new(0), original, None)
            .with_filename("beach.jpg");
        item.orientation = 6;
        store.insert(item).unwrap()
    }

    #[test]
    fn edited_variant_inherits_from_source() {
        let store = InMemoryStore::new();
        let source = source_item(&store);

        let id =
            import_edited(&store, png(8, 6, 200), Some(source), false, &Config::default()).unwrap();

        let item = store.by_id(id).unwrap().unwrap();
        assert_eq!(item.kind, MediaKind::Edited { source: Some(source) });
        assert_eq!(item.orientation, 6);
        assert_eq!(item.original_filename.as_deref(), Some("beach.jpg"));
        assert_eq!(item.dimensions, Dimensions::new(8, 6));
        assert_eq!(store.edited_variant_of(source).unwrap(), Some(id));
    }

    #[test]
    fn second_variant_conflicts_without_overwrite() {
        let store = InMemoryStore::new();
        let source = source_item(&store);
        import_edited(&store, png(8, 6, 200), Some(source), false, &Config::default()).unwrap();

        let result = import_edited(&store, png(8, 6, 50), Some(source), false, &Config::default());

        assert!(matches!(
            result,
            Err(ImportError::EditedPayloadConflict { source_id }) if source_id == source
        ));
    }

    #[test]
    fn overwrite_replaces_and_keeps_id() {
        let store = InMemoryStore::new();
        let source = source_item(&store);
        let first =
            import_edited(&store, png(8, 6, 200), Some(source), false, &Config::default()).unwrap();

        let replacement = png(16, 12, 50);
        let config = Config::default();
        let second =
            import_edited(&store, replacement.clone(), Some(source), true, &config).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.payload(second, Tier::Original).unwrap(), Some(replacement));
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn unlinked_variant_gets_default_name() {
        let store = InMemoryStore::new();

        let id = import_edited(&store, png(2, 2, 0), None, false, &Config::default()).unwrap();

        let item = store.by_id(id).unwrap().unwrap();
        assert_eq!(item.original_filename.as_deref(), Some("Edited Image"));
        assert_eq!(item.orientation, 1);
    }

    #[test]
    fn undecodable_bytes_are_rejected() {
        let store = InMemoryStore::new();
        let result = import_edited(&store, b"xx".to_vec(), None, false, &Config::default());
        assert!(matches!(result, Err(ImportError::Decode { .. })));
        assert!(store.list().unwrap().is_empty());
    }
}
