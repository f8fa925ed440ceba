//! Import jobs.

use crate::config::Config;
use crate::core::hasher::PerceptualHasher;
use crate::core::library::{Dimensions, MediaId, MediaStore, NewMediaItem};
use crate::core::metadata::{date_taken, orientation, read_exif};
use crate::error::ImportError;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One unit of work in a bulk import
pub trait ImportJob: Send {
    /// Short description for progress output, usually a file name
    fn label(&self) -> String;

    /// Import one item, reporting progress in [0, 1] as it goes
    fn run(
        &mut self,
        store: &dyn MediaStore,
        progress: &mut dyn FnMut(f64),
    ) -> Result<MediaId, ImportError>;
}

/// Imports an image file from disk
#[derive(Debug, Clone)]
pub struct FileImportJob {
    path: PathBuf,
    preview_max_dimension: u32,
    preview_jpeg_quality: u8,
}

impl FileImportJob {
    pub fn new(path: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            path: path.into(),
            preview_max_dimension: config.preview_max_dimension,
            preview_jpeg_quality: config.preview_jpeg_quality,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImportJob for FileImportJob {
    fn label(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn run(
        &mut self,
        store: &dyn MediaStore,
        progress: &mut dyn FnMut(f64),
    ) -> Result<MediaId, ImportError> {
        let original = fs::read(&self.path).map_err(|source| ImportError::Io {
            path: self.path.clone(),
            source,
        })?;
        progress(0.25);

        let image = image::load_from_memory(&original).map_err(|e| ImportError::Decode {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        progress(0.5);

        let preview = encode_preview(&image, self.preview_max_dimension, self.preview_jpeg_quality)
            .map_err(|e| ImportError::Preview {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        let perceptual_hash = PerceptualHasher::new().hash_image(&image);
        progress(0.75);

        let exif = read_exif(&original);
        let created_at = exif
            .as_ref()
            .and_then(date_taken)
            .or_else(|| modified_time(&self.path))
            .unwrap_or_else(Utc::now);

        let item = NewMediaItem {
            file_size: original.len() as u64,
            dimensions: Dimensions::new(image.width(), image.height()),
            original_filename: Some(self.label()),
            orientation: exif.as_ref().and_then(orientation).unwrap_or(1),
            ..NewMediaItem::imported(created_at, perceptual_hash, Some(original), Some(preview))
        };

        let id = store.insert(item)?;
        store.save()?;
        debug!(%id, path = %self.path.display(), "imported file");
        progress(1.0);

        Ok(id)
    }
}

pub(super) fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

/// Downscale to fit `max_dimension` and encode as JPEG
pub fn encode_preview(
    image: &DynamicImage,
    max_dimension: u32,
    quality: u8,
) -> ImageResult<Vec<u8>> {
    let thumbnail = if image.width() <= max_dimension && image.height() <= max_dimension {
        image.to_rgb8()
    } else {
        image.thumbnail(max_dimension, max_dimension).to_rgb8()
    };
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&thumbnail)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::library::{InMemoryStore, MediaStatus, Tier};
    use image::{ImageBuffer, ImageFormat, Rgb};
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.path().join(name);
        let image = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        image.save_with_format(&path, ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn imports_file_with_preview_and_hash() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir, "sunset.png", 800, 600);
        let store = InMemoryStore::new();
        let mut job = FileImportJob::new(&path, &Config::default());
        let mut reported = Vec::new();

        let id = job.run(&store, &mut |p| reported.push(p)).unwrap();

        let item = store.by_id(id).unwrap().unwrap();
        assert_eq!(item.status(), Some(MediaStatus::Unspecified));
        assert_eq!(item.dimensions, Dimensions::new(800, 600));
        assert_eq!(item.original_filename.as_deref(), Some("sunset.png"));
        assert_eq!(item.file_size, fs::metadata(&path).unwrap().len());
        assert_eq!(reported, vec![0.25, 0.5, 0.75, 1.0]);
        assert_eq!(store.save_count(), 1);

        let preview = store.payload(id, Tier::Preview).unwrap().unwrap();
        let decoded = image::load_from_memory(&preview).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (500, 375));
    }

    #[test]
    fn missing_file_is_io_error() {
        let store = InMemoryStore::new();
        let mut job = FileImportJob::new("/nonexistent/photo.jpg", &Config::default());

        let result = job.run(&store, &mut |_| {});

        assert!(matches!(result, Err(ImportError::Io { .. })));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn undecodable_file_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"not really a jpeg").unwrap();
        let mut job = FileImportJob::new(&path, &Config::default());

        let result = job.run(&InMemoryStore::new(), &mut |_| {});

        assert!(matches!(result, Err(ImportError::Decode { .. })));
    }

    #[test]
    fn preview_never_upscales() {
        let image = DynamicImage::ImageRgb8(image::RgbImage::new(40, 20));
        let bytes = encode_preview(&image, 500, 60).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 20));
    }
}
