//! # Metadata Module
//!
//! Extracts EXIF metadata from encoded image bytes.
//!
//! ## Extracted Fields
//! - Date taken (DateTimeOriginal)
//! - Image dimensions (width x height)
//! - Camera make and model
//! - Orientation
//! - Exposure: f-number, exposure time, ISO, focal length
//!
//! Every field is optional. Payloads without EXIF (PNG, most previews)
//! still report the dimensions of the decoded raster.
//!
//! `Histogram` counts the decoded raster per colour channel.

mod histogram;

pub use histogram::{Channel, ChannelSummary, Histogram};

use crate::core::fetch::DecodedImage;
use chrono::{DateTime, NaiveDateTime, Utc};
use exif::{Exif, In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Extracted image metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Original capture date/time
    pub date_taken: Option<DateTime<Utc>>,
    /// Image width in pixels
    pub width: Option<u32>,
    /// Image height in pixels
    pub height: Option<u32>,
    /// Camera make (e.g., "Apple", "Canon")
    pub camera_make: Option<String>,
    /// Camera model (e.g., "iPhone 15 Pro")
    pub camera_model: Option<String>,
    /// Image orientation (1-8, where 1 is normal)
    pub orientation: Option<u16>,
    /// Aperture as an f-number (e.g., 1.8)
    pub f_number: Option<f64>,
    /// Exposure time in seconds
    pub exposure_time: Option<f64>,
    /// ISO speed rating
    pub iso: Option<u32>,
    /// Focal length in millimetres
    pub focal_length: Option<f64>,
}

impl MediaMetadata {
    /// Check if any EXIF-derived metadata was extracted
    pub fn has_data(&self) -> bool {
        self.date_taken.is_some()
            || self.camera_make.is_some()
            || self.camera_model.is_some()
            || self.f_number.is_some()
            || self.exposure_time.is_some()
            || self.iso.is_some()
            || self.focal_length.is_some()
    }

    /// Get a display string for the camera
    pub fn camera_display(&self) -> Option<String> {
        match (&self.camera_make, &self.camera_model) {
            (Some(make), Some(model)) => {
                // Avoid duplication like "Apple Apple iPhone"
                if model.starts_with(make) {
                    Some(model.clone())
                } else {
                    Some(format!("{} {}", make, model))
                }
            }
            (None, Some(model)) => Some(model.clone()),
            (Some(make), None) => Some(make.clone()),
            (None, None) => None,
        }
    }

    pub fn dimensions_display(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        }
    }

    /// Exposure summary such as "f/1.8 1/120s ISO 100 26mm"
    pub fn exposure_display(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(f) = self.f_number {
            parts.push(format!("f/{}", trim_float(f)));
        }
        if let Some(t) = self.exposure_time {
            if t > 0.0 && t < 1.0 {
                parts.push(format!("1/{}s", (1.0 / t).round()));
            } else {
                parts.push(format!("{}s", trim_float(t)));
            }
        }
        if let Some(iso) = self.iso {
            parts.push(format!("ISO {}", iso));
        }
        if let Some(focal) = self.focal_length {
            parts.push(format!("{}mm", trim_float(focal)));
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

fn trim_float(value: f64) -> String {
    let text = format!("{:.1}", value);
    text.strip_suffix(".0").map(str::to_string).unwrap_or(text)
}

/// Turns a decoded payload into metadata
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, image: &DecodedImage) -> MediaMetadata;
}

/// Reads EXIF tags with `kamadak-exif`, tolerating absent keys
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifMetadataExtractor;

impl ExifMetadataExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataExtractor for ExifMetadataExtractor {
    fn extract(&self, image: &DecodedImage) -> MediaMetadata {
        let mut metadata = extract_from_bytes(&image.encoded);
        // the raster is authoritative where EXIF is silent
        metadata.width.get_or_insert(image.width());
        metadata.height.get_or_insert(image.height());
        metadata
    }
}

/// Parse the EXIF block of an encoded image, if it has one
pub fn read_exif(bytes: &[u8]) -> Option<Exif> {
    let mut cursor = Cursor::new(bytes);
    Reader::new().read_from_container(&mut cursor).ok()
}

/// Extract EXIF metadata from encoded image bytes
pub fn extract_from_bytes(bytes: &[u8]) -> MediaMetadata {
    let mut metadata = MediaMetadata::default();

    let exif_reader = match read_exif(bytes) {
        Some(r) => r,
        None => return metadata,
    };

    metadata.date_taken = date_taken(&exif_reader);

    // Extract dimensions - prefer actual pixel dimensions
    if let Some(field) = exif_reader.get_field(Tag::PixelXDimension, In::PRIMARY) {
        metadata.width = get_u32_value(&field.value);
    }
    if let Some(field) = exif_reader.get_field(Tag::PixelYDimension, In::PRIMARY) {
        metadata.height = get_u32_value(&field.value);
    }
    if metadata.width.is_none() {
        if let Some(field) = exif_reader.get_field(Tag::ImageWidth, In::PRIMARY) {
            metadata.width = get_u32_value(&field.value);
        }
    }
    if metadata.height.is_none() {
        if let Some(field) = exif_reader.get_field(Tag::ImageLength, In::PRIMARY) {
            metadata.height = get_u32_value(&field.value);
        }
    }

    if let Some(field) = exif_reader.get_field(Tag::Make, In::PRIMARY) {
        metadata.camera_make = get_string_value(&field.value);
    }
    if let Some(field) = exif_reader.get_field(Tag::Model, In::PRIMARY) {
        metadata.camera_model = get_string_value(&field.value);
    }

    metadata.orientation = orientation(&exif_reader);

    if let Some(field) = exif_reader.get_field(Tag::FNumber, In::PRIMARY) {
        metadata.f_number = get_f64_value(&field.value);
    }
    if let Some(field) = exif_reader.get_field(Tag::ExposureTime, In::PRIMARY) {
        metadata.exposure_time = get_f64_value(&field.value);
    }
    if let Some(field) = exif_reader.get_field(Tag::PhotographicSensitivity, In::PRIMARY) {
        metadata.iso = get_u32_value(&field.value);
    }
    if let Some(field) = exif_reader.get_field(Tag::FocalLength, In::PRIMARY) {
        metadata.focal_length = get_f64_value(&field.value);
    }

    metadata
}

/// DateTimeOriginal, interpreted as UTC
pub fn date_taken(exif: &Exif) -> Option<DateTime<Utc>> {
    let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
    let text = get_string_value(&field.value)?;
    // EXIF date format: "YYYY:MM:DD HH:MM:SS"
    let naive = NaiveDateTime::parse_from_str(&text, "%Y:%m:%d %H:%M:%S").ok()?;
    Some(DateTime::from_naive_utc_and_offset(naive, Utc))
}

pub fn orientation(exif: &Exif) -> Option<u16> {
    let field = exif.get_field(Tag::Orientation, In::PRIMARY)?;
    match field.value {
        Value::Short(ref vec) => vec.first().copied(),
        _ => None,
    }
}

/// Helper to extract u32 from various EXIF value types
fn get_u32_value(value: &Value) -> Option<u32> {
    match value {
        Value::Long(vec) => vec.first().copied(),
        Value::Short(vec) => vec.first().map(|v| *v as u32),
        _ => None,
    }
}

fn get_f64_value(value: &Value) -> Option<f64> {
    match value {
        Value::Rational(vec) => vec.first().map(|r| r.to_f64()),
        Value::SRational(vec) => vec.first().map(|r| r.to_f64()),
        Value::Short(vec) => vec.first().map(|v| *v as f64),
        Value::Long(vec) => vec.first().map(|v| *v as f64),
        _ => None,
    }
}

/// Helper to extract string from EXIF ASCII value
fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}
