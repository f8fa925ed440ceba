//! Decides which files are importable images.

use image::ImageFormat;
use std::path::Path;

/// Accepts files whose extension maps to a format the decoder can read
#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    /// Whether to include hidden files
    include_hidden: bool,
}

impl ImageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn include_hidden(&self) -> bool {
        self.include_hidden
    }

    /// Check if a file should be imported
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }
        self.format_of(path).is_some()
    }

    /// The decodable format for a path, judged by extension
    pub fn format_of(&self, path: &Path) -> Option<ImageFormat> {
        ImageFormat::from_path(path)
            .ok()
            .filter(|format| format.reading_enabled())
    }
}

pub(super) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
