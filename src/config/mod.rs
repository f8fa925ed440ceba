//! # Config Module
//!
//! Explicit engine configuration, constructed once by the entry point and
//! threaded into views, the fetch pipeline and importers. There is no
//! process-wide settings store.
//!
//! ## Example config file
//! ```json
//! {
//!   "similarity_threshold": 20,
//!   "fetch_workers": 4,
//!   "default_filter": ["unspecified", "accepted"]
//! }
//! ```

use crate::core::filter::StatusFilter;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hashes closer than this are considered similar (strict less-than)
    pub similarity_threshold: u32,
    /// Number of threads serving fetch requests
    pub fetch_workers: usize,
    /// Longest edge of generated previews, in pixels
    pub preview_max_dimension: u32,
    /// JPEG quality of generated previews (1-100)
    pub preview_jpeg_quality: u8,
    /// Filter new browsing views start with
    pub default_filter: StatusFilter,
    /// Whether directory imports pick up hidden files
    pub include_hidden: bool,
    /// Longest capture-time gap, in minutes, inside one import session
    pub session_gap_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            similarity_threshold: 20,
            fetch_workers: 2,
            preview_max_dimension: 500,
            preview_jpeg_quality: 60,
            default_filter: StatusFilter::default(),
            include_hidden: false,
            session_gap_minutes: 30,
        }
    }
}

impl Config {
    /// Load a configuration file, falling back to defaults for absent keys
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config =
            serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_workers == 0 {
            return Err(ConfigError::Invalid {
                key: "fetch_workers",
                reason: "at least one worker is required".to_string(),
            });
        }
        if self.preview_max_dimension == 0 {
            return Err(ConfigError::Invalid {
                key: "preview_max_dimension",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.session_gap_minutes == 0 {
            return Err(ConfigError::Invalid {
                key: "session_gap_minutes",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(1..=100).contains(&self.preview_jpeg_quality) {
            return Err(ConfigError::Invalid {
                key: "preview_jpeg_quality",
                reason: format!("{} is outside 1-100", self.preview_jpeg_quality),
            });
        }
        Ok(())
    }

    /// Where the CLI keeps its library when `--library` is not given
    pub fn default_library_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photoflow")
            .join("library.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::library::MediaStatus;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.similarity_threshold, 20);
        assert_eq!(config.preview_max_dimension, 500);
        assert_eq!(config.session_gap_minutes, 30);
        assert!(config.default_filter.contains(MediaStatus::Accepted));
        assert!(config.default_filter.contains(MediaStatus::Unspecified));
        assert!(!config.default_filter.contains(MediaStatus::Rejected));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_fills_missing_keys_with_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"similarity_threshold": 12, "default_filter": ["rejected"]}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.similarity_threshold, 12);
        assert_eq!(config.fetch_workers, 2);
        assert!(config.default_filter.contains(MediaStatus::Rejected));
        assert!(!config.default_filter.contains(MediaStatus::Accepted));
    }

    #[test]
    fn load_rejects_zero_workers() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"fetch_workers": 0}}"#).unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.to_string().contains("fetch_workers"));
    }

    #[test]
    fn load_rejects_zero_session_gap() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"session_gap_minutes": 0}}"#).unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.to_string().contains("session_gap_minutes"));
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
    }
}
