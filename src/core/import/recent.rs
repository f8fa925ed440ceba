//! Grouping import candidates into capture sessions.

use super::job::modified_time;
use crate::core::metadata::{date_taken, read_exif};
use crate::error::ImportError;
use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file that could be imported, with its capture time if one is known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCandidate {
    pub path: PathBuf,
    pub captured_at: Option<DateTime<Utc>>,
}

impl ImportCandidate {
    pub fn new(path: impl Into<PathBuf>, captured_at: Option<DateTime<Utc>>) -> Self {
        Self {
            path: path.into(),
            captured_at,
        }
    }

    /// Capture time from EXIF `DateTimeOriginal`, else the file mtime
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let bytes = fs::read(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let captured_at = read_exif(&bytes)
            .as_ref()
            .and_then(date_taken)
            .or_else(|| modified_time(path));
        Ok(Self::new(path, captured_at))
    }
}

/// Read capture times for many files in parallel, keeping input order
pub fn scan_candidates(paths: &[PathBuf]) -> Result<Vec<ImportCandidate>, ImportError> {
    let candidates = paths
        .par_iter()
        .map(|path| ImportCandidate::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = candidates.len(), "read candidate capture times");
    Ok(candidates)
}

/// Split candidates into capture sessions, newest first
///
/// Candidates are ordered by capture time, newest first; undated ones go
/// last in input order. A new session starts whenever the previous
/// candidate was captured more than `gap` after the current one. An
/// undated candidate never starts a session.
pub fn group_sessions(
    mut candidates: Vec<ImportCandidate>,
    gap: Duration,
) -> Vec<Vec<ImportCandidate>> {
    candidates.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));

    let mut sessions: Vec<Vec<ImportCandidate>> = Vec::new();
    let mut current: Vec<ImportCandidate> = Vec::new();
    for candidate in candidates {
        let previous = current.last().and_then(|c| c.captured_at);
        if let (Some(previous), Some(captured)) = (previous, candidate.captured_at) {
            if previous - captured > gap {
                sessions.push(std::mem::take(&mut current));
            }
        }
        current.push(candidate);
    }
    if !current.is_empty() {
        sessions.push(current);
    }
    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::{ImageFormat, Rgb, RgbImage};
    use tempfile::TempDir;

    fn at(hour: u32, minute: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2019, 5, 24, hour, minute, 0).unwrap())
    }

    fn names(sessions: &[Vec<ImportCandidate>]) -> Vec<Vec<&str>> {
        sessions
            .iter()
            .map(|s| s.iter().map(|c| c.path.to_str().unwrap()).collect())
            .collect()
    }

    #[test]
    fn sessions_split_on_long_gaps_newest_first() {
        let candidates = vec![
            ImportCandidate::new("a", at(9, 0)),
            ImportCandidate::new("b", at(9, 10)),
            ImportCandidate::new("c", at(14, 0)),
            ImportCandidate::new("d", at(14, 20)),
            ImportCandidate::new("e", at(9, 5)),
        ];

        let sessions = group_sessions(candidates, Duration::minutes(30));

        assert_eq!(names(&sessions), vec![vec!["d", "c"], vec!["b", "e", "a"]]);
    }

    #[test]
    fn gap_of_exactly_the_limit_stays_together() {
        let candidates = vec![
            ImportCandidate::new("early", at(10, 0)),
            ImportCandidate::new("late", at(10, 30)),
            ImportCandidate::new("later", at(11, 1)),
        ];

        let sessions = group_sessions(candidates, Duration::minutes(30));

        assert_eq!(names(&sessions), vec![vec!["later"], vec!["late", "early"]]);
    }

    #[test]
    fn undated_candidates_join_the_oldest_session() {
        let candidates = vec![
            ImportCandidate::new("x", None),
            ImportCandidate::new("a", at(8, 0)),
            ImportCandidate::new("y", None),
            ImportCandidate::new("b", at(12, 0)),
        ];

        let sessions = group_sessions(candidates, Duration::minutes(30));

        assert_eq!(names(&sessions), vec![vec!["b"], vec!["a", "x", "y"]]);
    }

    #[test]
    fn no_candidates_means_no_sessions() {
        assert!(group_sessions(Vec::new(), Duration::minutes(30)).is_empty());
    }

    #[test]
    fn scanned_files_fall_back_to_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.png");
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let candidates = scan_candidates(&[path.clone()]).unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].path, path);
        assert!(candidates[0].captured_at.is_some());
    }

    #[test]
    fn scanning_a_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = scan_candidates(&[dir.path().join("gone.png")]);
        assert!(matches!(result, Err(ImportError::Io { .. })));
    }
}
