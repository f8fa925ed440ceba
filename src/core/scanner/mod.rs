//! # Scanner Module
//!
//! Finds importable image files on disk.
//!
//! Directories are walked recursively; files given directly are taken as
//! they are if the decoder supports their format. The result is sorted
//! and free of duplicates so repeated imports queue files in a stable
//! order.

mod filter;

pub use filter::ImageFilter;

use crate::error::ImportError;
use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Collect importable images under `paths`
///
/// A path that does not exist fails the whole call. Unreadable entries
/// inside a directory are skipped with a warning.
pub fn discover_images(
    paths: &[PathBuf],
    include_hidden: bool,
) -> Result<Vec<PathBuf>, ImportError> {
    let image_filter = ImageFilter::new().with_hidden(include_hidden);
    let mut found = BTreeSet::new();

    for root in paths {
        if !root.exists() {
            return Err(ImportError::Io {
                path: root.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "path does not exist"),
            });
        }

        if root.is_file() {
            if image_filter.should_include(root) {
                found.insert(root.clone());
            }
            continue;
        }

        let walker = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|entry| {
            // never descend into hidden directories, but honour an explicit hidden root
            entry.depth() == 0 || include_hidden || !filter::is_hidden(entry.path())
        });

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if image_filter.should_include(entry.path()) {
                        found.insert(entry.into_path());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                    warn!(%path, error = %e, "skipping unreadable entry");
                }
            }
        }
    }

    debug!(count = found.len(), "discovered images");
    Ok(found.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, relative: &str) -> PathBuf {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn walks_directories_recursively_and_sorts() {
        let dir = TempDir::new().unwrap();
        let b = touch(&dir, "b.png");
        let a = touch(&dir, "nested/a.jpg");
        touch(&dir, "notes.txt");

        let found = discover_images(&[dir.path().to_path_buf()], false).unwrap();

        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn hidden_directories_are_skipped_unless_requested() {
        let dir = TempDir::new().unwrap();
        let hidden = touch(&dir, ".cache/thumb.jpg");
        touch(&dir, ".dotfile.png");

        assert!(discover_images(&[dir.path().to_path_buf()], false).unwrap().is_empty());

        let found = discover_images(&[dir.path().to_path_buf()], true).unwrap();
        assert!(found.contains(&hidden));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn explicit_files_are_deduplicated() {
        let dir = TempDir::new().unwrap();
        let file = touch(&dir, "photo.jpeg");

        let inputs = [file.clone(), file.clone(), dir.path().to_path_buf()];
        let found = discover_images(&inputs, false).unwrap();

        assert_eq!(found, vec![file]);
    }

    #[test]
    fn missing_path_fails() {
        let result = discover_images(&[PathBuf::from("/definitely/not/here")], false);
        assert!(matches!(result, Err(ImportError::Io { .. })));
    }
}
