//! SQLite store backend for persistent libraries.

use super::{
    Dimensions, MediaId, MediaItem, MediaKind, MediaStatus, MediaStore, NewMediaItem, StoreReader,
    Tier,
};
use crate::core::hasher::ImageHash;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

const ITEM_COLUMNS: &str = "id, kind, status, source_id, created_at, perceptual_hash, \
     file_size, width, height, original_filename, orientation";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed media library
///
/// The primary connection is the only write path. Writes open a
/// transaction lazily which `save` commits. Fetches read through separate
/// read-only connections, so they only ever see committed data and never
/// block on a pending write (WAL mode).
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create a library file at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::OpenFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            }
        }

        let conn = Connection::open(path).map_err(|e| StoreError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS media_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                status TEXT,
                source_id INTEGER,
                created_at INTEGER NOT NULL,
                perceptual_hash INTEGER NOT NULL,
                file_size INTEGER NOT NULL,
                width INTEGER NOT NULL,
                height INTEGER NOT NULL,
                original_filename TEXT,
                orientation INTEGER NOT NULL,
                data BLOB,
                preview_data BLOB
            )",
            [],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_media_created ON media_items(created_at, id)",
            [],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_media_source ON media_items(source_id)",
            [],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        debug!(path = %path.display(), "opened media library");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    /// Path of the library file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Start a transaction unless one is already pending
    fn begin_write(conn: &Connection) -> Result<(), StoreError> {
        if conn.is_autocommit() {
            conn.execute_batch("BEGIN IMMEDIATE")
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn kind_columns(kind: &MediaKind) -> (&'static str, Option<&'static str>, Option<i64>) {
        match kind {
            MediaKind::Imported { status } => ("imported", Some(status.as_str()), None),
            MediaKind::Edited { source } => ("edited", None, source.map(MediaId::get)),
        }
    }

    fn row_to_item(row: &Row<'_>) -> rusqlite::Result<MediaItem> {
        let id = MediaId::new(row.get(0)?);
        let kind: String = row.get(1)?;
        let status: Option<String> = row.get(2)?;
        let source: Option<i64> = row.get(3)?;

        let kind = if kind == "edited" {
            MediaKind::Edited {
                source: source.map(MediaId::new),
            }
        } else {
            MediaKind::Imported {
                status: status
                    .as_deref()
                    .and_then(MediaStatus::parse)
                    .unwrap_or_default(),
            }
        };

        let created_ms: i64 = row.get(4)?;
        let hash: i64 = row.get(5)?;
        let file_size: i64 = row.get(6)?;
        let width: i64 = row.get(7)?;
        let height: i64 = row.get(8)?;
        let orientation: i64 = row.get(10)?;

        Ok(MediaItem {
            id,
            kind,
            created_at: DateTime::<Utc>::from_timestamp_millis(created_ms).unwrap_or_default(),
            perceptual_hash: ImageHash::new(hash as u64),
            file_size: file_size.max(0) as u64,
            dimensions: Dimensions::new(width.max(0) as u32, height.max(0) as u32),
            original_filename: row.get(9)?,
            orientation: orientation.clamp(1, 8) as u16,
        })
    }

    fn payload_column(tier: Tier) -> &'static str {
        match tier {
            Tier::Preview => "preview_data",
            Tier::Original => "data",
        }
    }

    fn read_payload(
        conn: &Connection,
        id: MediaId,
        tier: Tier,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let sql = format!(
            "SELECT {} FROM media_items WHERE id = ?",
            Self::payload_column(tier)
        );

        let data: Option<Option<Vec<u8>>> = conn
            .query_row(&sql, [id.get()], |row| row.get(0))
            .optional()
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(data.flatten())
    }
}

impl MediaStore for SqliteStore {
    fn list(&self) -> Result<Vec<MediaItem>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM media_items ORDER BY created_at ASC, id ASC",
                ITEM_COLUMNS
            ))
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let items = stmt
            .query_map([], Self::row_to_item)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(items)
    }

    fn ids(&self) -> Result<Vec<MediaId>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;

        let mut stmt = conn
            .prepare("SELECT id FROM media_items ORDER BY created_at ASC, id ASC")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0).map(MediaId::new))
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(ids)
    }

    fn by_id(&self, id: MediaId) -> Result<Option<MediaItem>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;

        conn.query_row(
            &format!("SELECT {} FROM media_items WHERE id = ?", ITEM_COLUMNS),
            [id.get()],
            Self::row_to_item,
        )
        .optional()
        .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }

    fn payload(&self, id: MediaId, tier: Tier) -> Result<Option<Vec<u8>>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        Self::read_payload(&conn, id, tier)
    }

    fn perceptual_hash(&self, id: MediaId) -> Result<Option<ImageHash>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;

        let hash: Option<i64> = conn
            .query_row(
                "SELECT perceptual_hash FROM media_items WHERE id = ?",
                [id.get()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(hash.map(|h| ImageHash::new(h as u64)))
    }

    fn set_status(&self, id: MediaId, status: MediaStatus) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        Self::begin_write(&conn)?;

        let updated = conn
            .execute(
                "UPDATE media_items SET status = ? WHERE id = ? AND kind = 'imported'",
                params![status.as_str(), id.get()],
            )
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        if updated == 0 {
            return Err(StoreError::ItemNotFound { id });
        }
        Ok(())
    }

    fn insert(&self, item: NewMediaItem) -> Result<MediaId, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        Self::begin_write(&conn)?;

        let (kind, status, source) = Self::kind_columns(&item.kind);
        conn.execute(
            "INSERT INTO media_items
             (kind, status, source_id, created_at, perceptual_hash, file_size, width, height,
              original_filename, orientation, data, preview_data)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                kind,
                status,
                source,
                item.created_at.timestamp_millis(),
                item.perceptual_hash.value() as i64,
                item.file_size as i64,
                item.dimensions.width as i64,
                item.dimensions.height as i64,
                item.original_filename,
                item.orientation as i64,
                item.original,
                item.preview,
            ],
        )
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        Ok(MediaId::new(conn.last_insert_rowid()))
    }

    fn replace(&self, id: MediaId, item: NewMediaItem) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        Self::begin_write(&conn)?;

        let (kind, status, source) = Self::kind_columns(&item.kind);
        let updated = conn
            .execute(
                "UPDATE media_items SET
                 kind = ?, status = ?, source_id = ?, created_at = ?, perceptual_hash = ?,
                 file_size = ?, width = ?, height = ?, original_filename = ?, orientation = ?,
                 data = ?, preview_data = ?
                 WHERE id = ?",
                params![
                    kind,
                    status,
                    source,
                    item.created_at.timestamp_millis(),
                    item.perceptual_hash.value() as i64,
                    item.file_size as i64,
                    item.dimensions.width as i64,
                    item.dimensions.height as i64,
                    item.original_filename,
                    item.orientation as i64,
                    item.original,
                    item.preview,
                    id.get(),
                ],
            )
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        if updated == 0 {
            return Err(StoreError::ItemNotFound { id });
        }
        Ok(())
    }

    fn edited_variant_of(&self, source: MediaId) -> Result<Option<MediaId>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;

        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM media_items WHERE kind = 'edited' AND source_id = ? LIMIT 1",
                [source.get()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(id.map(MediaId::new))
    }

    fn save(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;

        if conn.is_autocommit() {
            return Ok(());
        }

        if let Err(e) = conn.execute_batch("COMMIT") {
            warn!(error = %e, "commit failed, rolling back pending changes");
            let _ = conn.execute_batch("ROLLBACK");
            return Err(StoreError::WriteFailed(e.to_string()));
        }
        Ok(())
    }

    fn read_context(&self) -> Result<Box<dyn StoreReader>, StoreError> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StoreError::OpenFailed {
            path: self.db_path.clone(),
            reason: e.to_string(),
        })?;

        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(Box::new(SqliteReader { conn }))
    }
}

/// Read-only connection derived from a `SqliteStore`
struct SqliteReader {
    conn: Connection,
}

impl StoreReader for SqliteReader {
    fn contains(&self, id: MediaId) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM media_items WHERE id = ?", [id.get()], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(found.is_some())
    }

    fn payload(&self, id: MediaId, tier: Tier) -> Result<Option<Vec<u8>>, StoreError> {
        SqliteStore::read_payload(&self.conn, id, tier)
    }
}
