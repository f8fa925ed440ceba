//! # Error Module
//!
//! Error types for the PhotoFlow browsing engine.
//!
//! ## Design Principles
//! - **Never panic** on library data - return errors instead
//! - **Include context** - ids, tiers, paths, what went wrong
//! - **Fail fast** - nothing in the core retries; callers own resilience

use crate::core::library::{MediaId, Tier};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum PhotoFlowError {
    #[error("Library error: {0}")]
    Store(#[from] StoreError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by a media store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open media library at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Library query failed: {0}")]
    QueryFailed(String),

    /// The attempted write or commit did not go through.
    #[error("Failed to write to media library: {0}")]
    WriteFailed(String),

    #[error("Item {id} does not exist in the library")]
    ItemNotFound { id: MediaId },

    #[error("Media library lock was poisoned by a panicking writer")]
    LockPoisoned,
}

/// Errors delivered by the fetch pipeline
#[derive(Error, Debug)]
pub enum FetchError {
    /// The id no longer resolves against the current store snapshot.
    #[error("Item {id} was not found in the library")]
    ItemNotFound { id: MediaId },

    #[error("Unable to read {tier} payload of item {id}: {reason}")]
    UnreadablePayload {
        id: MediaId,
        tier: Tier,
        reason: String,
    },

    #[error("Fetch of item {id} was cancelled")]
    Cancelled { id: MediaId },

    #[error("Fetch of item {id} ended without delivering a result")]
    Interrupted { id: MediaId },

    #[error("Failed to start fetch workers: {0}")]
    WorkerPool(String),

    #[error("Library read failed: {0}")]
    Store(#[from] StoreError),
}

/// Errors that occur while importing media
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Item {source_id} already has an edited version; import with overwrite to replace it")]
    EditedPayloadConflict { source_id: MediaId },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to encode preview for {path}: {reason}")]
    Preview { path: PathBuf, reason: String },

    #[error("Failed to start import worker: {0}")]
    Worker(String),

    #[error("Import was cancelled")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, PhotoFlowError>;
