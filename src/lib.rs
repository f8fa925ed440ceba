//! # PhotoFlow
//!
//! A triage engine for browsing a photo library: flag, filter, group and
//! preview.
//!
//! ## Core Ideas
//! - **Positional updates** - Filter passes report exact inserts and removes,
//!   so a list UI can animate them without reloading
//! - **No surprise reordering** - Flagging an item never makes it vanish
//!   until the filters are applied again
//! - **Preview first** - Thumbnails arrive before full-quality originals
//!
//! ## Architecture
//! The library is split into a core engine (presentation-agnostic) and the
//! command-line front end:
//! - `core` - Store, views, grouping, fetching and import
//! - `config` - Explicit engine configuration
//! - `events` - Event-driven progress and change reporting
//! - `error` - User-friendly error types

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use config::Config;
pub use error::{PhotoFlowError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. Calling it again
/// keeps the subscriber that is already installed.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
