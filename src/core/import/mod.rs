//! # Import Module
//!
//! Brings new items into the library.
//!
//! ## Bulk import
//! Jobs run one at a time on a background thread. Overall progress is
//! `(completed + current_fraction) / total`; it never decreases and reads
//! exactly 1.0 once every job is done. The first failing job stops the
//! queue; items imported before it stay in the library.
//!
//! ## Capture sessions
//! Before importing, candidate files can be grouped into sessions: sorted
//! newest first and split wherever consecutive capture times are further
//! apart than the configured gap.
//!
//! ## Edited variants
//! An imported item has at most one edited variant. Importing a second
//! one is refused unless the caller asks to overwrite.

mod edited;
mod job;
mod queue;
mod recent;

pub use edited::import_edited;
pub use job::{encode_preview, FileImportJob, ImportJob};
pub use queue::{ImportProgress, ImportQueue, ImportSession, ImportSummary};
pub use recent::{group_sessions, scan_candidates, ImportCandidate};
