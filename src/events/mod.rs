//! # Events Module
//!
//! Event-driven notification plumbing, GUI-agnostic.
//!
//! ## Design
//! The core emits events through channels, allowing any UI
//! (CLI, GUI, web) to subscribe. A subscription lives exactly as long
//! as its receiver; there is no implicit weak capture.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new::<Event>();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Import(ImportEvent::Progress(p)) = event {
//!             println!("{:.0}%", p.fraction * 100.0);
//!         }
//!     }
//! });
//!
//! let session = queue.start(store, sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
