//! # photoflow CLI
//!
//! Command-line interface for the PhotoFlow browsing engine.
//!
//! ## Usage
//! ```bash
//! photoflow import ~/Photos/2024-05
//! photoflow list --status accepted
//! ```

mod cli;

use photoflow::Result;

fn main() -> Result<()> {
    photoflow::init_tracing();
    cli::run()
}
