//! # Picture Match
//!
//! Backend for a prompt-guessing game: the server generates an image from a
//! hidden prompt, the player writes their own prompt to recreate it, and the
//! two images are scored for similarity.
//!
//! ## Architecture
//! - `core` - scoring, fetching, generation and round orchestration
//! - `server` - JSON API over HTTP
//! - `events` - Event-driven progress reporting
//! - `error` - Error types and their classification
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;
pub mod server;

// Re-export commonly used types at the crate root
pub use crate::core::scorer::score;
pub use error::{GameError, Result};

/// Initialize tracing for the application.
///
/// Honors `RUST_LOG`; defaults to `info` when it is unset or invalid.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    // A subscriber may already be installed (tests, embedding apps).
    let _ = tracing::subscriber::set_global_default(subscriber);
}
