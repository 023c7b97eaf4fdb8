//! # picture-match CLI
//!
//! Command-line interface for the picture-match game backend.
//!
//! ## Usage
//! ```bash
//! picture-match score target.png candidate.jpg
//! picture-match round --language en
//! picture-match serve --port 3000
//! ```

mod cli;

use picture_match::Result;

fn main() -> Result<()> {
    cli::run()
}
