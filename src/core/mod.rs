//! # Core Module
//!
//! The transport-agnostic game engine.
//!
//! ## Modules
//! - `scorer` - Scores the similarity of two images (0-100)
//! - `fetch` - Resolves image locators into bytes
//! - `generator` - Turns prompts into images via an external provider
//! - `game` - Orchestrates rounds under a time budget

pub mod fetch;
pub mod game;
pub mod generator;
pub mod scorer;

// Re-export commonly used types
pub use fetch::{ImageFetcher, Locator};
pub use game::{GameConfig, GameService, Round};
pub use generator::{ImageGenerator, Language};
pub use scorer::{score, Comparison, ScoreTier, SimilarityScorer};
