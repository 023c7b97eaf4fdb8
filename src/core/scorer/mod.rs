//! # Scorer Module
//!
//! Scores how visually similar two images are, from 0 to 100.
//!
//! ## How It Works
//! 1. Decode both payloads (zune-jpeg for JPEG, image crate otherwise)
//! 2. Cover-fit each to 224x224, center-cropping the overflow
//! 3. Convert to 8-bit luma
//! 4. Mean squared error over the 50,176 sample pairs
//! 5. `score = round(100 * (1 - mse / 255²))`, clamped to 0..=100
//!
//! Both images are decoded and normalized in parallel.
//!
//! ## Score Tiers
//! | Score  | Tier      |
//! |--------|-----------|
//! | 81-100 | Great     |
//! | 61-80  | Good      |
//! | 0-60   | Try again |
//!
//! ## Example
//! ```rust,ignore
//! use picture_match::core::scorer::score;
//!
//! let similarity = score(&target_bytes, &candidate_bytes)?;
//! ```

pub mod decode;
pub mod metric;
pub mod normalize;

pub use decode::{ImageDecoder, SourceFormat};
pub use metric::{mean_squared_error, score_from_mse, MAX_SQUARED_ERROR};
pub use normalize::{CoverCrop, NormalizedImage, Normalizer, NORMALIZED_SIZE, SAMPLE_COUNT};

use crate::error::ScoreError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Feedback bucket for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    /// Score above 80
    Great,
    /// Score above 60
    Good,
    /// Anything else
    TryAgain,
}

impl ScoreTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            81.. => ScoreTier::Great,
            61..=80 => ScoreTier::Good,
            _ => ScoreTier::TryAgain,
        }
    }
}

impl std::fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreTier::Great => write!(f, "Great"),
            ScoreTier::Good => write!(f, "Good"),
            ScoreTier::TryAgain => write!(f, "Try again"),
        }
    }
}

/// Result of comparing two images
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Similarity score (0-100)
    pub score: u8,
    /// Feedback bucket for the score
    pub tier: ScoreTier,
    /// Mean squared error in the normalized grayscale space
    pub mse: f64,
}

impl Comparison {
    /// Compare two already-normalized images
    pub fn between(target: &NormalizedImage, candidate: &NormalizedImage) -> Self {
        let mse = metric::image_mse(target, candidate);
        let score = score_from_mse(mse);
        Self {
            score,
            tier: ScoreTier::from_score(score),
            mse,
        }
    }
}

/// Decode and normalize one payload
pub fn prepare(bytes: &[u8], label: &str) -> Result<NormalizedImage, ScoreError> {
    let image = ImageDecoder::decode(bytes, label)?;
    debug!(label, width = image.width(), height = image.height(), "Normalizing image");
    normalize::normalize(&image, label)
}

/// Stateless similarity scorer.
///
/// Holds no buffers between calls, so one instance can be shared freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer;

impl SimilarityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Compare a target payload against a candidate payload.
    ///
    /// Fails if either payload cannot be decoded; a failure is never
    /// reported as a low score.
    pub fn compare(&self, target: &[u8], candidate: &[u8]) -> Result<Comparison, ScoreError> {
        let (target, candidate) = rayon::join(
            || prepare(target, "target"),
            || prepare(candidate, "candidate"),
        );
        let (target, candidate) = (target?, candidate?);

        let comparison = Comparison::between(&target, &candidate);
        debug!(score = comparison.score, mse = comparison.mse, "Images compared");
        Ok(comparison)
    }
}

/// Score two encoded images (0-100)
pub fn score(image_a: &[u8], image_b: &[u8]) -> Result<u8, ScoreError> {
    SimilarityScorer::new()
        .compare(image_a, image_b)
        .map(|comparison| comparison.score)
}
