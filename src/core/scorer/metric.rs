//! Pixel distance and its mapping onto the 0-100 score.

use super::normalize::NormalizedImage;

/// Largest possible squared difference between two 8-bit samples (255²)
pub const MAX_SQUARED_ERROR: f64 = 65025.0;

/// Mean squared error over two equal-length sample sequences.
///
/// Sequences of different lengths are compared over the shorter prefix;
/// two empty sequences have no error.
pub fn mean_squared_error(a: &[u8], b: &[u8]) -> f64 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }

    let total: u64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let diff = x as i64 - y as i64;
            (diff * diff) as u64
        })
        .sum();

    total as f64 / len as f64
}

/// Map an MSE onto an integer score: `round(100 * (1 - mse / 255²))`,
/// clamped to 0..=100.
pub fn score_from_mse(mse: f64) -> u8 {
    let raw = ((1.0 - mse / MAX_SQUARED_ERROR) * 100.0).round();
    raw.clamp(0.0, 100.0) as u8
}

/// MSE between two normalized images
pub fn image_mse(a: &NormalizedImage, b: &NormalizedImage) -> f64 {
    mean_squared_error(a.samples(), b.samples())
}
