//! Cover-fit resizing into the fixed comparison space.
//!
//! Uses fast_image_resize which is 5-14x faster than the image crate's resize
//! and picks AVX2/NEON SIMD automatically.

use crate::error::ScoreError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, ImageBuffer, Rgb};

/// Side length of the comparison space
pub const NORMALIZED_SIZE: u32 = 224;

/// Number of grayscale samples in a normalized image
pub const SAMPLE_COUNT: usize = (NORMALIZED_SIZE * NORMALIZED_SIZE) as usize;

/// A 224x224 single-channel 8-bit image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    samples: Vec<u8>,
}

impl NormalizedImage {
    /// Wrap a grayscale buffer that already has the normalized dimensions
    pub fn from_gray(gray: GrayImage) -> Option<Self> {
        if gray.width() != NORMALIZED_SIZE || gray.height() != NORMALIZED_SIZE {
            return None;
        }
        Some(Self {
            samples: gray.into_raw(),
        })
    }

    /// Grayscale samples in raster order
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn width(&self) -> u32 {
        NORMALIZED_SIZE
    }

    pub fn height(&self) -> u32 {
        NORMALIZED_SIZE
    }
}

/// Source window that a cover fit keeps.
///
/// The shorter side is scaled to fill the destination and the overflow on
/// the longer side is split evenly between both edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverCrop {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CoverCrop {
    pub fn compute(src_width: u32, src_height: u32, dst_width: u32, dst_height: u32) -> Self {
        let (sw, sh) = (src_width as f64, src_height as f64);
        let (dw, dh) = (dst_width as f64, dst_height as f64);
        let scale = (dw / sw).max(dh / sh);

        let width = (dw / scale).min(sw);
        let height = (dh / scale).min(sh);

        Self {
            left: (sw - width) / 2.0,
            top: (sh - height) / 2.0,
            width,
            height,
        }
    }
}

/// Resizes decoded images into the comparison space
pub struct Normalizer {
    resizer: Resizer,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Cover-fit the image to 224x224, then convert to luma.
    ///
    /// Resizing happens on RGB so the luma weights see the interpolated
    /// colors rather than pre-averaged brightness.
    pub fn normalize(
        &mut self,
        image: &DynamicImage,
        label: &str,
    ) -> Result<NormalizedImage, ScoreError> {
        let rgb = image.to_rgb8();
        let (src_width, src_height) = rgb.dimensions();

        if src_width == 0 || src_height == 0 {
            return Err(ScoreError::EmptyImage {
                label: label.to_string(),
            });
        }

        let src_image = Image::from_vec_u8(src_width, src_height, rgb.into_raw(), PixelType::U8x3)
            .map_err(|e| ScoreError::Normalize {
                label: label.to_string(),
                reason: format!("failed to wrap source pixels: {}", e),
            })?;

        let mut dst_image = Image::new(NORMALIZED_SIZE, NORMALIZED_SIZE, PixelType::U8x3);

        let crop = CoverCrop::compute(src_width, src_height, NORMALIZED_SIZE, NORMALIZED_SIZE);
        let options = ResizeOptions::new()
            .resize_alg(ResizeAlg::Convolution(FilterType::Bilinear))
            .crop(crop.left, crop.top, crop.width, crop.height);

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| ScoreError::Normalize {
                label: label.to_string(),
                reason: format!("resize failed: {}", e),
            })?;

        let resized: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_raw(NORMALIZED_SIZE, NORMALIZED_SIZE, dst_image.into_vec())
                .ok_or_else(|| ScoreError::Normalize {
                    label: label.to_string(),
                    reason: "resized buffer has the wrong length".to_string(),
                })?;

        let gray = DynamicImage::ImageRgb8(resized).to_luma8();

        NormalizedImage::from_gray(gray).ok_or_else(|| ScoreError::Normalize {
            label: label.to_string(),
            reason: "grayscale conversion changed the dimensions".to_string(),
        })
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function for one-off normalization
pub fn normalize(image: &DynamicImage, label: &str) -> Result<NormalizedImage, ScoreError> {
    Normalizer::new().normalize(image, label)
}
