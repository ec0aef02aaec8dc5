//! Edge detection on canvas screenshots.
//!
//! Both detectors return a binary image where white pixels (255) are
//! edges and black pixels (0) are background, ready for contour
//! tracing.
//!
//! The default [`EdgeDetectorKind::ForwardDifference`] is the most
//! sensitive detector possible: any channel change between a pixel and
//! its left or top neighbor is an edge. Every cell border, however
//! faint, becomes part of a contour. [`EdgeDetectorKind::Canny`] wraps
//! [`imageproc::edges::canny`] for noisy captures (scaled or
//! compressed screenshots) where exact color steps are unreliable.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::types::{AnalysisConfig, Screenshot};

/// Minimum allowed Canny threshold.
///
/// `imageproc` treats a zero low threshold as "every pixel with any
/// gradient is a candidate", which is what the forward-difference
/// detector already does without the smoothing pass.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

const EDGE: image::Luma<u8> = image::Luma([255]);

/// Selects which edge detector feeds grid estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgeDetectorKind {
    /// Zero-threshold forward difference on the color image.
    #[default]
    ForwardDifference,
    /// Canny on the luminance image, using the config's thresholds.
    ///
    /// Smoothing moves and merges the one-pixel borders that preview
    /// icons and cells are told apart by, so this is not expected to
    /// recover the exact cell size or every anchor on a clean capture.
    /// Use it only when forward differences drown in compression noise.
    Canny,
}

/// Trait for edge detection strategies.
///
/// Input: a screenshot in any channel order.
/// Output: a binary edge map of the same dimensions.
pub trait EdgeDetector {
    /// Detect edges in the screenshot.
    fn detect(&self, screenshot: &Screenshot, config: &AnalysisConfig) -> GrayImage;
}

impl EdgeDetector for EdgeDetectorKind {
    fn detect(&self, screenshot: &Screenshot, config: &AnalysisConfig) -> GrayImage {
        match *self {
            Self::ForwardDifference => forward_difference(screenshot),
            Self::Canny => canny(
                &crate::decode::to_luma(screenshot),
                config.canny_low,
                config.canny_high,
            ),
        }
    }
}

/// Mark every pixel whose color differs from its left or top neighbor.
///
/// Pixels in the first row and column are only compared against the
/// neighbor that exists. For a filled `w`-wide square the marked pixels
/// run from its left column to the first column past its right side,
/// so the traced border spans `w + 1` pixels.
#[must_use = "returns the binary edge map"]
pub fn forward_difference(screenshot: &Screenshot) -> GrayImage {
    let pixels = screenshot.pixels();
    let mut edges = GrayImage::new(pixels.width(), pixels.height());
    for (x, y, pixel) in pixels.enumerate_pixels() {
        let left_differs = x > 0 && pixels.get_pixel(x - 1, y) != pixel;
        let top_differs = y > 0 && pixels.get_pixel(x, y - 1) != pixel;
        if left_differs || top_differs {
            edges.put_pixel(x, y, EDGE);
        }
    }
    edges
}

/// Detect edges using the Canny algorithm.
///
/// Both thresholds are clamped to a minimum of [`MIN_THRESHOLD`] and
/// `low_threshold` is clamped to be at most `high_threshold`.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let high = high_threshold.max(MIN_THRESHOLD);
    let low = low_threshold.max(MIN_THRESHOLD).min(high);
    imageproc::edges::canny(image, low, high)
}

/// Count edge pixels (value == 255).
pub(crate) fn count_edge_pixels(edges: &GrayImage) -> u64 {
    edges
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] == 255)))
        .sum()
}
