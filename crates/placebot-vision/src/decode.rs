//! Image decoding and grayscale conversion.
//!
//! Saved screenshots (PNG, JPEG, BMP, WebP) are decoded into a
//! [`Screenshot`] in RGB order. Live captures skip this module and build
//! a [`Screenshot`] from their own buffer and channel order.
//!
//! [`to_luma`] produces the single-channel image the Canny edge
//! detector needs, weighting channels according to the screenshot's
//! native order rather than reordering the pixels first.

use image::GrayImage;

use crate::types::{AnalysisError, ChannelOrder, Screenshot};

/// Decode raw image bytes into an RGB-ordered screenshot.
///
/// Alpha, if present, is discarded.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] if `bytes` is empty.
/// Returns [`AnalysisError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
/// Returns [`AnalysisError::EmptyImage`] if the decoded image has no
/// pixels.
pub fn decode(bytes: &[u8]) -> Result<Screenshot, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Screenshot::new(img.to_rgb8(), ChannelOrder::Rgb)
}

/// Convert a screenshot to grayscale with the standard luminance
/// formula `0.299*R + 0.587*G + 0.114*B`, applied in native order.
#[must_use = "returns the grayscale image"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_luma(screenshot: &Screenshot) -> GrayImage {
    let [w0, w1, w2] = screenshot.order().luma_weights();
    let pixels = screenshot.pixels();
    GrayImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let [c0, c1, c2] = pixels.get_pixel(x, y).0;
        let luma = w2.mul_add(
            f32::from(c2),
            w0.mul_add(f32::from(c0), w1 * f32::from(c1)),
        );
        image::Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}
