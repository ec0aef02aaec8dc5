//! Palette location: find the clickable swatch of every known color.
//!
//! Each color is masked independently with a small per-channel
//! tolerance. The largest external blob above the noise threshold is
//! taken as the swatch and its area-weighted centroid, offset by the
//! palette region's origin, is the click position.

use std::collections::BTreeMap;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::contour::{self, ExternalContour};
use crate::types::{AnalysisConfig, AnalysisError, ColorRgb, Coordinate, ScreenRegion, Screenshot};

/// One entry of a palette document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteColor {
    /// Identifier assigned by the canvas service.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// The swatch color.
    pub rgb: ColorRgb,
    /// Whether the color must be purchased before use.
    #[serde(default)]
    pub premium: bool,
    /// Excluded from analysis when set.
    #[serde(default)]
    pub ignore: bool,
}

#[derive(Deserialize)]
struct PaletteDocument {
    color_palette: Vec<PaletteColor>,
}

/// Parse a palette document and drop entries marked `ignore`.
///
/// The document shape is
/// `{"color_palette": [{"id", "name", "rgb": [r, g, b], "premium", "ignore"}]}`.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidPalette`] if the JSON is malformed or
/// does not match that shape.
pub fn parse_palette_json(json: &str) -> Result<Vec<PaletteColor>, AnalysisError> {
    let document: PaletteDocument = serde_json::from_str(json)?;
    let total = document.color_palette.len();
    let colors: Vec<PaletteColor> = document
        .color_palette
        .into_iter()
        .filter(|c| !c.ignore)
        .collect();
    tracing::debug!(
        loaded = colors.len(),
        ignored = total - colors.len(),
        "parsed palette",
    );
    Ok(colors)
}

/// Absolute screen position of each located swatch.
///
/// Colors whose swatch was not found are absent.
pub type ColorLocation = BTreeMap<ColorRgb, Coordinate>;

/// Locate the swatch of every color in a palette screenshot.
///
/// `region` is where the screenshot was taken on screen; returned
/// coordinates are absolute. Duplicate colors are located once.
#[must_use]
pub fn locate_palette(
    screenshot: &Screenshot,
    region: &ScreenRegion,
    colors: &[ColorRgb],
    config: &AnalysisConfig,
) -> ColorLocation {
    let mut locations = ColorLocation::new();
    for &color in colors {
        if locations.contains_key(&color) {
            continue;
        }
        match locate_swatch(screenshot, color, config) {
            Some(local) => {
                locations.insert(color, region.to_screen(local));
            }
            None => tracing::debug!(%color, "palette color not found"),
        }
    }
    locations
}

/// Image-relative centroid of the swatch for `color`, if one exists.
#[must_use]
pub fn locate_swatch(
    screenshot: &Screenshot,
    color: ColorRgb,
    config: &AnalysisConfig,
) -> Option<Coordinate> {
    let mask = color_mask(screenshot, color, config.palette_tolerance);
    let swatch = largest_contour(contour::external_contours(&mask), config.min_swatch_area)?;
    let (cx, cy) = swatch.centroid()?;
    Some(Coordinate::new(round_px(cx), round_px(cy)))
}

/// Binary mask of pixels within `tolerance` of `color` on every channel
/// (bounds inclusive, clamped to `0..=255`).
///
/// The target is reordered to the screenshot's channel order; the
/// pixels are compared as stored.
#[must_use = "returns the mask"]
pub fn color_mask(screenshot: &Screenshot, color: ColorRgb, tolerance: u8) -> GrayImage {
    let target = color.to_native(screenshot.order());
    let lower = target.map(|c| c.saturating_sub(tolerance));
    let upper = target.map(|c| c.saturating_add(tolerance));
    let pixels = screenshot.pixels();
    GrayImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let sample = pixels.get_pixel(x, y).0;
        let inside = (0..3).all(|i| (lower[i]..=upper[i]).contains(&sample[i]));
        image::Luma([if inside { 255 } else { 0 }])
    })
}

/// Largest contour whose area exceeds `min_area`. Ties keep the first
/// contour in tracing order.
fn largest_contour(contours: Vec<ExternalContour>, min_area: f64) -> Option<ExternalContour> {
    contours
        .into_iter()
        .map(|c| (c.area(), c))
        .filter(|(area, _)| *area > min_area)
        .reduce(|best, next| if next.0 > best.0 { next } else { best })
        .map(|(_, c)| c)
}

#[allow(clippy::cast_possible_truncation)]
fn round_px(v: f64) -> i32 {
    // Centroids lie inside the image, far from the i32 range limits.
    v.round() as i32
}
