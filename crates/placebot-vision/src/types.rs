//! Shared types for the placebot screenshot analysis core.

use serde::{Deserialize, Serialize};

use crate::edge::EdgeDetectorKind;

/// Re-export `RgbImage` so downstream crates can hand screenshots to
/// the core without depending on `image` directly.
pub use image::RgbImage;

/// An integer pixel position.
///
/// Used both for image-relative positions (anchors inside a screenshot)
/// and for absolute screen positions (swatch locations, click targets).
/// Signed because screen coordinates on multi-monitor setups can be
/// negative and because sampling offsets may step outside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Horizontal position (pixels from left edge).
    pub x: i32,
    /// Vertical position (pixels from top edge).
    pub y: i32,
}

impl Coordinate {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by `(dx, dy)`, saturating at the `i32` bounds.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// A rectangle on screen, in screen pixels.
///
/// Region selections are owned by the caller; the core only uses them
/// to translate image-relative positions into screen positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRegion {
    /// Left edge in screen pixels.
    pub x: i32,
    /// Top edge in screen pixels.
    pub y: i32,
    /// Width in pixels (always > 0 when built through [`Self::new`]).
    pub width: u32,
    /// Height in pixels (always > 0 when built through [`Self::new`]).
    pub height: u32,
}

impl ScreenRegion {
    /// Create a region, rejecting zero width or height.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidRegion`] if `width` or `height`
    /// is zero.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Result<Self, AnalysisError> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidRegion { width, height });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Top-left corner of the region.
    #[must_use]
    pub const fn origin(&self) -> Coordinate {
        Coordinate::new(self.x, self.y)
    }

    /// Convert an image-relative position inside this region to an
    /// absolute screen position.
    #[must_use]
    pub const fn to_screen(&self, local: Coordinate) -> Coordinate {
        local.offset(self.x, self.y)
    }
}

/// Channel order of the three color channels in a screenshot buffer.
///
/// Capture backends differ (GDI and DXGI hand out BGR(A), most
/// cross-platform grabbers hand out RGB(A)). The image data is never
/// reordered; small target colors are reordered to match it instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelOrder {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
}

impl ChannelOrder {
    /// Reorder a native-order sample into RGB.
    #[must_use]
    pub const fn to_rgb(self, native: [u8; 3]) -> ColorRgb {
        match self {
            Self::Rgb => ColorRgb::new(native[0], native[1], native[2]),
            Self::Bgr => ColorRgb::new(native[2], native[1], native[0]),
        }
    }

    /// Luminance weights `(w0, w1, w2)` for the channels as stored.
    pub(crate) const fn luma_weights(self) -> [f32; 3] {
        match self {
            Self::Rgb => [0.299, 0.587, 0.114],
            Self::Bgr => [0.114, 0.587, 0.299],
        }
    }
}

/// An 8-bit RGB color.
///
/// Serialized as a `[r, g, b]` array, the shape used by palette
/// documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct ColorRgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl ColorRgb {
    /// Create a new color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Reorder into the given native channel order.
    #[must_use]
    pub const fn to_native(self, order: ChannelOrder) -> [u8; 3] {
        match order {
            ChannelOrder::Rgb => [self.r, self.g, self.b],
            ChannelOrder::Bgr => [self.b, self.g, self.r],
        }
    }
}

impl From<[u8; 3]> for ColorRgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<ColorRgb> for [u8; 3] {
    fn from(color: ColorRgb) -> Self {
        [color.r, color.g, color.b]
    }
}

impl std::fmt::Display for ColorRgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A captured screen region: a non-empty three-channel pixel buffer
/// plus the channel order it was captured in.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pixels: RgbImage,
    order: ChannelOrder,
}

impl Screenshot {
    /// Wrap a captured buffer.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::EmptyImage`] if the buffer has zero
    /// width or height.
    pub fn new(pixels: RgbImage, order: ChannelOrder) -> Result<Self, AnalysisError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(AnalysisError::EmptyImage {
                width: pixels.width(),
                height: pixels.height(),
            });
        }
        Ok(Self { pixels, order })
    }

    /// The raw pixel buffer, channels in [`Self::order`].
    #[must_use]
    pub const fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Channel order of [`Self::pixels`].
    #[must_use]
    pub const fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Image dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.pixels.width(),
            height: self.pixels.height(),
        }
    }

    /// The native-order sample at `at`, or `None` when `at` lies outside
    /// the image.
    #[must_use]
    pub fn sample(&self, at: Coordinate) -> Option<[u8; 3]> {
        let x = u32::try_from(at.x).ok()?;
        let y = u32::try_from(at.y).ok()?;
        if x >= self.pixels.width() || y >= self.pixels.height() {
            return None;
        }
        Some(self.pixels.get_pixel(x, y).0)
    }

    /// Consume the screenshot and return its buffer.
    #[must_use]
    pub fn into_pixels(self) -> RgbImage {
        self.pixels
    }
}

/// Configuration for screenshot analysis.
///
/// Every empirical constant used by the heuristics is a field here so
/// tests and tuning tools can probe boundary behavior. Defaults are
/// exposed as `DEFAULT_*` associated constants.
///
/// Call [`validate`](Self::validate) before use; [`crate::analyze`] and
/// [`crate::grid::estimate_grid`] do so themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Which edge detector feeds contour extraction.
    pub edge_detector: EdgeDetectorKind,

    /// Canny low threshold (only used by [`EdgeDetectorKind::Canny`]).
    pub canny_low: f32,

    /// Canny high threshold (only used by [`EdgeDetectorKind::Canny`]).
    pub canny_high: f32,

    /// Smallest plausible box edge, in pixels (inclusive).
    pub min_cell_size: u32,

    /// Largest plausible box edge, in pixels (inclusive).
    pub max_cell_size: u32,

    /// Lower bound of the width/height ratio for a box to count as square.
    pub min_aspect_ratio: f64,

    /// Upper bound of the width/height ratio for a box to count as square.
    pub max_aspect_ratio: f64,

    /// Minimum number of square candidates before the grid estimate is
    /// trusted. Below this the fallback cell size is returned.
    pub min_candidates: usize,

    /// Cell size reported when too few candidates are found.
    pub fallback_cell_size: u32,

    /// Ratio between a full cell and the inset preview icon.
    pub preview_to_cell_ratio: f64,

    /// Relative half-width of the band around the expected cell size.
    pub cell_size_band: f64,

    /// Boxes up to `preview_band_factor * preview_median` wide are
    /// preview icons.
    pub preview_band_factor: f64,

    /// Inset from the cell's top-left corner for the actual-color sample.
    pub sample_inset: i32,

    /// Per-channel tolerance of the palette swatch mask.
    pub palette_tolerance: u8,

    /// Swatch contours must enclose more than this area (px²).
    pub min_swatch_area: f64,
}

impl AnalysisConfig {
    /// Default Canny low threshold.
    pub const DEFAULT_CANNY_LOW: f32 = crate::edge::MIN_THRESHOLD;
    /// Default Canny high threshold.
    pub const DEFAULT_CANNY_HIGH: f32 = crate::edge::MIN_THRESHOLD;
    /// Default minimum box edge.
    pub const DEFAULT_MIN_CELL_SIZE: u32 = 5;
    /// Default maximum box edge.
    pub const DEFAULT_MAX_CELL_SIZE: u32 = 50;
    /// Default lower aspect bound.
    pub const DEFAULT_MIN_ASPECT_RATIO: f64 = 0.8;
    /// Default upper aspect bound.
    pub const DEFAULT_MAX_ASPECT_RATIO: f64 = 1.2;
    /// Default minimum candidate count.
    pub const DEFAULT_MIN_CANDIDATES: usize = 10;
    /// Default fallback cell size.
    pub const DEFAULT_FALLBACK_CELL_SIZE: u32 = 22;
    /// Default preview-to-cell ratio.
    pub const DEFAULT_PREVIEW_TO_CELL_RATIO: f64 = 3.0;
    /// Default cell size band (±20%).
    pub const DEFAULT_CELL_SIZE_BAND: f64 = 0.2;
    /// Default preview band factor.
    pub const DEFAULT_PREVIEW_BAND_FACTOR: f64 = 1.5;
    /// Default actual-color sample inset.
    pub const DEFAULT_SAMPLE_INSET: i32 = 2;
    /// Default swatch mask tolerance.
    pub const DEFAULT_PALETTE_TOLERANCE: u8 = 3;
    /// Default swatch noise threshold.
    pub const DEFAULT_MIN_SWATCH_AREA: f64 = 100.0;

    /// Check the invariants the heuristics rely on.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] naming the first
    /// violated invariant.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |msg: String| Err(AnalysisError::InvalidConfig(msg));

        if self.min_cell_size == 0 {
            return invalid("min_cell_size must be at least 1".to_string());
        }
        if self.min_cell_size > self.max_cell_size {
            return invalid(format!(
                "min_cell_size ({}) exceeds max_cell_size ({})",
                self.min_cell_size, self.max_cell_size,
            ));
        }
        if !(self.min_aspect_ratio.is_finite() && self.min_aspect_ratio > 0.0) {
            return invalid("min_aspect_ratio must be finite and positive".to_string());
        }
        if !(self.max_aspect_ratio.is_finite() && self.max_aspect_ratio >= self.min_aspect_ratio) {
            return invalid("max_aspect_ratio must be finite and >= min_aspect_ratio".to_string());
        }
        if self.min_candidates == 0 {
            return invalid("min_candidates must be at least 1".to_string());
        }
        if self.fallback_cell_size == 0 {
            return invalid("fallback_cell_size must be at least 1".to_string());
        }
        for (name, value) in [
            ("preview_to_cell_ratio", self.preview_to_cell_ratio),
            ("cell_size_band", self.cell_size_band),
            ("preview_band_factor", self.preview_band_factor),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return invalid(format!("{name} must be finite and positive, got {value}"));
            }
        }
        if !(self.min_swatch_area.is_finite() && self.min_swatch_area >= 0.0) {
            return invalid("min_swatch_area must be finite and non-negative".to_string());
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            edge_detector: EdgeDetectorKind::default(),
            canny_low: Self::DEFAULT_CANNY_LOW,
            canny_high: Self::DEFAULT_CANNY_HIGH,
            min_cell_size: Self::DEFAULT_MIN_CELL_SIZE,
            max_cell_size: Self::DEFAULT_MAX_CELL_SIZE,
            min_aspect_ratio: Self::DEFAULT_MIN_ASPECT_RATIO,
            max_aspect_ratio: Self::DEFAULT_MAX_ASPECT_RATIO,
            min_candidates: Self::DEFAULT_MIN_CANDIDATES,
            fallback_cell_size: Self::DEFAULT_FALLBACK_CELL_SIZE,
            preview_to_cell_ratio: Self::DEFAULT_PREVIEW_TO_CELL_RATIO,
            cell_size_band: Self::DEFAULT_CELL_SIZE_BAND,
            preview_band_factor: Self::DEFAULT_PREVIEW_BAND_FACTOR,
            sample_inset: Self::DEFAULT_SAMPLE_INSET,
            palette_tolerance: Self::DEFAULT_PALETTE_TOLERANCE,
            min_swatch_area: Self::DEFAULT_MIN_SWATCH_AREA,
        }
    }
}

/// Errors that can occur during screenshot analysis.
///
/// Recoverable conditions (too few grid candidates, a palette color
/// that is not on screen, an anchor whose sample falls outside the
/// image) are not errors; they shape the returned data instead.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// A captured image had no pixels.
    #[error("captured image is empty ({width}x{height})")]
    EmptyImage {
        /// Width of the rejected image.
        width: u32,
        /// Height of the rejected image.
        height: u32,
    },

    /// A screen region had zero width or height.
    #[error("screen region must be non-empty, got {width}x{height}")]
    InvalidRegion {
        /// Width of the rejected region.
        width: u32,
        /// Height of the rejected region.
        height: u32,
    },

    /// Analysis configuration is invalid.
    #[error("invalid analysis configuration: {0}")]
    InvalidConfig(String),

    /// A palette document could not be parsed.
    #[error("invalid palette document: {0}")]
    InvalidPalette(#[from] serde_json::Error),

    /// The screenshot source failed to produce an image.
    #[error("screen capture failed: {0}")]
    Capture(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Coordinate / ScreenRegion ---

    #[test]
    fn coordinate_offset_saturates() {
        let c = Coordinate::new(i32::MAX - 1, 0).offset(5, -3);
        assert_eq!(c, Coordinate::new(i32::MAX, -3));
    }

    #[test]
    fn region_rejects_zero_size() {
        assert!(matches!(
            ScreenRegion::new(0, 0, 0, 10),
            Err(AnalysisError::InvalidRegion {
                width: 0,
                height: 10
            })
        ));
        assert!(ScreenRegion::new(0, 0, 10, 0).is_err());
    }

    #[test]
    fn region_to_screen_adds_origin() {
        let region = ScreenRegion::new(1000, 500, 200, 200).unwrap();
        assert_eq!(
            region.to_screen(Coordinate::new(65, 65)),
            Coordinate::new(1065, 565)
        );
        assert_eq!(region.origin(), Coordinate::new(1000, 500));
    }

    // --- Channel order ---

    #[test]
    fn bgr_reorders_target_not_image() {
        let red = ColorRgb::new(255, 0, 24);
        assert_eq!(red.to_native(ChannelOrder::Rgb), [255, 0, 24]);
        assert_eq!(red.to_native(ChannelOrder::Bgr), [24, 0, 255]);
        assert_eq!(ChannelOrder::Bgr.to_rgb([24, 0, 255]), red);
    }

    #[test]
    fn color_serializes_as_array() {
        let json = serde_json::to_string(&ColorRgb::new(1, 2, 3)).unwrap();
        assert_eq!(json, "[1,2,3]");
        let back: ColorRgb = serde_json::from_str("[4,5,6]").unwrap();
        assert_eq!(back, ColorRgb::new(4, 5, 6));
    }

    // --- Screenshot ---

    #[test]
    fn screenshot_rejects_empty_buffer() {
        let result = Screenshot::new(RgbImage::new(0, 5), ChannelOrder::Rgb);
        assert!(matches!(
            result,
            Err(AnalysisError::EmptyImage {
                width: 0,
                height: 5
            })
        ));
    }

    #[test]
    fn screenshot_sample_is_bounds_checked() {
        let shot = Screenshot::new(
            RgbImage::from_pixel(4, 3, image::Rgb([9, 8, 7])),
            ChannelOrder::Rgb,
        )
        .unwrap();
        assert_eq!(shot.sample(Coordinate::new(3, 2)), Some([9, 8, 7]));
        assert_eq!(shot.sample(Coordinate::new(4, 0)), None);
        assert_eq!(shot.sample(Coordinate::new(0, 3)), None);
        assert_eq!(shot.sample(Coordinate::new(-1, 0)), None);
    }

    // --- AnalysisConfig ---

    #[test]
    fn config_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.edge_detector, EdgeDetectorKind::ForwardDifference);
        assert_eq!(config.min_cell_size, 5);
        assert_eq!(config.max_cell_size, 50);
        assert_eq!(config.min_candidates, 10);
        assert_eq!(config.fallback_cell_size, 22);
        assert!((config.preview_to_cell_ratio - 3.0).abs() < f64::EPSILON);
        assert!((config.cell_size_band - 0.2).abs() < f64::EPSILON);
        assert!((config.preview_band_factor - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.sample_inset, 2);
        assert_eq!(config.palette_tolerance, 3);
        assert!((config.min_swatch_area - 100.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_inverted_size_range() {
        let config = AnalysisConfig {
            min_cell_size: 40,
            max_cell_size: 10,
            ..AnalysisConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid analysis configuration: min_cell_size (40) exceeds max_cell_size (10)",
        );
    }

    #[test]
    fn config_rejects_non_positive_ratio() {
        let config = AnalysisConfig {
            preview_to_cell_ratio: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_partial_json_fills_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"fallback_cell_size": 30}"#).unwrap();
        assert_eq!(config.fallback_cell_size, 30);
        assert_eq!(config.max_cell_size, AnalysisConfig::DEFAULT_MAX_CELL_SIZE);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            AnalysisError::EmptyInput.to_string(),
            "input image data is empty"
        );
        assert_eq!(
            AnalysisError::EmptyImage {
                width: 0,
                height: 0
            }
            .to_string(),
            "captured image is empty (0x0)",
        );
    }
}
