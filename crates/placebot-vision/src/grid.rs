//! Grid size estimation: infer the canvas cell size and one anchor per
//! cell from a screenshot.
//!
//! A zoomed-in canvas draws every cell as a bordered square, and cells
//! with pending work carry a small inset "preview" icon showing the
//! color the user intends to paint there. After edge detection both
//! show up as near-square borders:
//!
//! - preview icons are the smallest squares on screen, roughly a third
//!   of a cell wide;
//! - full cells are about three times the preview width;
//! - anything else (merged cell groups, UI chrome) is noise.
//!
//! The estimator takes the median of the smallest quartile of square
//! widths as the preview width, predicts the cell width from it, and
//! classifies every candidate against those two scales. Preview icons
//! become anchors; full cells vote on the cell size.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::contour::{self, BoundingBox};
use crate::edge::EdgeDetector;
use crate::types::{AnalysisConfig, AnalysisError, Coordinate, Screenshot};

/// Result of grid estimation, in image-relative coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Edge length of one grid cell in screen pixels. Always at least 1.
    pub cell_size: u32,
    /// One anchor per inferred cell (the preview icon's center), sorted
    /// and free of duplicates.
    pub anchors: Vec<Coordinate>,
}

/// How a square candidate was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxClass {
    /// Preview-icon scale; produces an anchor.
    Preview,
    /// Single-cell scale; votes on the cell size.
    Cell,
    /// Neither scale (or the estimate fell back); discarded.
    Noise,
}

/// A square candidate and its classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedBox {
    /// The candidate's bounding box.
    pub bounds: BoundingBox,
    /// Which band it fell into.
    pub class: BoxClass,
}

/// The intermediate numbers and per-candidate decisions behind a
/// [`GridGeometry`], for diagnostics and debug overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridClassification {
    /// Number of traced borders before filtering.
    pub contour_count: usize,
    /// `true` when too few candidates were found and the fallback cell
    /// size was returned. All candidates are then marked
    /// [`BoxClass::Noise`].
    pub fallback: bool,
    /// Median width of the smallest quartile of candidates.
    pub preview_median: Option<f64>,
    /// `preview_median * preview_to_cell_ratio`.
    pub expected_cell_size: Option<f64>,
    /// Every square candidate, in tracing order.
    pub boxes: Vec<ClassifiedBox>,
}

impl GridClassification {
    /// Number of candidates in the given class.
    #[must_use]
    pub fn count(&self, class: BoxClass) -> usize {
        self.boxes.iter().filter(|b| b.class == class).count()
    }
}

/// Estimate the grid cell size and cell anchors of a canvas screenshot.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidConfig`] if `config` fails
/// validation. Too few candidates is not an error: the fallback cell
/// size is returned with no anchors.
pub fn estimate_grid(
    screenshot: &Screenshot,
    config: &AnalysisConfig,
) -> Result<GridGeometry, AnalysisError> {
    estimate_grid_with_classification(screenshot, config).map(|(geometry, _)| geometry)
}

/// Like [`estimate_grid`] but also returns the classification of every
/// candidate.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidConfig`] if `config` fails
/// validation.
pub fn estimate_grid_with_classification(
    screenshot: &Screenshot,
    config: &AnalysisConfig,
) -> Result<(GridGeometry, GridClassification), AnalysisError> {
    config.validate()?;
    let edges = config.edge_detector.detect(screenshot, config);
    Ok(estimate_from_edges(&edges, config))
}

/// Run the estimator on an existing binary edge map.
///
/// `config` is assumed valid.
#[must_use]
pub fn estimate_from_edges(
    edges: &GrayImage,
    config: &AnalysisConfig,
) -> (GridGeometry, GridClassification) {
    let boxes = contour::bounding_boxes(edges);
    let contour_count = boxes.len();
    let candidates: Vec<BoundingBox> = boxes
        .into_iter()
        .filter(|b| is_candidate(b, config))
        .collect();

    let mut widths: Vec<f64> = candidates.iter().map(|b| f64::from(b.width)).collect();
    widths.sort_by(f64::total_cmp);
    // Smallest quartile, at least one width; empty when there are no
    // candidates at all.
    let quartile = (widths.len() / 4).max(1).min(widths.len());

    let preview_median = match median(&widths[..quartile]) {
        Some(m) if candidates.len() >= config.min_candidates => m,
        _ => {
            tracing::warn!(
                candidates = candidates.len(),
                required = config.min_candidates,
                fallback = config.fallback_cell_size,
                "too few square contours to estimate the grid; using fallback cell size",
            );
            return fallback(contour_count, candidates, config);
        }
    };
    let expected_cell_size = preview_median * config.preview_to_cell_ratio;
    let preview_max = preview_median * config.preview_band_factor;
    let cell_min = expected_cell_size * (1.0 - config.cell_size_band);
    let cell_max = expected_cell_size * (1.0 + config.cell_size_band);

    let classify = |b: &BoundingBox| {
        let w = f64::from(b.width);
        if w <= preview_max {
            BoxClass::Preview
        } else if (cell_min..=cell_max).contains(&w) {
            BoxClass::Cell
        } else {
            BoxClass::Noise
        }
    };
    let classified: Vec<ClassifiedBox> = candidates
        .into_iter()
        .map(|bounds| ClassifiedBox {
            bounds,
            class: classify(&bounds),
        })
        .collect();

    let mut cell_widths: Vec<f64> = classified
        .iter()
        .filter(|b| b.class == BoxClass::Cell)
        .map(|b| f64::from(b.bounds.width))
        .collect();
    cell_widths.sort_by(f64::total_cmp);
    let cell_size = median(&cell_widths).map_or_else(
        || round_size(expected_cell_size),
        round_size,
    );

    let mut anchors: Vec<Coordinate> = classified
        .iter()
        .filter(|b| b.class == BoxClass::Preview)
        .map(|b| b.bounds.center())
        .collect();
    anchors.sort_unstable();
    anchors.dedup();

    let classification = GridClassification {
        contour_count,
        fallback: false,
        preview_median: Some(preview_median),
        expected_cell_size: Some(expected_cell_size),
        boxes: classified,
    };
    tracing::debug!(
        cell_size,
        anchors = anchors.len(),
        preview = classification.count(BoxClass::Preview),
        cells = classification.count(BoxClass::Cell),
        noise = classification.count(BoxClass::Noise),
        preview_median,
        "estimated grid",
    );
    (GridGeometry { cell_size, anchors }, classification)
}

/// Fallback result: the configured cell size, no anchors, and every
/// candidate marked as noise.
fn fallback(
    contour_count: usize,
    candidates: Vec<BoundingBox>,
    config: &AnalysisConfig,
) -> (GridGeometry, GridClassification) {
    let classification = GridClassification {
        contour_count,
        fallback: true,
        preview_median: None,
        expected_cell_size: None,
        boxes: candidates
            .into_iter()
            .map(|bounds| ClassifiedBox {
                bounds,
                class: BoxClass::Noise,
            })
            .collect(),
    };
    let geometry = GridGeometry {
        cell_size: config.fallback_cell_size,
        anchors: Vec::new(),
    };
    (geometry, classification)
}

/// Near-square and within the plausible size range (both inclusive).
fn is_candidate(b: &BoundingBox, config: &AnalysisConfig) -> bool {
    let size_range = config.min_cell_size..=config.max_cell_size;
    let ratio = b.aspect_ratio();
    ratio >= config.min_aspect_ratio
        && ratio <= config.max_aspect_ratio
        && size_range.contains(&b.width)
        && size_range.contains(&b.height)
}

/// Median of an ascending slice; the mean of the two middle values for
/// even lengths. `None` for an empty slice.
#[must_use]
pub fn median(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(f64::midpoint(sorted[mid - 1], sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_size(size: f64) -> u32 {
    // Widths come from u32 extents, so the rounded value fits.
    (size.round() as u32).max(1)
}
