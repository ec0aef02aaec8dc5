//! placebot-vision: visual inference of a pixel canvas from screenshots
//! (sans-IO).
//!
//! Given a screenshot of a zoomed-in canvas and one of its color
//! palette, the crate infers:
//!
//! edge detection -> contour boxes -> grid size and anchors ->
//! per-cell intended/actual colors -> paint targets for a color,
//!
//! and, independently, the on-screen position of every palette swatch.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! screenshots and returns plain values. Screen capture, threading, and
//! file output live in `placebot-worker` and `placebot-bench`.

pub mod contour;
pub mod decode;
pub mod diagnostics;
pub mod edge;
pub mod grid;
pub mod palette;
pub mod pixel_map;
pub mod target;
pub mod types;

// Lets the shared fixtures name this crate the way integration tests do.
#[cfg(test)]
extern crate self as placebot_vision;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod test_fixtures;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use diagnostics::{AnalysisDiagnostics, Clock, StageDiagnostics, StageMetrics};
pub use edge::{EdgeDetector, EdgeDetectorKind};
pub use grid::{BoxClass, ClassifiedBox, GridClassification, GridGeometry};
pub use palette::{ColorLocation, PaletteColor};
pub use pixel_map::{PixelCellState, PixelMap};
pub use target::{Tolerance, resolve_paint_targets};
pub use types::{
    AnalysisConfig, AnalysisError, ChannelOrder, ColorRgb, Coordinate, Dimensions, RgbImage,
    ScreenRegion, Screenshot,
};

/// Result of one full analysis.
///
/// Everything here is computed fresh per run and never mutated; a new
/// analysis replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Cell size and anchors, relative to the canvas screenshot.
    pub geometry: GridGeometry,
    /// Intended and actual color per anchor.
    pub pixel_map: PixelMap,
    /// Absolute screen position of each located palette swatch.
    pub color_locations: ColorLocation,
}

impl Analysis {
    /// Anchors (relative to the canvas screenshot) that still need
    /// `color`.
    #[must_use]
    pub fn paint_targets(&self, color: ColorRgb, tolerance: impl Into<Tolerance>) -> Vec<Coordinate> {
        resolve_paint_targets(&self.pixel_map, color, tolerance)
    }

    /// Absolute screen position of the swatch for `color`.
    #[must_use]
    pub fn swatch(&self, color: ColorRgb) -> Option<Coordinate> {
        self.color_locations.get(&color).copied()
    }

    /// Headline numbers for status displays.
    #[must_use]
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            cell_size: self.geometry.cell_size,
            pixel_count: self.pixel_map.len(),
            colors_found: self.color_locations.len(),
        }
    }
}

/// Headline numbers of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Estimated cell size in screen pixels.
    pub cell_size: u32,
    /// Number of cells in the pixel map.
    pub pixel_count: usize,
    /// Number of palette swatches located.
    pub colors_found: usize,
}

/// Run the full analysis.
///
/// `palette_region` is where `palette` was captured on screen; swatch
/// positions are returned in absolute screen coordinates. Grid anchors
/// stay relative to `canvas`.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidConfig`] if `config` fails
/// validation. Missing swatches, a grid fallback, and anchors sampled
/// out of bounds are not errors.
pub fn analyze(
    canvas: &Screenshot,
    palette: &Screenshot,
    palette_region: &ScreenRegion,
    colors: &[ColorRgb],
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    config.validate()?;
    let geometry = grid::estimate_grid(canvas, config)?;
    let pixel_map = pixel_map::build_pixel_map(canvas, &geometry, config);
    let color_locations = palette::locate_palette(palette, palette_region, colors, config);
    Ok(Analysis {
        geometry,
        pixel_map,
        color_locations,
    })
}

/// Run the full analysis, collecting per-stage diagnostics.
///
/// Identical results to [`analyze`]; stage timings come from `clock`.
///
/// # Errors
///
/// Same as [`analyze`].
pub fn analyze_with_diagnostics<C: Clock>(
    canvas: &Screenshot,
    palette: &Screenshot,
    palette_region: &ScreenRegion,
    colors: &[ColorRgb],
    config: &AnalysisConfig,
    clock: &C,
) -> Result<(Analysis, AnalysisDiagnostics), AnalysisError> {
    config.validate()?;
    let total_start = clock.now();
    let dimensions = canvas.dimensions();

    let start = clock.now();
    let edges = config.edge_detector.detect(canvas, config);
    let edge_detection = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::EdgeDetection {
            detector: config.edge_detector,
            edge_pixel_count: edge::count_edge_pixels(&edges),
            total_pixel_count: u64::from(dimensions.width) * u64::from(dimensions.height),
        },
    };

    let start = clock.now();
    let (geometry, classification) = grid::estimate_from_edges(&edges, config);
    let grid_estimation = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::GridEstimation {
            contour_count: classification.contour_count,
            candidate_count: classification.boxes.len(),
            preview_count: classification.count(BoxClass::Preview),
            cell_count: classification.count(BoxClass::Cell),
            noise_count: classification.count(BoxClass::Noise),
            cell_size: geometry.cell_size,
            fallback: classification.fallback,
        },
    };

    let start = clock.now();
    let pixel_map = pixel_map::build_pixel_map(canvas, &geometry, config);
    let pixel_map_stage = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::PixelMap {
            anchor_count: geometry.anchors.len(),
            sampled: pixel_map.len(),
            dropped: geometry.anchors.len().saturating_sub(pixel_map.len()),
        },
    };

    let start = clock.now();
    let color_locations = palette::locate_palette(palette, palette_region, colors, config);
    let palette_stage = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Palette {
            requested: colors.iter().collect::<BTreeSet<_>>().len(),
            located: color_locations.len(),
        },
    };

    let analysis = Analysis {
        geometry,
        pixel_map,
        color_locations,
    };
    let diagnostics = AnalysisDiagnostics {
        canvas: dimensions,
        edge_detection,
        grid_estimation,
        pixel_map: pixel_map_stage,
        palette: palette_stage,
        total_duration: clock.elapsed(&total_start),
        classification,
        summary: analysis.summary(),
    };
    Ok((analysis, diagnostics))
}
