//! Analysis diagnostics: timing, counts, and classification data for
//! each stage.
//!
//! These diagnostics are permanent instrumentation for tuning the
//! heuristics against real screenshots. Every call to
//! [`analyze_with_diagnostics`](crate::analyze_with_diagnostics)
//! collects them alongside the analysis.
//!
//! The core never reads a time source itself. Callers pass a [`Clock`];
//! the bench CLI uses `std::time::Instant`, tests can pass a fake.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::AnalysisSummary;
use crate::edge::EdgeDetectorKind;
use crate::grid::GridClassification;
use crate::types::Dimensions;

/// Source of wall-clock timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp.
    type Instant;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDiagnostics {
    /// Canvas screenshot size.
    pub canvas: Dimensions,
    /// Edge detection on the canvas screenshot.
    pub edge_detection: StageDiagnostics,
    /// Contour tracing, filtering, and classification.
    pub grid_estimation: StageDiagnostics,
    /// Sampling of intended and actual colors.
    pub pixel_map: StageDiagnostics,
    /// Swatch location in the palette screenshot.
    pub palette: StageDiagnostics,
    /// Total wall-clock duration of the analysis (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Every grid candidate and how it was classified.
    pub classification: GridClassification,
    /// The numbers reported back to the user.
    pub summary: AnalysisSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Edge detection metrics.
    EdgeDetection {
        /// Detector used.
        detector: EdgeDetectorKind,
        /// Number of edge pixels (value == 255) in the output.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
    /// Grid estimation metrics.
    GridEstimation {
        /// Borders traced before filtering.
        contour_count: usize,
        /// Near-square borders within the size range.
        candidate_count: usize,
        /// Candidates classified as preview icons.
        preview_count: usize,
        /// Candidates classified as single cells.
        cell_count: usize,
        /// Candidates discarded as noise.
        noise_count: usize,
        /// Estimated cell size.
        cell_size: u32,
        /// Whether the fallback cell size was used.
        fallback: bool,
    },
    /// Pixel map metrics.
    PixelMap {
        /// Anchors handed to the sampler.
        anchor_count: usize,
        /// Cells in the resulting map.
        sampled: usize,
        /// Anchors dropped because a sample fell outside the image.
        dropped: usize,
    },
    /// Palette location metrics.
    Palette {
        /// Distinct colors searched for.
        requested: usize,
        /// Colors whose swatch was found.
        located: usize,
    },
}

impl AnalysisDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Analysis Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Canvas: {}x{}",
            self.canvas.width, self.canvas.height
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Edge Detection", &self.edge_detection),
            ("Grid Estimation", &self.grid_estimation),
            ("Pixel Map", &self.pixel_map),
            ("Palette", &self.palette),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        match (
            self.classification.preview_median,
            self.classification.expected_cell_size,
        ) {
            (Some(preview), Some(expected)) => lines.push(format!(
                "Preview median: {preview:.1}px  |  Expected cell: {expected:.1}px",
            )),
            _ => lines.push("Grid estimate fell back to the default cell size".to_string()),
        }
        lines.push(format!(
            "Cell size: {}  |  Pixels: {}  |  Colors found: {}",
            self.summary.cell_size, self.summary.pixel_count, self.summary.colors_found,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::EdgeDetection {
            detector,
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!("{detector:?} edges={edge_pixel_count} ({density:.1}%)")
        }
        StageMetrics::GridEstimation {
            contour_count,
            candidate_count,
            preview_count,
            cell_count,
            noise_count,
            cell_size,
            fallback,
        } => {
            let suffix = if *fallback { " (fallback)" } else { "" };
            format!(
                "{contour_count} contours, {candidate_count} candidates (preview={preview_count} cell={cell_count} noise={noise_count}) -> {cell_size}px{suffix}",
            )
        }
        StageMetrics::PixelMap {
            anchor_count,
            sampled,
            dropped,
        } => format!("{anchor_count} anchors, {sampled} sampled, {dropped} dropped"),
        StageMetrics::Palette { requested, located } => {
            format!("{located}/{requested} swatches located")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::BoxClass;

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        let ms = duration_ms(d);
        assert!((ms - 1234.0).abs() < 0.01);
    }

    fn stage(ms: u64, metrics: StageMetrics) -> StageDiagnostics {
        StageDiagnostics {
            duration: Duration::from_millis(ms),
            metrics,
        }
    }

    fn sample(fallback: bool) -> AnalysisDiagnostics {
        AnalysisDiagnostics {
            canvas: Dimensions {
                width: 100,
                height: 100,
            },
            edge_detection: stage(
                3,
                StageMetrics::EdgeDetection {
                    detector: EdgeDetectorKind::ForwardDifference,
                    edge_pixel_count: 500,
                    total_pixel_count: 10_000,
                },
            ),
            grid_estimation: stage(
                5,
                StageMetrics::GridEstimation {
                    contour_count: 17,
                    candidate_count: 13,
                    preview_count: 8,
                    cell_count: 4,
                    noise_count: 1,
                    cell_size: 20,
                    fallback,
                },
            ),
            pixel_map: stage(
                1,
                StageMetrics::PixelMap {
                    anchor_count: 4,
                    sampled: 4,
                    dropped: 0,
                },
            ),
            palette: stage(
                2,
                StageMetrics::Palette {
                    requested: 3,
                    located: 2,
                },
            ),
            total_duration: Duration::from_millis(11),
            classification: GridClassification {
                contour_count: 17,
                fallback,
                preview_median: (!fallback).then_some(6.0),
                expected_cell_size: (!fallback).then_some(18.0),
                boxes: Vec::new(),
            },
            summary: AnalysisSummary {
                cell_size: 20,
                pixel_count: 4,
                colors_found: 2,
            },
        }
    }

    #[test]
    fn report_lists_every_stage() {
        let report = sample(false).report();
        assert!(report.contains("Analysis Diagnostics Report"));
        assert!(report.contains("Edge Detection"));
        assert!(report.contains("Grid Estimation"));
        assert!(report.contains("Pixel Map"));
        assert!(report.contains("2/3 swatches located"));
        assert!(report.contains("Preview median: 6.0px"));
        assert!(report.contains("Cell size: 20"));
    }

    #[test]
    fn report_mentions_fallback() {
        let report = sample(true).report();
        assert!(report.contains("(fallback)"));
        assert!(report.contains("fell back"));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let json = serde_json::to_value(sample(false)).unwrap_or_default();
        let total = json["total_duration"].as_f64().unwrap_or_default();
        assert!((total - 0.011).abs() < 1e-9);
        assert_eq!(json["summary"]["cell_size"], 20);
    }

    #[test]
    fn classification_counts_by_class() {
        let mut diag = sample(false);
        diag.classification.boxes = vec![
            crate::grid::ClassifiedBox {
                bounds: crate::contour::BoundingBox::new(0, 0, 6, 6),
                class: BoxClass::Preview,
            },
            crate::grid::ClassifiedBox {
                bounds: crate::contour::BoundingBox::new(0, 0, 20, 20),
                class: BoxClass::Cell,
            },
        ];
        assert_eq!(diag.classification.count(BoxClass::Preview), 1);
        assert_eq!(diag.classification.count(BoxClass::Noise), 0);
    }
}
