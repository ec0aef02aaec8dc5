//! Analysis session state: the latest successful analysis, and the
//! paint work derived from it.

use std::sync::Arc;

use placebot_vision::{Analysis, ColorRgb, Coordinate, ScreenRegion, Tolerance};

use crate::worker::WorkerMessage;

/// Errors from the orchestration layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No analysis has succeeded yet, or the last one failed.
    #[error("canvas has not been analyzed")]
    NotAnalyzed,

    /// The target color's swatch was not found in the palette.
    #[error("no palette swatch found for color {0}")]
    SwatchNotFound(ColorRgb),

    /// The background worker thread has exited.
    #[error("analysis worker is not running")]
    WorkerStopped,
}

/// What to click for one color: the swatch, then every target.
///
/// All coordinates are absolute screen positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintPlan {
    /// The palette swatch to select first.
    pub swatch: Coordinate,
    /// Cells to click, in pixel map order.
    pub targets: Vec<Coordinate>,
}

/// The most recent analysis and where its canvas was on screen.
///
/// A successful message replaces the whole analysis; nothing from an
/// older run survives. A failed run clears it, so no paint work is
/// produced from a stale canvas.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<(ScreenRegion, Arc<Analysis>)>,
    requested: u64,
    applied: u64,
    last_error: Option<String>,
}

impl Session {
    /// A session with no analysis.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `generation` was submitted. Messages for older
    /// generations are ignored from now on.
    pub fn begin(&mut self, generation: u64) {
        self.requested = self.requested.max(generation);
    }

    /// Apply a worker message. Returns `false` if it was stale and
    /// ignored.
    pub fn apply(&mut self, message: WorkerMessage) -> bool {
        let generation = message.generation();
        if generation < self.requested || generation <= self.applied {
            tracing::debug!(generation, "ignoring stale analysis result");
            return false;
        }
        self.applied = generation;
        match message {
            WorkerMessage::AnalysisComplete {
                canvas_region,
                analysis,
                ..
            } => {
                self.current = Some((canvas_region, analysis));
                self.last_error = None;
            }
            WorkerMessage::AnalysisFailed { error, .. } => {
                self.current = None;
                self.last_error = Some(error.to_string());
            }
        }
        true
    }

    /// Whether a successful analysis is available.
    #[must_use]
    pub const fn is_analyzed(&self) -> bool {
        self.current.is_some()
    }

    /// The current analysis, if any.
    #[must_use]
    pub fn analysis(&self) -> Option<&Arc<Analysis>> {
        self.current.as_ref().map(|(_, analysis)| analysis)
    }

    /// Message of the most recent failure, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Swatch and canvas cells to click for `color`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotAnalyzed`] without a successful
    /// analysis and [`SessionError::SwatchNotFound`] when the color's
    /// swatch was not located.
    pub fn paint_plan(
        &self,
        color: ColorRgb,
        tolerance: impl Into<Tolerance>,
    ) -> Result<PaintPlan, SessionError> {
        let (canvas_region, analysis) = self.current.as_ref().ok_or(SessionError::NotAnalyzed)?;
        let swatch = analysis
            .swatch(color)
            .ok_or(SessionError::SwatchNotFound(color))?;
        let targets = analysis
            .paint_targets(color, tolerance)
            .into_iter()
            .map(|anchor| canvas_region.to_screen(anchor))
            .collect();
        Ok(PaintPlan { swatch, targets })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use placebot_vision::pixel_map::build_pixel_map;
    use placebot_vision::{
        AnalysisConfig, AnalysisError, ChannelOrder, ColorLocation, GridGeometry, RgbImage,
        Screenshot,
    };

    use super::*;

    const RED: ColorRgb = ColorRgb::new(255, 0, 24);
    const BLUE: ColorRgb = ColorRgb::new(0, 70, 255);

    /// One cell at anchor (20, 20): intended red, actual white.
    fn analysis() -> Arc<Analysis> {
        let img = RgbImage::from_fn(40, 40, |x, y| match (x, y) {
            (20, 20) => image::Rgb([255, 0, 24]),
            (12, 12) => image::Rgb([255, 255, 255]),
            _ => image::Rgb([40, 40, 40]),
        });
        let shot = Screenshot::new(img, ChannelOrder::Rgb).unwrap();
        let geometry = GridGeometry {
            cell_size: 20,
            anchors: vec![Coordinate::new(20, 20)],
        };
        let pixel_map = build_pixel_map(&shot, &geometry, &AnalysisConfig::default());
        let mut color_locations = ColorLocation::new();
        color_locations.insert(RED, Coordinate::new(1065, 565));
        Arc::new(Analysis {
            geometry,
            pixel_map,
            color_locations,
        })
    }

    fn complete(generation: u64) -> WorkerMessage {
        let analysis = analysis();
        WorkerMessage::AnalysisComplete {
            generation,
            canvas_region: ScreenRegion::new(300, 200, 40, 40).unwrap(),
            summary: analysis.summary(),
            analysis,
        }
    }

    fn failed(generation: u64) -> WorkerMessage {
        WorkerMessage::AnalysisFailed {
            generation,
            error: AnalysisError::EmptyInput,
        }
    }

    #[test]
    fn refuses_paint_work_before_analysis() {
        let session = Session::new();
        assert!(!session.is_analyzed());
        assert_eq!(session.paint_plan(RED, 5), Err(SessionError::NotAnalyzed));
    }

    #[test]
    fn plan_uses_screen_coordinates() {
        let mut session = Session::new();
        assert!(session.apply(complete(1)));
        let plan = session.paint_plan(RED, 5).unwrap();
        assert_eq!(plan.swatch, Coordinate::new(1065, 565));
        assert_eq!(plan.targets, vec![Coordinate::new(320, 220)]);
    }

    #[test]
    fn missing_swatch_is_an_error() {
        let mut session = Session::new();
        session.apply(complete(1));
        assert_eq!(
            session.paint_plan(BLUE, 5),
            Err(SessionError::SwatchNotFound(BLUE))
        );
    }

    #[test]
    fn failure_returns_to_not_analyzed() {
        let mut session = Session::new();
        session.apply(complete(1));
        assert!(session.apply(failed(2)));
        assert!(!session.is_analyzed());
        assert_eq!(session.last_error(), Some("input image data is empty"));
        assert_eq!(session.paint_plan(RED, 5), Err(SessionError::NotAnalyzed));

        assert!(session.apply(complete(3)));
        assert!(session.is_analyzed());
        assert_eq!(session.last_error(), None);
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut session = Session::new();
        session.begin(2);
        assert!(!session.apply(complete(1)));
        assert!(!session.is_analyzed());
        assert!(session.apply(complete(2)));
        assert!(!session.apply(failed(2)));
        assert!(session.is_analyzed());
    }

    #[test]
    fn new_analysis_replaces_the_old_one() {
        let mut session = Session::new();
        session.apply(complete(1));
        let first = Arc::clone(session.analysis().unwrap());
        session.apply(complete(2));
        let second = session.analysis().unwrap();
        assert!(!Arc::ptr_eq(&first, second));
    }
}
