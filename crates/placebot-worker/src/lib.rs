//! Off-thread analysis for placebot.
//!
//! [`AnalysisWorker`] owns a background thread that captures the canvas
//! and palette regions and runs [`placebot_vision::analyze`]. Results
//! come back over a FIFO queue that the UI drains with
//! [`AnalysisWorker::poll`] on its own schedule, so the UI thread never
//! blocks on image processing.
//!
//! [`Session`] holds the most recent successful analysis and turns it
//! into paint work. It refuses to produce any until an analysis has
//! succeeded.

pub mod session;
pub mod worker;

use placebot_vision::{AnalysisError, ScreenRegion, Screenshot};

pub use session::{PaintPlan, Session, SessionError};
pub use worker::{AnalysisRequest, AnalysisWorker, WorkerMessage};

/// Source of screenshots.
///
/// Implementations document the [`ChannelOrder`](placebot_vision::ChannelOrder)
/// of the buffers they return. Any `Fn(&ScreenRegion) -> Result<Screenshot, _>`
/// closure that is `Send` works as a capture source.
pub trait Capture: Send + 'static {
    /// Capture the given screen region.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Capture`] (or any other analysis error)
    /// when no image could be produced.
    fn capture(&self, region: &ScreenRegion) -> Result<Screenshot, AnalysisError>;
}

impl<F> Capture for F
where
    F: Fn(&ScreenRegion) -> Result<Screenshot, AnalysisError> + Send + 'static,
{
    fn capture(&self, region: &ScreenRegion) -> Result<Screenshot, AnalysisError> {
        self(region)
    }
}
