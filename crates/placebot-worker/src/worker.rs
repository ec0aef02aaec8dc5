//! The background analysis thread.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use placebot_vision::{
    Analysis, AnalysisConfig, AnalysisError, AnalysisSummary, ColorRgb, ScreenRegion,
};

use crate::Capture;
use crate::session::SessionError;

/// Everything one analysis run needs.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Screen region showing the canvas.
    pub canvas_region: ScreenRegion,
    /// Screen region showing the palette.
    pub palette_region: ScreenRegion,
    /// Palette colors to locate (already filtered of ignored entries).
    pub colors: Vec<ColorRgb>,
    /// Heuristic parameters.
    pub config: AnalysisConfig,
}

/// A message from the worker thread.
///
/// Every message carries the generation returned by the
/// [`AnalysisWorker::submit`] call that produced it.
#[derive(Debug)]
pub enum WorkerMessage {
    /// The analysis succeeded.
    AnalysisComplete {
        /// Generation of the request.
        generation: u64,
        /// Where the canvas was captured; anchors are relative to it.
        canvas_region: ScreenRegion,
        /// The analysis, shared so the UI and a paint loop can both hold it.
        analysis: Arc<Analysis>,
        /// Headline numbers for status displays.
        summary: AnalysisSummary,
    },
    /// Capture or analysis failed.
    AnalysisFailed {
        /// Generation of the request.
        generation: u64,
        /// What went wrong.
        error: AnalysisError,
    },
}

impl WorkerMessage {
    /// Generation of the request this message answers.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        match self {
            Self::AnalysisComplete { generation, .. } | Self::AnalysisFailed { generation, .. } => {
                *generation
            }
        }
    }
}

/// Handle to the background analysis thread.
///
/// Dropping the handle closes the request queue and joins the thread
/// once it finishes the request in progress.
pub struct AnalysisWorker {
    requests: Option<Sender<(u64, AnalysisRequest)>>,
    messages: Receiver<WorkerMessage>,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    /// Start the worker thread with the given capture source.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be spawned.
    pub fn spawn(capture: impl Capture) -> std::io::Result<Self> {
        let (request_tx, request_rx) = crossbeam_channel::unbounded();
        let (message_tx, message_rx) = crossbeam_channel::unbounded();
        let handle = std::thread::Builder::new()
            .name("placebot-analysis".to_string())
            .spawn(move || run(&capture, &request_rx, &message_tx))?;
        tracing::info!("analysis worker started");
        Ok(Self {
            requests: Some(request_tx),
            messages: message_rx,
            generation: 0,
            handle: Some(handle),
        })
    }

    /// Queue an analysis and return its generation.
    ///
    /// Generations increase by one per call. When several requests are
    /// queued while the worker is busy, only the newest is run; the
    /// superseded ones never produce a message.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WorkerStopped`] if the worker thread has
    /// exited.
    pub fn submit(&mut self, request: AnalysisRequest) -> Result<u64, SessionError> {
        let sender = self.requests.as_ref().ok_or(SessionError::WorkerStopped)?;
        self.generation += 1;
        sender
            .send((self.generation, request))
            .map_err(|_| SessionError::WorkerStopped)?;
        Ok(self.generation)
    }

    /// Drain every message that is ready, oldest first, without blocking.
    #[must_use]
    pub fn poll(&self) -> Vec<WorkerMessage> {
        self.messages.try_iter().collect()
    }

    /// Wait up to `timeout` for the next message.
    #[must_use]
    pub fn wait(&self, timeout: Duration) -> Option<WorkerMessage> {
        self.messages.recv_timeout(timeout).ok()
    }

    /// Generation of the most recent [`submit`](Self::submit), or 0.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        // Closing the request queue ends the worker loop.
        self.requests = None;
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("analysis worker panicked");
        }
    }
}

fn run(
    capture: &impl Capture,
    requests: &Receiver<(u64, AnalysisRequest)>,
    messages: &Sender<WorkerMessage>,
) {
    while let Ok(mut next) = requests.recv() {
        // Latest wins: skip requests superseded while we were busy.
        while let Ok(newer) = requests.try_recv() {
            tracing::debug!(skipped = next.0, "superseded analysis request");
            next = newer;
        }
        let (generation, request) = next;
        let message = analyze(capture, generation, &request);
        if messages.send(message).is_err() {
            break;
        }
    }
    tracing::info!("analysis worker stopped");
}

fn analyze(capture: &impl Capture, generation: u64, request: &AnalysisRequest) -> WorkerMessage {
    let result = capture.capture(&request.canvas_region).and_then(|canvas| {
        let palette = capture.capture(&request.palette_region)?;
        placebot_vision::analyze(
            &canvas,
            &palette,
            &request.palette_region,
            &request.colors,
            &request.config,
        )
    });
    match result {
        Ok(analysis) => {
            let summary = analysis.summary();
            tracing::info!(
                generation,
                cell_size = summary.cell_size,
                pixels = summary.pixel_count,
                colors = summary.colors_found,
                "analysis complete",
            );
            WorkerMessage::AnalysisComplete {
                generation,
                canvas_region: request.canvas_region,
                analysis: Arc::new(analysis),
                summary,
            }
        }
        Err(error) => {
            tracing::warn!(generation, %error, "analysis failed");
            WorkerMessage::AnalysisFailed { generation, error }
        }
    }
}
