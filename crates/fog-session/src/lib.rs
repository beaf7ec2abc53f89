//! Upload session controller.
//!
//! Holds all state for the most recent upload and exposes explicit transition
//! operations, so the whole upload lifecycle can be unit-tested without any
//! rendering or I/O attached. Every transition carries the generation returned
//! by `on_upload_start`; a result arriving for a superseded upload is
//! discarded instead of overwriting newer state.

use fog_proto::{Detection, FogDensityResponse};
use fog_vision::{
    summarize_confidence, ConfidenceSummary, ImageDimensions, PerformanceMetrics,
    PerformanceSource,
};
use tracing::{debug, warn};

pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    DimensionProbing,
    Inferring,
    Succeeded,
    Failed,
}

/// One variant per user-visible failure. None are retried; each failure is
/// scoped to a single upload attempt and leaves the session ready for the
/// next one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("upload rejected: {0}")]
    UploadRejected(String),
    #[error("failed to read the uploaded file: {0}")]
    FileReadFailed(String),
    #[error("failed to get image dimensions; the image might be invalid or corrupted")]
    ImageDecodeFailed,
    #[error("AI processing failed: {0}")]
    InferenceFailed(String),
}

/// Fan-in of the three inference calls for one upload.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub fog: FogDensityResponse,
    pub enhanced_photo_data_uri: String,
    pub detections: Vec<Detection>,
}

pub struct Session<P: PerformanceSource> {
    state: SessionState,
    generation: Generation,
    performance_source: P,

    dimensions: Option<ImageDimensions>,
    outcome: Option<AnalysisOutcome>,
    confidence: Option<ConfidenceSummary>,
    performance: Option<PerformanceMetrics>,
    error: Option<SessionError>,
}

impl<P: PerformanceSource> Session<P> {
    pub fn new(performance_source: P) -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
            performance_source,
            dimensions: None,
            outcome: None,
            confidence: None,
            performance: None,
            error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn dimensions(&self) -> Option<ImageDimensions> {
        self.dimensions
    }

    pub fn outcome(&self) -> Option<&AnalysisOutcome> {
        self.outcome.as_ref()
    }

    pub fn confidence(&self) -> Option<&ConfidenceSummary> {
        self.confidence.as_ref()
    }

    pub fn performance(&self) -> Option<PerformanceMetrics> {
        self.performance
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    /// Begins a new upload: clears every stored result and supersedes any
    /// in-flight work from earlier uploads.
    pub fn on_upload_start(&mut self) -> Generation {
        self.dimensions = None;
        self.outcome = None;
        self.confidence = None;
        self.performance = None;
        self.error = None;
        self.generation += 1;
        self.state = SessionState::DimensionProbing;
        debug!("session: upload {} started", self.generation);
        self.generation
    }

    /// Records a failure that happened before inference (read or validation).
    pub fn on_upload_failed(&mut self, generation: Generation, err: SessionError) {
        if self.is_stale(generation) {
            return;
        }
        self.fail(err);
    }

    /// Dimension probe finished. Zero dimensions are a decode failure.
    pub fn on_dimensions_ready(
        &mut self,
        generation: Generation,
        dims: ImageDimensions,
    ) -> Result<(), SessionError> {
        if self.is_stale(generation) {
            return Ok(());
        }
        if self.state != SessionState::DimensionProbing {
            warn!("session: dimensions arrived in state {:?}, ignoring", self.state);
            return Ok(());
        }
        if dims.width == 0 || dims.height == 0 {
            self.fail(SessionError::ImageDecodeFailed);
            return Err(SessionError::ImageDecodeFailed);
        }
        self.dimensions = Some(dims);
        self.state = SessionState::Inferring;
        Ok(())
    }

    /// All three inference calls settled (or the join failed fast). A failure
    /// discards any partial results; success derives the confidence summary
    /// and draws fresh performance metrics when detections are present.
    pub fn on_inference_settled(
        &mut self,
        generation: Generation,
        result: Result<AnalysisOutcome, SessionError>,
    ) {
        if self.is_stale(generation) {
            return;
        }
        if self.state != SessionState::Inferring {
            warn!("session: inference settled in state {:?}, ignoring", self.state);
            return;
        }
        match result {
            Ok(outcome) => {
                self.confidence = summarize_confidence(&outcome.detections);
                self.performance = if outcome.detections.is_empty() {
                    None
                } else {
                    Some(self.performance_source.sample())
                };
                self.outcome = Some(outcome);
                self.state = SessionState::Succeeded;
            }
            Err(err) => self.fail(err),
        }
    }

    fn is_stale(&self, generation: Generation) -> bool {
        if generation != self.generation {
            debug!(
                "session: dropping result for superseded upload {} (current {})",
                generation, self.generation
            );
            return true;
        }
        false
    }

    fn fail(&mut self, err: SessionError) {
        self.dimensions = None;
        self.outcome = None;
        self.confidence = None;
        self.performance = None;
        self.error = Some(err);
        self.state = SessionState::Failed;
    }
}
