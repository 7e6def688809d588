//! Pipeline error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The worker task's queue endpoint is gone; the pipeline was shut
    /// down or the worker exited.
    #[error("pipeline worker is not running")]
    WorkerGone,

    /// Finalize was requested but the completion reply never arrived.
    #[error("finalize did not complete: {0}")]
    FinalizeFailed(String),

    /// Shutdown exceeded its drain deadline.
    #[error("pipeline shutdown timed out after {0:?}")]
    ShutdownTimeout(std::time::Duration),

    /// First error the worker recorded while strict mode was on.
    #[error("render failed for block '{id}': {message}")]
    RenderFailed { id: String, message: String },
}
