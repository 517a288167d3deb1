use lexiflux_core::DictionaryError;
use thiserror::Error;

/// Failure inside a structural stage of the run (setup or promotion).
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{0}")]
    Dictionary(#[from] DictionaryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Message(String),
}

impl StageError {
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}

/// Terminal pipeline failures.
///
/// Per-item failures (extractor, `add_term`) never appear here: they
/// are isolated and reported through `on_message`. A mid-stream XML
/// parse error is treated as end-of-input, not as a failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Setup failed before any page was processed.
    #[error("Pre-processing failed: {0}")]
    PreProcessing(#[source] StageError),

    /// The run was stopped by an external cancel request.
    #[error("Pipeline cancelled")]
    Cancelled,

    /// Final steps failed after a successful extraction.
    #[error("Post-processing failed: {0}")]
    PostProcessing(#[source] StageError),
}
