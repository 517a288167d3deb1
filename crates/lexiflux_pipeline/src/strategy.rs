use crate::{PipelineError, StageError};
use lexiflux_core::{Dictionary, TermExtractor, WorkerPool};
use std::io::BufRead;

/// Policy bundle for one pipeline run.
///
/// All client-supplied factories and callbacks live here; the
/// orchestrator owns everything the factories return and releases it
/// on every exit path. Lifecycle hooks default to no-ops so simple
/// strategies only implement the factories.
///
/// Factories must not share mutable state across calls: each run owns
/// its pool, wiki stream, dictionary, and cancel token.
pub trait PipelineStrategy<T: Send + 'static>: Send + 'static {
    type Pool: WorkerPool;

    /// First hook to run, before any resource is created.
    fn initialize_pipeline(&mut self) -> Result<(), StageError> {
        Ok(())
    }

    /// Worker pool driving the extraction stage.
    fn create_pool(&mut self) -> Self::Pool;

    /// Byte stream of the wiki dump.
    fn wiki_source(&mut self) -> Result<Box<dyn BufRead + Send>, StageError>;

    /// Pure function extracting terms from one page. Runs on worker
    /// threads, so any state beyond the page must be closed over as
    /// immutable values.
    fn term_extractor(&self) -> TermExtractor<T>;

    /// Sink the writer stores terms into.
    fn create_dictionary(&mut self) -> Result<Box<dyn Dictionary<T> + Send>, StageError>;

    /// Runs only after a clean finish, e.g. promoting the output
    /// database into its final location.
    fn perform_last_successful_steps(&mut self) -> Result<(), StageError> {
        Ok(())
    }

    /// Non-fatal notices: skipped terms, skipped pages, truncated
    /// streams.
    fn on_message(&self, _message: &str) {}

    /// Invoked exactly once when the run reaches a terminal phase,
    /// with `None` on success.
    fn on_ended(&mut self, _error: Option<&PipelineError>) {}
}
