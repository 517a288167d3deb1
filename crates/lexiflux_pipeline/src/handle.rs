use crate::phase::PhaseCell;
use crate::{PipelineError, PipelinePhase};
use lexiflux_core::CancelToken;
use std::panic;
use std::thread::JoinHandle;

/// External control surface over a running pipeline.
///
/// Returned immediately by `run_extraction_pipeline`; the run itself
/// proceeds on a background thread.
pub struct PipelineHandle {
    cancel_token: CancelToken,
    phase: PhaseCell,
    orchestrator: Option<JoinHandle<Result<(), PipelineError>>>,
}

impl PipelineHandle {
    pub(crate) fn new(
        cancel_token: CancelToken,
        phase: PhaseCell,
        orchestrator: JoinHandle<Result<(), PipelineError>>,
    ) -> Self {
        Self {
            cancel_token,
            phase,
            orchestrator: Some(orchestrator),
        }
    }

    /// Request cooperative cancellation. Idempotent; returns
    /// immediately, without waiting for the run to stop.
    pub fn request_cancel(&self) {
        if self.cancel_token.cancel() {
            log::info!("[CANCEL] Pipeline cancellation requested");
        }
    }

    /// Current phase of the run.
    pub fn phase(&self) -> PipelinePhase {
        self.phase.get()
    }

    /// Block until the run reaches a terminal phase and return its
    /// outcome. When this returns, `on_ended` has already been
    /// delivered. An orchestrator panic is re-raised here.
    ///
    /// # Panics
    ///
    /// Panics when called a second time on the same handle.
    pub fn join(&mut self) -> Result<(), PipelineError> {
        let orchestrator = self
            .orchestrator
            .take()
            .expect("pipeline handle already joined");

        match orchestrator.join() {
            Ok(outcome) => outcome,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}
