use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Phase of a pipeline run.
///
/// Transitions are monotonic; the `Ended*` phases are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelinePhase {
    Created = 0,
    Initialising = 1,
    Running = 2,
    Draining = 3,
    EndedOk = 4,
    EndedCancelled = 5,
    EndedFailed = 6,
}

impl PipelinePhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PipelinePhase::Created,
            1 => PipelinePhase::Initialising,
            2 => PipelinePhase::Running,
            3 => PipelinePhase::Draining,
            4 => PipelinePhase::EndedOk,
            5 => PipelinePhase::EndedCancelled,
            _ => PipelinePhase::EndedFailed,
        }
    }

    /// Whether the run has reached a terminal phase.
    pub fn is_ended(&self) -> bool {
        matches!(
            self,
            PipelinePhase::EndedOk | PipelinePhase::EndedCancelled | PipelinePhase::EndedFailed
        )
    }
}

/// Shared phase cell, read by the handle and written by the
/// orchestrator thread.
#[derive(Clone)]
pub(crate) struct PhaseCell {
    phase: Arc<AtomicU8>,
}

impl PhaseCell {
    pub(crate) fn new() -> Self {
        Self {
            phase: Arc::new(AtomicU8::new(PipelinePhase::Created as u8)),
        }
    }

    pub(crate) fn get(&self) -> PipelinePhase {
        PipelinePhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Advance to `next` only if currently in the expected phase.
    pub(crate) fn advance(&self, expected: PipelinePhase, next: PipelinePhase) -> bool {
        match self.phase.compare_exchange(
            expected as u8,
            next as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => true,
            Err(actual) => {
                log::warn!(
                    "[PIPELINE] Invalid phase transition: expected {:?}, was {:?}",
                    expected,
                    PipelinePhase::from_u8(actual)
                );
                false
            }
        }
    }

    /// Record the terminal phase.
    pub(crate) fn finish(&self, terminal: PipelinePhase) {
        debug_assert!(terminal.is_ended());
        self.phase.store(terminal as u8, Ordering::SeqCst);
    }
}
