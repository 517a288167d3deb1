mod error;
mod handle;
mod phase;
mod runner;
mod strategy;

pub use error::{PipelineError, StageError};
pub use handle::PipelineHandle;
pub use phase::PipelinePhase;
pub use runner::run_extraction_pipeline;
pub use strategy::PipelineStrategy;
