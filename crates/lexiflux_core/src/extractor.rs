use crate::{ExtractionError, Page};
use std::sync::Arc;

/// A pure function from a page to the terms it contributes.
///
/// Extractors run on worker threads; they must not carry mutable
/// state. Per-page failures are returned, not panicked, so the
/// pipeline can isolate them and keep going.
pub type TermExtractor<T> =
    Arc<dyn Fn(&Page) -> Result<Vec<T>, ExtractionError> + Send + Sync>;
