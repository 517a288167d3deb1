use crate::Page;
use thiserror::Error;

/// Dictionary operation errors.
///
/// The variant records which lifecycle stage failed, because the
/// pipeline treats them differently: schema and close failures are
/// fatal, per-term failures are isolated and skipped.
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// Schema bootstrap failed; the run aborts before any write.
    #[error("Schema creation failed: {0}")]
    Schema(String),

    /// Storing a single term failed; the term is skipped.
    #[error("Failed to store term: {0}")]
    AddTerm(String),

    /// Releasing the dictionary failed.
    #[error("Failed to close dictionary: {0}")]
    Close(String),
}

impl DictionaryError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn add_term(msg: impl Into<String>) -> Self {
        Self::AddTerm(msg.into())
    }

    pub fn close(msg: impl Into<String>) -> Self {
        Self::Close(msg.into())
    }
}

/// Failure of a client extractor on a single page.
///
/// Cloneable so it can travel back with the batch results across the
/// worker-pool boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Extraction failed for page '{page_title}': {message}")]
pub struct ExtractionError {
    pub page_title: String,
    pub message: String,
}

impl ExtractionError {
    pub fn new(page: &Page, message: impl Into<String>) -> Self {
        Self {
            page_title: page.title.clone(),
            message: message.into(),
        }
    }
}
