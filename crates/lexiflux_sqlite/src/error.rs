use thiserror::Error;

/// Database operation errors for the SQLite dictionary stack.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to open the database file.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Statement execution failed (general catch-all).
    #[error("{0}")]
    QueryFailed(String),

    /// The statement has a syntax error.
    #[error("Syntax error: {0}")]
    SyntaxError(String),

    /// A constraint was violated (unique, foreign key, check, not null).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// No registered statement produces rows for the term.
    #[error("No registered statement matches the term")]
    NoSerializer,

    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DbError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    pub fn query_failed(msg: impl Into<String>) -> Self {
        Self::QueryFailed(msg.into())
    }
}

/// Map a rusqlite error onto the taxonomy, keeping the extended result
/// code visible for diagnosis.
pub(crate) fn format_sqlite_error(e: &rusqlite::Error) -> DbError {
    use rusqlite::ffi::ErrorCode;

    match e {
        rusqlite::Error::SqliteFailure(err, msg) => {
            let message = match msg {
                Some(msg) => format!("{} (code: {:?} ({}))", msg, err.code, err.extended_code),
                None => format!("{:?} ({})", err.code, err.extended_code),
            };
            log::error!("[SQL] Statement failed: {}", message);

            match err.code {
                ErrorCode::ConstraintViolation => DbError::ConstraintViolation(message),
                _ => DbError::QueryFailed(message),
            }
        }
        rusqlite::Error::SqlInputError { msg, offset, .. } => {
            DbError::SyntaxError(format!("{} (at offset {})", msg, offset))
        }
        _ => DbError::QueryFailed(e.to_string()),
    }
}
