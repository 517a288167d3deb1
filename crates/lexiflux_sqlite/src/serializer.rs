use crate::error::format_sqlite_error;
use crate::{ConnectionLender, DbError, SqlValue};
use rusqlite::params_from_iter;

/// Positional parameters for one staged row.
pub type Row = Vec<SqlValue>;

/// Maps a term to the rows it contributes under one statement.
///
/// Returning `None` means the statement does not apply to this term
/// variant; returning rows stages them for the next flush. One term
/// may yield several rows.
pub type RowProducer<T> = Box<dyn Fn(&T) -> Option<Vec<Row>> + Send>;

pub const DEFAULT_FLUSH_THRESHOLD: usize = 256;

struct Registration<T> {
    statement: String,
    produce: RowProducer<T>,
    staged: Vec<Row>,
}

/// Staging buffer that batches rows per registered statement,
/// decoupling term production rate from SQL round-trips.
///
/// `flush` is the atomic commit unit: it leases a connection, executes
/// every statement's staged rows inside a single transaction, commits,
/// releases the lease, and only then clears the buffer. A failing
/// flush rolls back, keeps the staged rows intact, and returns the
/// error; the next flush retries the same rows.
pub struct BufferedDbSerializer<T> {
    lender: Box<dyn ConnectionLender>,
    registrations: Vec<Registration<T>>,
    staged_rows: usize,
    flush_threshold: usize,
}

impl<T> BufferedDbSerializer<T> {
    pub fn new(lender: Box<dyn ConnectionLender>) -> Self {
        Self::with_flush_threshold(lender, DEFAULT_FLUSH_THRESHOLD)
    }

    pub fn with_flush_threshold(
        lender: Box<dyn ConnectionLender>,
        flush_threshold: usize,
    ) -> Self {
        Self {
            lender,
            registrations: Vec::new(),
            staged_rows: 0,
            flush_threshold: flush_threshold.max(1),
        }
    }

    /// Associate a parameterised statement with the producer mapping a
    /// term to that statement's rows.
    pub fn register(
        &mut self,
        statement: impl Into<String>,
        produce: impl Fn(&T) -> Option<Vec<Row>> + Send + 'static,
    ) {
        self.registrations.push(Registration {
            statement: statement.into(),
            produce: Box::new(produce),
            staged: Vec::new(),
        });
    }

    /// Stage the rows for one term, flushing when the buffer is full.
    ///
    /// A term matched by no registered statement is an error; the
    /// caller decides whether that is fatal.
    pub fn add(&mut self, term: &T) -> Result<(), DbError> {
        let mut matched = false;

        for registration in &mut self.registrations {
            if let Some(rows) = (registration.produce)(term) {
                matched = true;
                self.staged_rows += rows.len();
                registration.staged.extend(rows);
            }
        }

        if !matched {
            return Err(DbError::NoSerializer);
        }

        if self.staged_rows >= self.flush_threshold {
            self.flush()?;
        }

        Ok(())
    }

    /// Number of rows currently staged.
    pub fn staged_rows(&self) -> usize {
        self.staged_rows
    }

    /// Execute all staged rows as one committed batch.
    pub fn flush(&mut self) -> Result<(), DbError> {
        if self.staged_rows == 0 {
            return Ok(());
        }

        let registrations = &self.registrations;
        self.lender.lend(&mut |connection| {
            let tx = connection
                .transaction()
                .map_err(|e| format_sqlite_error(&e))?;

            for registration in registrations {
                if registration.staged.is_empty() {
                    continue;
                }

                let mut stmt = tx
                    .prepare(&registration.statement)
                    .map_err(|e| format_sqlite_error(&e))?;

                for row in &registration.staged {
                    stmt.execute(params_from_iter(row.iter()))
                        .map_err(|e| format_sqlite_error(&e))?;
                }
            }

            tx.commit().map_err(|e| format_sqlite_error(&e))
        })?;

        log::debug!("[FLUSH] Committed {} staged rows", self.staged_rows);

        for registration in &mut self.registrations {
            registration.staged.clear();
        }
        self.staged_rows = 0;

        Ok(())
    }
}
