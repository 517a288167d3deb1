use crate::DbError;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Operation run against a leased connection.
pub type LentOp<'a> = &'a mut dyn FnMut(&mut Connection) -> Result<(), DbError>;

/// Scoped provider of a database connection.
///
/// `lend` hands the connection to the callback for the duration of the
/// call and releases it afterwards, whether the callback succeeded or
/// failed. Nothing outside a lease may touch the connection.
pub trait ConnectionLender: Send {
    fn lend(&self, op: LentOp<'_>) -> Result<(), DbError>;
}

/// Lender that always leases the same shared connection.
///
/// This is what a SQLite dictionary hands to its serializer, so that
/// flushed batches commit against the dictionary's own connection. The
/// `MutexGuard` scope is the lease.
pub struct SharedConnectionLender {
    connection: Arc<Mutex<Connection>>,
}

impl SharedConnectionLender {
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl ConnectionLender for SharedConnectionLender {
    fn lend(&self, op: LentOp<'_>) -> Result<(), DbError> {
        let mut connection = self
            .connection
            .lock()
            .map_err(|e| DbError::query_failed(format!("Lock error: {}", e)))?;

        op(&mut connection)
    }
}
