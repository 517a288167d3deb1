use crate::error::format_sqlite_error;
use crate::value::column_value;
use crate::{BufferedDbSerializer, DbError, Row, SharedConnectionLender, SqlValue};
use lexiflux_core::{Dictionary, DictionaryError};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

/// Result set of an ad-hoc command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// Dictionary bound to a SQLite connection.
///
/// Writes go through a [`BufferedDbSerializer`] whose lender always
/// leases this dictionary's own connection, so flushed batches commit
/// against the dictionary's transaction scope. The schema DDL and the
/// statement registrations are supplied by the client at construction
/// time.
pub struct SqliteDictionary<T> {
    connection: Arc<Mutex<Connection>>,
    serializer: BufferedDbSerializer<T>,
    schema_sql: String,
}

impl<T> SqliteDictionary<T> {
    pub fn new(connection: Connection, schema_sql: impl Into<String>) -> Self {
        let connection = Arc::new(Mutex::new(connection));
        let lender = SharedConnectionLender::new(Arc::clone(&connection));

        Self {
            connection,
            serializer: BufferedDbSerializer::new(Box::new(lender)),
            schema_sql: schema_sql.into(),
        }
    }

    /// Associate a parameterised statement with the producer mapping a
    /// term to that statement's rows.
    pub fn register(
        &mut self,
        statement: impl Into<String>,
        produce: impl Fn(&T) -> Option<Vec<Row>> + Send + 'static,
    ) {
        self.serializer.register(statement, produce);
    }

    /// Execute an ad-hoc SQL command and return its result set.
    ///
    /// Failures come back as the `Err` value; this entry point serves
    /// interactive query tools, which handle errors like any other
    /// outcome.
    pub fn execute_command(&self, sql: &str) -> Result<CommandResult, DbError> {
        let connection = self.lock()?;

        let mut stmt = connection
            .prepare(sql)
            .map_err(|e| format_sqlite_error(&e))?;

        let headers: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let column_count = stmt.column_count();

        let mut rows = Vec::new();
        let mut result_rows = stmt.query([]).map_err(|e| format_sqlite_error(&e))?;
        while let Some(row) = result_rows.next().map_err(|e| format_sqlite_error(&e))? {
            let values = (0..column_count).map(|i| column_value(row, i)).collect();
            rows.push(values);
        }

        Ok(CommandResult { headers, rows })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.connection
            .lock()
            .map_err(|e| DbError::query_failed(format!("Lock error: {}", e)))
    }
}

impl<T: Send> Dictionary<T> for SqliteDictionary<T> {
    fn create_schema(&mut self) -> Result<(), DictionaryError> {
        log::info!("[SCHEMA] Creating dictionary schema");

        let connection = self
            .lock()
            .map_err(|e| DictionaryError::schema(e.to_string()))?;

        connection
            .execute_batch(&self.schema_sql)
            .map_err(|e| DictionaryError::schema(format_sqlite_error(&e).to_string()))
    }

    fn add_term(&mut self, term: T) -> Result<(), DictionaryError> {
        self.serializer
            .add(&term)
            .map_err(|e| DictionaryError::add_term(e.to_string()))
    }

    fn close(&mut self) -> Result<(), DictionaryError> {
        // Final flush; the connection itself closes when the dictionary
        // is dropped.
        self.serializer
            .flush()
            .map_err(|e| DictionaryError::close(e.to_string()))
    }
}
