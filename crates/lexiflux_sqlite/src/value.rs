use rusqlite::types::{ToSql, ToSqlOutput, Value as RusqliteValue, ValueRef};

/// SQLite cell value covering the five storage classes.
///
/// A dedicated enum instead of `rusqlite::types::Value` keeps the
/// public result surface independent of the driver and gives command
/// consumers a stable display form.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Float(x) => write!(f, "{}", x),
            SqlValue::Text(s) => write!(f, "{}", s),
            SqlValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(RusqliteValue::Null),
            SqlValue::Int(i) => ToSqlOutput::Owned(RusqliteValue::Integer(*i)),
            SqlValue::Float(x) => ToSqlOutput::Owned(RusqliteValue::Real(*x)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

/// Read one cell of a result row.
pub(crate) fn column_value(row: &rusqlite::Row, idx: usize) -> SqlValue {
    match row.get_ref(idx) {
        Ok(ValueRef::Null) => SqlValue::Null,
        Ok(ValueRef::Integer(i)) => SqlValue::Int(i),
        Ok(ValueRef::Real(x)) => SqlValue::Float(x),
        Ok(ValueRef::Text(t)) => SqlValue::Text(String::from_utf8_lossy(t).to_string()),
        Ok(ValueRef::Blob(b)) => SqlValue::Bytes(b.to_vec()),
        Err(_) => SqlValue::Null,
    }
}
