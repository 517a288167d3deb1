mod dictionary;
mod error;
mod lender;
mod serializer;
mod target;
mod value;

pub use dictionary::{CommandResult, SqliteDictionary};
pub use error::DbError;
pub use lender::{ConnectionLender, LentOp, SharedConnectionLender};
pub use serializer::{BufferedDbSerializer, DEFAULT_FLUSH_THRESHOLD, Row, RowProducer};
pub use target::SqliteTarget;
pub use value::SqlValue;

pub use rusqlite;
