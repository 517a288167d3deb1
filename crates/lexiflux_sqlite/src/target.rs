use crate::DbError;
use rusqlite::Connection;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Working/target location pair for a SQLite-backed extraction run.
///
/// The dictionary is built in a uniquely named working database under
/// the temp directory; only a clean finish promotes it over the target
/// path. The user-visible output therefore appears in one step, never
/// as a half-written database.
pub struct SqliteTarget {
    target_path: PathBuf,
    working_path: PathBuf,
}

impl SqliteTarget {
    pub fn new(target_path: impl Into<PathBuf>) -> Self {
        let working_path = std::env::temp_dir().join(format!("lexiflux-{}.db", Uuid::new_v4()));

        Self {
            target_path: target_path.into(),
            working_path,
        }
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn working_path(&self) -> &Path {
        &self.working_path
    }

    /// Open the working database the dictionary is built in.
    pub fn open_working_connection(&self) -> Result<Connection, DbError> {
        Connection::open(&self.working_path).map_err(|e| DbError::connection_failed(e.to_string()))
    }

    /// Copy the working database over the target path and drop the
    /// working copy.
    pub fn promote(&self) -> Result<(), io::Error> {
        log::info!(
            "[TARGET] Promoting {} -> {}",
            self.working_path.display(),
            self.target_path.display()
        );

        fs::copy(&self.working_path, &self.target_path)?;
        fs::remove_file(&self.working_path)?;

        Ok(())
    }
}

impl Drop for SqliteTarget {
    fn drop(&mut self) {
        // Remove the working copy if the run never promoted it.
        let _ = fs::remove_file(&self.working_path);
    }
}
