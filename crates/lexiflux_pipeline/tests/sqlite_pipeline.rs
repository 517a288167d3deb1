use lexiflux_core::{Dictionary, DictionaryError, InThreadPool, Page, TermExtractor};
use lexiflux_pipeline::{
    PipelineError, PipelineStrategy, StageError, run_extraction_pipeline,
};
use lexiflux_sqlite::rusqlite::Connection;
use lexiflux_sqlite::{SqliteDictionary, SqliteTarget};
use lexiflux_test_support::{TestTerm, test_sqlite_dictionary, wiki_fixture};
use std::collections::HashSet;
use std::io::{BufRead, Cursor};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

type DictionaryFactory = Box<dyn Fn(Connection) -> Box<dyn Dictionary<TestTerm> + Send> + Send>;

#[derive(Default)]
struct EndedRecord {
    invocations: usize,
    error: Option<String>,
}

/// Strategy writing into a working SQLite database, promoted over the
/// target path on success.
struct SqliteStrategy {
    target: SqliteTarget,
    factory: DictionaryFactory,
    ended: Arc<Mutex<EndedRecord>>,
}

impl SqliteStrategy {
    fn new(target_path: impl Into<PathBuf>, factory: DictionaryFactory) -> Self {
        Self {
            target: SqliteTarget::new(target_path),
            factory,
            ended: Arc::new(Mutex::new(EndedRecord::default())),
        }
    }

    fn ended(&self) -> Arc<Mutex<EndedRecord>> {
        Arc::clone(&self.ended)
    }
}

impl PipelineStrategy<TestTerm> for SqliteStrategy {
    type Pool = InThreadPool;

    fn create_pool(&mut self) -> InThreadPool {
        InThreadPool::new()
    }

    fn wiki_source(&mut self) -> Result<Box<dyn BufRead + Send>, StageError> {
        Ok(Box::new(Cursor::new(wiki_fixture(false))))
    }

    fn term_extractor(&self) -> TermExtractor<TestTerm> {
        Arc::new(|page: &Page| Ok(vec![TestTerm::new(page.text.clone())]))
    }

    fn create_dictionary(&mut self) -> Result<Box<dyn Dictionary<TestTerm> + Send>, StageError> {
        let connection = self
            .target
            .open_working_connection()
            .map_err(|e| StageError::message(e.to_string()))?;

        Ok((self.factory)(connection))
    }

    fn perform_last_successful_steps(&mut self) -> Result<(), StageError> {
        Ok(self.target.promote()?)
    }

    fn on_ended(&mut self, error: Option<&PipelineError>) {
        let mut record = self.ended.lock().unwrap();
        record.invocations += 1;
        record.error = error.map(|e| e.to_string());
    }
}

/// SQLite dictionary rejecting a fixed set of entries.
struct FaultySqliteDictionary {
    inner: SqliteDictionary<TestTerm>,
    rejected: HashSet<String>,
}

impl Dictionary<TestTerm> for FaultySqliteDictionary {
    fn create_schema(&mut self) -> Result<(), DictionaryError> {
        self.inner.create_schema()
    }

    fn add_term(&mut self, term: TestTerm) -> Result<(), DictionaryError> {
        if self.rejected.contains(&term.entry) {
            return Err(DictionaryError::add_term("Custom test failure!"));
        }
        self.inner.add_term(term)
    }

    fn close(&mut self) -> Result<(), DictionaryError> {
        self.inner.close()
    }
}

fn target_entries(target_path: &Path) -> Vec<String> {
    let checking = Connection::open(target_path).unwrap();
    let mut stmt = checking
        .prepare("SELECT entry FROM my_table ORDER BY entry")
        .unwrap();
    let entries = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    entries
}

fn plain_factory() -> DictionaryFactory {
    Box::new(|connection| Box::new(test_sqlite_dictionary(connection)))
}

#[test]
fn merry_path_promotes_the_target_database() {
    let dir = tempfile::tempdir().unwrap();
    let target_path = dir.path().join("terms.db");

    let strategy = SqliteStrategy::new(&target_path, plain_factory());
    let ended = strategy.ended();

    let mut handle = run_extraction_pipeline(strategy);
    assert!(handle.join().is_ok());

    assert_eq!(
        target_entries(&target_path),
        vec!["A1", "B2", "C3", "D4", "E5", "Z6"]
    );

    let record = ended.lock().unwrap();
    assert_eq!(record.invocations, 1);
    assert!(record.error.is_none());
}

#[test]
fn dictionary_failures_leave_the_remaining_entries() {
    let dir = tempfile::tempdir().unwrap();
    let target_path = dir.path().join("terms.db");

    let factory: DictionaryFactory = Box::new(|connection| {
        Box::new(FaultySqliteDictionary {
            inner: test_sqlite_dictionary(connection),
            rejected: HashSet::from(["C3".to_string(), "E5".to_string()]),
        })
    });

    let strategy = SqliteStrategy::new(&target_path, factory);

    let mut handle = run_extraction_pipeline(strategy);
    assert!(handle.join().is_ok());

    assert_eq!(target_entries(&target_path), vec!["A1", "B2", "D4", "Z6"]);
}

#[test]
fn schema_failure_is_a_preprocessing_error() {
    let dir = tempfile::tempdir().unwrap();
    let target_path = dir.path().join("terms.db");

    // Truncated DDL makes create_schema fail before any page is read.
    let factory: DictionaryFactory = Box::new(|connection| {
        let mut dictionary: SqliteDictionary<TestTerm> =
            SqliteDictionary::new(connection, "CREATE TABLE");
        dictionary.register(lexiflux_test_support::TEST_INSERT, |term: &TestTerm| {
            Some(vec![vec![term.entry.clone().into()]])
        });
        Box::new(dictionary)
    });

    let strategy = SqliteStrategy::new(&target_path, factory);
    let ended = strategy.ended();

    let mut handle = run_extraction_pipeline(strategy);
    let outcome = handle.join();

    assert!(matches!(
        outcome,
        Err(PipelineError::PreProcessing(StageError::Dictionary(
            DictionaryError::Schema(_)
        )))
    ));
    assert!(!target_path.exists());
    assert_eq!(ended.lock().unwrap().invocations, 1);
}

#[test]
fn invalid_target_path_is_a_postprocessing_error() {
    let strategy = SqliteStrategy::new("terms\0.db", plain_factory());
    let ended = strategy.ended();

    let mut handle = run_extraction_pipeline(strategy);
    let outcome = handle.join();

    assert!(matches!(
        outcome,
        Err(PipelineError::PostProcessing(StageError::Io(_)))
    ));

    let record = ended.lock().unwrap();
    assert_eq!(record.invocations, 1);
    assert!(record.error.as_deref().unwrap().starts_with("Post-processing failed"));
}
