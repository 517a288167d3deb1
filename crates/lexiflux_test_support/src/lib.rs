//! Shared fixtures for the workspace's integration tests.

use lexiflux_sqlite::rusqlite::Connection;
use lexiflux_sqlite::{SqlValue, SqliteDictionary};

/// Term type used across the integration tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestTerm {
    pub entry: String,
}

impl TestTerm {
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
        }
    }
}

pub const TEST_SCHEMA: &str = "CREATE TABLE my_table (entry TEXT PRIMARY KEY)";
pub const TEST_INSERT: &str = "INSERT INTO my_table (entry) VALUES (?)";

/// SQLite dictionary with the test schema and the entry statement
/// registered.
pub fn test_sqlite_dictionary(connection: Connection) -> SqliteDictionary<TestTerm> {
    let mut dictionary = SqliteDictionary::new(connection, TEST_SCHEMA);
    dictionary.register(TEST_INSERT, |term: &TestTerm| {
        Some(vec![vec![SqlValue::from(term.entry.clone())]])
    });
    dictionary
}

/// Wiki stream shared by the pipeline tests.
///
/// Contains, in order: complete pages A1 and B2, an untitled page, a
/// textless page, then C3, D4, E5 and Z6. With `inject_error` a stray
/// `__ERROR__` token lands between D4 and E5.
pub fn wiki_fixture(inject_error: bool) -> String {
    let error = if inject_error { "__ERROR__" } else { "" };

    format!(
        r#"
    <mediawiki>
        <page>
            <title>Alpha</title>
            <text>A1</text>
        </page>

        <page>
            <title>Beta</title>
            <text>B2</text>
        </page>

        <page>
            <text>Untitled page</text>
        </page>

        <page>
            <title>Page without text</title>
        </page>

        <page>
            <title>Gamma</title>
            <text>C3</text>
        </page>

        <page>
            <title>Delta</title>
            <text>D4</text>
        </page>{error}<page>
            <title>Epsilon</title>
            <text>E5</text>
        </page>

        <page>
            <title>Zeta</title>
            <text>Z6</text>
        </page>
    </mediawiki>
    "#
    )
}
