use crate::DictionaryError;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// Sink that durably stores extracted terms.
///
/// The pipeline guarantees single-writer discipline: `create_schema`
/// runs exactly once before any `add_term`, all `add_term` calls come
/// from one thread, and `close` runs exactly once after the last add,
/// whether the run succeeded, failed, or was cancelled. Implementations
/// therefore need no internal locking for correctness of the write
/// path itself.
pub trait Dictionary<T> {
    /// One-shot schema bootstrap.
    fn create_schema(&mut self) -> Result<(), DictionaryError>;

    /// Store a single term.
    fn add_term(&mut self, term: T) -> Result<(), DictionaryError>;

    /// Release the sink. Invoked on every exit path.
    fn close(&mut self) -> Result<(), DictionaryError>;
}

/// Dictionary keeping terms in an unordered in-memory set.
///
/// Clones share the same storage, so a caller can keep a handle while
/// handing another to the pipeline and observe the collected terms
/// after the run has ended.
pub struct InMemoryDictionary<T> {
    terms: Arc<Mutex<HashSet<T>>>,
}

impl<T> Clone for InMemoryDictionary<T> {
    fn clone(&self) -> Self {
        Self {
            terms: Arc::clone(&self.terms),
        }
    }
}

impl<T: Eq + Hash> InMemoryDictionary<T> {
    pub fn new() -> Self {
        Self {
            terms: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Snapshot of the stored terms.
    pub fn terms(&self) -> HashSet<T>
    where
        T: Clone,
    {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, term: &T) -> bool {
        self.lock().contains(term)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<T>> {
        self.terms.lock().expect("term set lock poisoned")
    }
}

impl<T: Eq + Hash> Default for InMemoryDictionary<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Send> Dictionary<T> for InMemoryDictionary<T> {
    fn create_schema(&mut self) -> Result<(), DictionaryError> {
        Ok(())
    }

    fn add_term(&mut self, term: T) -> Result<(), DictionaryError> {
        self.lock().insert(term);
        Ok(())
    }

    fn close(&mut self) -> Result<(), DictionaryError> {
        Ok(())
    }
}
