//! Test database utilities.
//!
//! Provides [`TestDatabase`], a [`MemoryDatabase`] wrapper that counts every
//! query it evaluates. It implements [`DbExecutor`] so managers and query sets
//! can run against it directly.
//!
//! ## Example
//!
//! ```rust,no_run
//! use easy_scoping_test::test_database::TestDatabase;
//!
//! let db = TestDatabase::new();
//! assert_eq!(db.query_count(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use easy_scoping_core::ScopingResult;
use easy_scoping_db::fixtures::FixtureLoader;
use easy_scoping_db::{AggregateFunc, DbExecutor, Manager, MemoryDatabase, Model, Query, Row, Value};

/// A fresh in-memory database with a query counter.
///
/// Cloning shares both the storage and the counter, so a clone handed to a
/// [`Manager`] is counted here too.
#[derive(Debug, Clone, Default)]
pub struct TestDatabase {
    backend: Arc<MemoryDatabase>,
    query_count: Arc<AtomicUsize>,
}

impl TestDatabase {
    /// Creates an empty test database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this database as a shareable executor.
    pub fn executor(&self) -> Arc<dyn DbExecutor> {
        Arc::new(self.clone())
    }

    /// Returns a manager for `M` backed by this database.
    pub fn manager<M: Model>(&self) -> Manager<M> {
        Manager::new(self.executor())
    }

    /// Loads a named fixture through `loader`. Inserts are not counted.
    pub fn load_fixture(&self, loader: &FixtureLoader, name: &str) -> ScopingResult<usize> {
        loader.load(self.backend.as_ref(), name)
    }

    /// Returns the current query count.
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::Relaxed)
    }

    /// Resets the query counter to zero.
    pub fn reset_query_count(&self) {
        self.query_count.store(0, Ordering::Relaxed);
    }

    /// Returns a reference to the inner `MemoryDatabase`.
    pub fn backend(&self) -> &MemoryDatabase {
        &self.backend
    }

    fn record(&self, what: &str, query: &Query) {
        let n = self.query_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(table = %query.table, n, "{what}");
    }
}

impl DbExecutor for TestDatabase {
    fn query(&self, query: &Query) -> ScopingResult<Vec<Row>> {
        self.record("query", query);
        self.backend.query(query)
    }

    fn count(&self, query: &Query) -> ScopingResult<i64> {
        self.record("count", query);
        self.backend.count(query)
    }

    fn aggregate(&self, query: &Query, func: AggregateFunc, column: &str) -> ScopingResult<Value> {
        self.record("aggregate", query);
        self.backend.aggregate(query, func, column)
    }

    fn insert(&self, table: &str, pk: &str, row: Row) -> ScopingResult<Value> {
        self.backend.insert(table, pk, row)
    }

    fn truncate(&self, table: &str) -> ScopingResult<()> {
        self.backend.truncate(table)
    }
}
