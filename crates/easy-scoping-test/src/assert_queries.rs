//! Query counting assertions.
//!
//! [`assert_num_queries`] counts the queries a closure evaluates against a
//! [`TestDatabase`] and asserts the count. Query sets are lazy, so this also
//! checks that building a chain of scopes runs nothing until it is evaluated.
//!
//! ## Example
//!
//! ```rust,no_run
//! use easy_scoping_test::test_database::TestDatabase;
//! use easy_scoping_test::assert_queries::assert_num_queries;
//! use easy_scoping_db::{DbExecutor, Query};
//!
//! let db = TestDatabase::new();
//! assert_num_queries(&db, 1, || {
//!     db.query(&Query::new("widgets_widget", "id")).unwrap();
//! });
//! ```

use crate::test_database::TestDatabase;

/// Asserts that exactly `expected_count` queries are evaluated during `f`.
///
/// Resets the query counter on the [`TestDatabase`] before running `f`.
///
/// # Panics
///
/// Panics if the number of queries does not match `expected_count`.
pub fn assert_num_queries<F: FnOnce()>(db: &TestDatabase, expected_count: usize, f: F) {
    db.reset_query_count();
    f();
    let actual = db.query_count();
    assert_eq!(
        actual, expected_count,
        "Expected {expected_count} queries, but {actual} were executed"
    );
}

/// Asserts that at most `max_count` queries are evaluated during `f`.
///
/// # Panics
///
/// Panics if more than `max_count` queries are evaluated.
pub fn assert_max_queries<F: FnOnce()>(db: &TestDatabase, max_count: usize, f: F) {
    db.reset_query_count();
    f();
    let actual = db.query_count();
    assert!(
        actual <= max_count,
        "Expected at most {max_count} queries, but {actual} were executed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use easy_scoping_db::{DbExecutor, Query};

    fn query() -> Query {
        Query::new("nq", "id")
    }

    #[test]
    fn test_assert_num_queries_passes() {
        let db = TestDatabase::new();
        assert_num_queries(&db, 2, || {
            db.query(&query()).unwrap();
            db.count(&query()).unwrap();
        });
    }

    #[test]
    fn test_assert_num_queries_zero() {
        let db = TestDatabase::new();
        assert_num_queries(&db, 0, || {});
    }

    #[test]
    #[should_panic(expected = "Expected 1 queries, but 2 were executed")]
    fn test_assert_num_queries_fails_too_many() {
        let db = TestDatabase::new();
        assert_num_queries(&db, 1, || {
            db.query(&query()).unwrap();
            db.query(&query()).unwrap();
        });
    }

    #[test]
    #[should_panic(expected = "Expected 3 queries, but 1 were executed")]
    fn test_assert_num_queries_fails_too_few() {
        let db = TestDatabase::new();
        assert_num_queries(&db, 3, || {
            db.query(&query()).unwrap();
        });
    }

    #[test]
    fn test_assert_max_queries_passes() {
        let db = TestDatabase::new();
        assert_max_queries(&db, 3, || {
            db.query(&query()).unwrap();
        });
    }

    #[test]
    #[should_panic(expected = "Expected at most 1 queries, but 2 were executed")]
    fn test_assert_max_queries_fails() {
        let db = TestDatabase::new();
        assert_max_queries(&db, 1, || {
            db.query(&query()).unwrap();
            db.count(&query()).unwrap();
        });
    }

    #[test]
    fn test_counter_resets_between_assertions() {
        let db = TestDatabase::new();
        assert_num_queries(&db, 1, || {
            db.query(&query()).unwrap();
        });
        assert_num_queries(&db, 1, || {
            db.count(&query()).unwrap();
        });
    }
}
