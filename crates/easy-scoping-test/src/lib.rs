//! # easy-scoping-test
//!
//! Testing utilities for easy-scoping. Provides a query-counting
//! [`TestDatabase`](test_database::TestDatabase), assertions comparing query
//! sets without regard to order, and query-count assertions for catching
//! accidental extra evaluations.

pub mod assert_queries;
pub mod assertions;
pub mod test_database;

pub use assert_queries::{assert_max_queries, assert_num_queries};
pub use assertions::{assert_queryset_equal, assert_queryset_not_equal};
pub use test_database::TestDatabase;
