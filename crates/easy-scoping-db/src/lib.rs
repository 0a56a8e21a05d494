//! # easy-scoping-db
//!
//! Query-set layer for easy-scoping. Provides the [`Model`](model::Model) trait,
//! the lazy [`QuerySet`](query::QuerySet) and its [`Manager`](query::Manager),
//! Django-style lookups and [`Q`](query::Q) objects, and an in-memory
//! [`DbExecutor`](executor::DbExecutor).
//!
//! ## Architecture
//!
//! A [`QuerySet`](query::QuerySet) builds a [`Query`](query::Query) AST through
//! method chaining without touching storage. The AST is only evaluated when a
//! terminal method (`.fetch()`, `.count()`, `.get()`, `.aggregate()`, ...) is
//! called, at which point the query set's executor interprets it.
//!
//! ## Module Overview
//!
//! - [`model`] - The [`Model`](model::Model) trait and [`ModelMeta`](model::ModelMeta)
//! - [`fields`] - Field definitions ([`FieldDef`](fields::FieldDef)) and types
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`query`] - Lookups, the query AST, and query sets
//! - [`executor`] - The [`DbExecutor`](executor::DbExecutor) trait and aggregates
//! - [`memory`] - The in-memory executor
//! - [`fixtures`] - Loading Django-format JSON fixtures

// These clippy lints are intentionally allowed for the query crate:
// - cast_precision_loss: counts are averaged as f64
// - result_large_err: ScopingError is shared by every crate
// - doc_markdown: backtick requirements for documentation items are too strict
// - needless_pass_by_value: Q objects are consumed the way Django's API reads
// - return_self_not_must_use: builder pattern methods are self-documenting
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::match_same_arms)]

pub mod executor;
pub mod fields;
pub mod fixtures;
pub mod memory;
pub mod model;
pub mod query;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use executor::{compute_aggregate, create_model, save_model, DbExecutor};
pub use fields::{FieldDef, FieldType};
pub use fixtures::FixtureLoader;
pub use memory::MemoryDatabase;
pub use model::{Model, ModelMeta};
pub use query::{
    AggregateFunc, CompoundQuery, CompoundType, FromValue, Lookup, Manager, OrderBy, Pattern,
    Query, QuerySet, Row, WhereNode, Q,
};
pub use value::Value;
