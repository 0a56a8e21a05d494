//! # easy-scoping-scopes
//!
//! Named, composable query scopes and aggregates for models.
//!
//! A model registers scopes (functions narrowing a query set) and aggregates
//! (functions computing a scalar from a query set) in its [`ScopeRegistry`].
//! Query sets then apply them by name through [`ScopedQuerySet`]. Any scope
//! `name` is also reachable as `not_name`, which yields the query set minus
//! the rows the scope matches.
//!
//! ## Modules
//!
//! - [`registry`] - The registry, its entry types, and dispatch
//! - [`args`] - Scope arguments and field-binding scope builders
//! - [`mixin`] - [`ScopedModel`] and [`ScopedQuerySet`]

#![allow(clippy::result_large_err)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::needless_pass_by_value)]

pub mod args;
pub mod mixin;
pub mod registry;

pub use args::{fields_scope, filter_scope, kwargs_scope, ScopeArgs};
pub use mixin::{BoundAggregate, BoundScope, ScopedModel, ScopedQuerySet};
pub use registry::{
    aggregate_fn, scope_fn, AggregateFn, Dispatched, Entry, Resolved, ScopeFn, ScopeRegistry,
};
