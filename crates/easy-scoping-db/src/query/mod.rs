//! Query building and evaluation.
//!
//! - [`lookups`] - Field lookups and [`Q`] filter objects
//! - [`ast`] - The [`Query`] AST, [`WhereNode`] and [`Row`]
//! - [`queryset`] - The lazy [`QuerySet`] and its [`Manager`]

pub mod ast;
pub mod lookups;
pub mod queryset;

pub use ast::{
    AggregateFunc, CompoundQuery, CompoundType, FromValue, OrderBy, Query, Row, WhereNode,
};
pub use lookups::{Lookup, Pattern, Q, LOOKUP_SEP};
pub use queryset::{Manager, QuerySet};
