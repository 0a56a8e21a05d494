//! # easy-scoping
//!
//! Named, chainable query scopes and aggregates for model query sets.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `easy-scoping` for everything, or on the individual
//! crates for finer-grained control.
//!
//! ```ignore
//! use easy_scoping::prelude::*;
//!
//! let blue_small = objects.all().scope("blue")?.scope("small")?;
//! let everything_else = objects.all().scope("not_blue")?;
//! ```

/// Core types, settings, logging, and error types.
pub use easy_scoping_core as core;

/// Query-set layer: models, lookups, `QuerySet`, Manager, executors.
#[cfg(feature = "db")]
pub use easy_scoping_db as db;

/// The per-model scope registry and query set extension traits.
#[cfg(feature = "scopes")]
pub use easy_scoping_scopes as scopes;

/// Testing utilities.
#[cfg(feature = "testing")]
pub use easy_scoping_test as test;

// Third-party re-exports
pub use chrono;
pub use serde;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;

/// The types most programs need.
pub mod prelude {
    pub use easy_scoping_core::{EntryKind, ScopingError, ScopingResult, Settings, SETTINGS};

    #[cfg(feature = "db")]
    pub use easy_scoping_db::{
        AggregateFunc, DbExecutor, FieldDef, FieldType, FixtureLoader, Manager, MemoryDatabase,
        Model, ModelMeta, QuerySet, Row, Value, Q,
    };

    #[cfg(feature = "scopes")]
    pub use easy_scoping_scopes::{
        fields_scope, filter_scope, kwargs_scope, Dispatched, ScopeArgs, ScopeRegistry,
        ScopedModel, ScopedQuerySet,
    };
}
