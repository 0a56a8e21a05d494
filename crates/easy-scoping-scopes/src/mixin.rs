//! Model and query-set extension traits.
//!
//! [`ScopedModel`] gives a model type its registry and model-level
//! registration. [`ScopedQuerySet`] lets any `QuerySet<M>` of such a model
//! apply registered scopes and aggregates by name.

use std::fmt;

use easy_scoping_core::ScopingResult;
use easy_scoping_db::{Model, QuerySet, Value};

use crate::args::ScopeArgs;
use crate::registry::{AggregateFn, Dispatched, ScopeFn, ScopeRegistry};

/// A model that owns a [`ScopeRegistry`].
///
/// Implementors usually keep the registry in a `static LazyLock` and register
/// their built-in scopes when it is first forced.
pub trait ScopedModel: Model {
    /// Returns this model's registry.
    fn scopes() -> &'static ScopeRegistry<Self>;

    /// Registers a scope on this model. See [`ScopeRegistry::register_scope`].
    fn register_scope<F>(name: &str, scope: F) -> ScopingResult<()>
    where
        F: Fn(QuerySet<Self>, &ScopeArgs) -> ScopingResult<QuerySet<Self>> + Send + Sync + 'static,
    {
        Self::scopes().register_scope(name, scope)
    }

    /// Registers an aggregate on this model. See [`ScopeRegistry::register_aggregate`].
    fn register_aggregate<F>(name: &str, aggregate: F) -> ScopingResult<()>
    where
        F: Fn(&QuerySet<Self>, &ScopeArgs) -> ScopingResult<Value> + Send + Sync + 'static,
    {
        Self::scopes().register_aggregate(name, aggregate)
    }

    /// Returns the scope registered under `name`.
    fn get_scope(name: &str) -> ScopingResult<ScopeFn<Self>> {
        Self::scopes().get_scope(name)
    }

    /// Returns the aggregate registered under `name`.
    fn get_aggregate(name: &str) -> ScopingResult<AggregateFn<Self>> {
        Self::scopes().get_aggregate(name)
    }
}

/// A scope captured together with the query set it will run on.
pub struct BoundScope<M: Model> {
    qs: QuerySet<M>,
    scope: ScopeFn<M>,
}

impl<M: Model> BoundScope<M> {
    /// Runs the scope without arguments.
    pub fn call(self) -> ScopingResult<QuerySet<M>> {
        self.call_with(&ScopeArgs::new())
    }

    /// Runs the scope with arguments.
    pub fn call_with(self, args: &ScopeArgs) -> ScopingResult<QuerySet<M>> {
        (self.scope)(self.qs, args)
    }
}

impl<M: Model> fmt::Debug for BoundScope<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundScope").field("qs", &self.qs).finish_non_exhaustive()
    }
}

/// An aggregate captured together with the query set it will run on.
pub struct BoundAggregate<M: Model> {
    qs: QuerySet<M>,
    aggregate: AggregateFn<M>,
}

impl<M: Model> BoundAggregate<M> {
    /// Runs the aggregate without arguments.
    pub fn call(&self) -> ScopingResult<Value> {
        self.call_with(&ScopeArgs::new())
    }

    /// Runs the aggregate with arguments.
    pub fn call_with(&self, args: &ScopeArgs) -> ScopingResult<Value> {
        (self.aggregate)(&self.qs, args)
    }
}

impl<M: Model> fmt::Debug for BoundAggregate<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAggregate").field("qs", &self.qs).finish_non_exhaustive()
    }
}

/// Named scopes and aggregates on a model's query sets.
///
/// ```ignore
/// let small_blue = objects.all().scope("blue")?.scope("small")?;
/// let others = objects.all().scope("not_blue")?;
/// let total = objects.all().run_aggregate("num_blue")?;
/// ```
pub trait ScopedQuerySet<M: ScopedModel>: Sized {
    /// Resolves `name` and applies it, whatever its kind.
    fn dispatch(self, name: &str, args: &ScopeArgs) -> ScopingResult<Dispatched<M>>;

    /// Applies a scope or negated scope without arguments.
    fn scope(self, name: &str) -> ScopingResult<QuerySet<M>> {
        self.scope_with(name, &ScopeArgs::new())
    }

    /// Applies a scope or negated scope with arguments.
    fn scope_with(self, name: &str, args: &ScopeArgs) -> ScopingResult<QuerySet<M>>;

    /// Runs an aggregate without arguments.
    fn run_aggregate(&self, name: &str) -> ScopingResult<Value> {
        self.run_aggregate_with(name, &ScopeArgs::new())
    }

    /// Runs an aggregate with arguments.
    fn run_aggregate_with(&self, name: &str, args: &ScopeArgs) -> ScopingResult<Value>;

    /// Returns the scope registered under `name`, bound to this query set.
    fn get_scope(&self, name: &str) -> ScopingResult<BoundScope<M>>;

    /// Returns the aggregate registered under `name`, bound to this query set.
    fn get_aggregate(&self, name: &str) -> ScopingResult<BoundAggregate<M>>;
}

impl<M: ScopedModel> ScopedQuerySet<M> for QuerySet<M> {
    fn dispatch(self, name: &str, args: &ScopeArgs) -> ScopingResult<Dispatched<M>> {
        M::scopes().dispatch(self, name, args)
    }

    fn scope_with(self, name: &str, args: &ScopeArgs) -> ScopingResult<QuerySet<M>> {
        M::scopes().apply_scope(self, name, args)
    }

    fn run_aggregate_with(&self, name: &str, args: &ScopeArgs) -> ScopingResult<Value> {
        M::scopes().run_aggregate(self, name, args)
    }

    fn get_scope(&self, name: &str) -> ScopingResult<BoundScope<M>> {
        Ok(BoundScope {
            qs: self.clone(),
            scope: M::get_scope(name)?,
        })
    }

    fn get_aggregate(&self, name: &str) -> ScopingResult<BoundAggregate<M>> {
        Ok(BoundAggregate {
            qs: self.clone(),
            aggregate: M::get_aggregate(name)?,
        })
    }
}
