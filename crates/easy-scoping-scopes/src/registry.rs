//! The per-model scope registry.
//!
//! A [`ScopeRegistry`] maps names to tagged entries: a scope (a function from
//! a query set to a narrower query set) or an aggregate (a function from a
//! query set to a scalar [`Value`]). Both kinds share one map, so a name can
//! never be registered as both.
//!
//! Lookups go through [`ScopeRegistry::resolve`], which tries, in order:
//!
//! 1. the exact name as a scope
//! 2. the exact name as an aggregate
//! 3. the name without the negation prefix (`not_` by default) as a scope,
//!    yielding its complement
//!
//! Negated names are never stored; the complement is computed at dispatch as
//! the input query set minus the scope applied to it.
//!
//! # Examples
//!
//! ```
//! use std::sync::{Arc, LazyLock};
//! use easy_scoping_core::ScopingResult;
//! use easy_scoping_db::fields::{FieldDef, FieldType};
//! use easy_scoping_db::model::{Model, ModelMeta, Row};
//! use easy_scoping_db::{Manager, MemoryDatabase, Value, Q};
//! use easy_scoping_scopes::{ScopeArgs, ScopeRegistry};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Lamp { id: i64, lit: bool }
//!
//! impl Model for Lamp {
//!     fn meta() -> &'static ModelMeta {
//!         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
//!             ModelMeta::new("home", "lamp").fields(vec![
//!                 FieldDef::new("id", FieldType::AutoField).primary_key(),
//!                 FieldDef::new("lit", FieldType::BooleanField),
//!             ])
//!         });
//!         &META
//!     }
//!     fn pk(&self) -> Option<Value> { Some(Value::Int(self.id)) }
//!     fn field_values(&self) -> Vec<(&'static str, Value)> {
//!         vec![("id", Value::Int(self.id)), ("lit", Value::Bool(self.lit))]
//!     }
//!     fn from_row(row: &Row) -> ScopingResult<Self> {
//!         Ok(Self { id: row.get("id")?, lit: row.get("lit")? })
//!     }
//! }
//!
//! let objects = Manager::<Lamp>::new(Arc::new(MemoryDatabase::new()));
//! for lit in [true, false, false] {
//!     objects.create(vec![("lit", Value::Bool(lit))]).unwrap();
//! }
//!
//! let registry = ScopeRegistry::<Lamp>::new();
//! registry.register_scope("lit", |qs, _| Ok(qs.filter(Q::from_kwarg("lit", true)))).unwrap();
//!
//! let args = ScopeArgs::new();
//! let dark = registry.apply_scope(objects.all(), "not_lit", &args).unwrap();
//! assert_eq!(dark.count().unwrap(), 2);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use easy_scoping_core::logging::dispatch_span;
use easy_scoping_core::settings::DEFAULT_NEGATION_PREFIX;
use easy_scoping_core::{EntryKind, ScopingError, ScopingResult, Settings};
use easy_scoping_db::{Model, QuerySet, Value};

use crate::args::ScopeArgs;

/// A registered scope: narrows a query set.
pub type ScopeFn<M> =
    Arc<dyn Fn(QuerySet<M>, &ScopeArgs) -> ScopingResult<QuerySet<M>> + Send + Sync>;

/// A registered aggregate: computes a scalar from a query set.
pub type AggregateFn<M> = Arc<dyn Fn(&QuerySet<M>, &ScopeArgs) -> ScopingResult<Value> + Send + Sync>;

/// Wraps a closure as a [`ScopeFn`].
pub fn scope_fn<M, F>(f: F) -> ScopeFn<M>
where
    M: Model,
    F: Fn(QuerySet<M>, &ScopeArgs) -> ScopingResult<QuerySet<M>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a closure as an [`AggregateFn`].
pub fn aggregate_fn<M, F>(f: F) -> AggregateFn<M>
where
    M: Model,
    F: Fn(&QuerySet<M>, &ScopeArgs) -> ScopingResult<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A stored registry entry.
pub enum Entry<M: Model> {
    /// A named filter.
    Scope(ScopeFn<M>),
    /// A named scalar computation.
    Aggregate(AggregateFn<M>),
}

impl<M: Model> Entry<M> {
    /// Returns which kind of entry this is.
    pub const fn kind(&self) -> EntryKind {
        match self {
            Self::Scope(_) => EntryKind::Scope,
            Self::Aggregate(_) => EntryKind::Aggregate,
        }
    }
}

impl<M: Model> Clone for Entry<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Scope(f) => Self::Scope(Arc::clone(f)),
            Self::Aggregate(f) => Self::Aggregate(Arc::clone(f)),
        }
    }
}

impl<M: Model> fmt::Debug for Entry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entry::{:?}", self.kind())
    }
}

/// The outcome of resolving a name.
pub enum Resolved<M: Model> {
    /// The name is a registered scope.
    Scope(ScopeFn<M>),
    /// The name is a registered aggregate.
    Aggregate(AggregateFn<M>),
    /// The name is the negation of a registered scope.
    Negated(ScopeFn<M>),
}

impl<M: Model> fmt::Debug for Resolved<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scope(_) => write!(f, "Resolved::Scope"),
            Self::Aggregate(_) => write!(f, "Resolved::Aggregate"),
            Self::Negated(_) => write!(f, "Resolved::Negated"),
        }
    }
}

/// The result of dispatching a name on a query set.
pub enum Dispatched<M: Model> {
    /// A scope (or negated scope) ran and produced a new query set.
    QuerySet(QuerySet<M>),
    /// An aggregate ran and produced a scalar.
    Scalar(Value),
}

impl<M: Model> fmt::Debug for Dispatched<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuerySet(qs) => f.debug_tuple("QuerySet").field(qs).finish(),
            Self::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
        }
    }
}

impl<M: Model> Dispatched<M> {
    /// Returns the query set, if a scope ran.
    pub fn into_queryset(self) -> Option<QuerySet<M>> {
        match self {
            Self::QuerySet(qs) => Some(qs),
            Self::Scalar(_) => None,
        }
    }

    /// Returns the scalar, if an aggregate ran.
    pub fn into_scalar(self) -> Option<Value> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::QuerySet(_) => None,
        }
    }
}

/// Named scopes and aggregates for one model type.
///
/// Registration and lookup take `&self`; entries live behind an `RwLock` so a
/// registry can sit in a `static` and be extended at any time. The lock is
/// released before any registered function runs, so scopes may dispatch other
/// scopes on the same registry.
pub struct ScopeRegistry<M: Model> {
    entries: RwLock<HashMap<String, Entry<M>>>,
    negation_prefix: String,
}

impl<M: Model> Default for ScopeRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> fmt::Debug for ScopeRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeRegistry")
            .field("model", &M::label())
            .field("negation_prefix", &self.negation_prefix)
            .field("scopes", &self.scope_names())
            .field("aggregates", &self.aggregate_names())
            .finish()
    }
}

impl<M: Model> ScopeRegistry<M> {
    /// Creates an empty registry using the default `not_` negation prefix.
    pub fn new() -> Self {
        Self::with_negation_prefix(DEFAULT_NEGATION_PREFIX)
    }

    /// Creates an empty registry with a custom negation prefix.
    pub fn with_negation_prefix(prefix: impl Into<String>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            negation_prefix: prefix.into(),
        }
    }

    /// Creates an empty registry configured from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_negation_prefix(settings.negation_prefix.clone())
    }

    /// Returns the prefix that marks a negated scope name.
    pub fn negation_prefix(&self) -> &str {
        &self.negation_prefix
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Registers a scope, replacing any scope already under `name`.
    ///
    /// Fails with [`ScopingError::NameConflict`] if `name` is an aggregate.
    pub fn register_scope<F>(&self, name: &str, scope: F) -> ScopingResult<()>
    where
        F: Fn(QuerySet<M>, &ScopeArgs) -> ScopingResult<QuerySet<M>> + Send + Sync + 'static,
    {
        self.insert(name, Entry::Scope(Arc::new(scope)))
    }

    /// Registers an already-shared scope function.
    pub fn register_scope_fn(&self, name: &str, scope: ScopeFn<M>) -> ScopingResult<()> {
        self.insert(name, Entry::Scope(scope))
    }

    /// Registers an aggregate, replacing any aggregate already under `name`.
    ///
    /// Fails with [`ScopingError::NameConflict`] if `name` is a scope.
    pub fn register_aggregate<F>(&self, name: &str, aggregate: F) -> ScopingResult<()>
    where
        F: Fn(&QuerySet<M>, &ScopeArgs) -> ScopingResult<Value> + Send + Sync + 'static,
    {
        self.insert(name, Entry::Aggregate(Arc::new(aggregate)))
    }

    /// Registers an already-shared aggregate function.
    pub fn register_aggregate_fn(&self, name: &str, aggregate: AggregateFn<M>) -> ScopingResult<()> {
        self.insert(name, Entry::Aggregate(aggregate))
    }

    fn insert(&self, name: &str, entry: Entry<M>) -> ScopingResult<()> {
        if name.trim().is_empty() {
            return Err(ScopingError::InvalidName(format!(
                "{} {} names must not be empty",
                M::label(),
                entry.kind()
            )));
        }

        let kind = entry.kind();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get(name).map(Entry::kind) {
            Some(existing) if existing != kind => {
                return Err(ScopingError::NameConflict {
                    model: M::label().to_string(),
                    name: name.to_string(),
                    existing,
                });
            }
            Some(_) => {
                tracing::warn!(model = M::label(), name, %kind, "overwriting registered {kind}");
            }
            None => {
                tracing::debug!(model = M::label(), name, %kind, "registered {kind}");
            }
        }
        entries.insert(name.to_string(), entry);
        Ok(())
    }

    /// Removes an entry, returning the kind it was registered as.
    pub fn unregister(&self, name: &str) -> Option<EntryKind> {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .map(|entry| entry.kind());
        if let Some(kind) = removed {
            tracing::debug!(model = M::label(), name, %kind, "unregistered {kind}");
        }
        removed
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    // ── Lookup ───────────────────────────────────────────────────────

    fn entry(&self, name: &str) -> Option<Entry<M>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn unresolved(name: &str) -> ScopingError {
        ScopingError::UnresolvedName {
            model: M::label().to_string(),
            name: name.to_string(),
        }
    }

    /// Returns the scope registered under exactly `name`.
    pub fn get_scope(&self, name: &str) -> ScopingResult<ScopeFn<M>> {
        match self.entry(name) {
            Some(Entry::Scope(scope)) => Ok(scope),
            _ => Err(Self::unresolved(name)),
        }
    }

    /// Returns the aggregate registered under exactly `name`.
    pub fn get_aggregate(&self, name: &str) -> ScopingResult<AggregateFn<M>> {
        match self.entry(name) {
            Some(Entry::Aggregate(aggregate)) => Ok(aggregate),
            _ => Err(Self::unresolved(name)),
        }
    }

    /// Resolves a dispatched name to a scope, aggregate, or negated scope.
    pub fn resolve(&self, name: &str) -> ScopingResult<Resolved<M>> {
        match self.entry(name) {
            Some(Entry::Scope(scope)) => return Ok(Resolved::Scope(scope)),
            Some(Entry::Aggregate(aggregate)) => return Ok(Resolved::Aggregate(aggregate)),
            None => {}
        }
        if let Some(base) = name.strip_prefix(self.negation_prefix.as_str()) {
            if let Some(Entry::Scope(scope)) = self.entry(base) {
                return Ok(Resolved::Negated(scope));
            }
        }
        Err(Self::unresolved(name))
    }

    /// Returns `true` if `name` is stored as either kind.
    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    fn names_where(&self, keep: impl Fn(EntryKind) -> bool) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, entry)| keep(entry.kind()))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Returns every stored name, sorted.
    pub fn names(&self) -> Vec<String> {
        self.names_where(|_| true)
    }

    /// Returns the stored scope names, sorted.
    pub fn scope_names(&self) -> Vec<String> {
        self.names_where(|kind| kind == EntryKind::Scope)
    }

    /// Returns the stored aggregate names, sorted.
    pub fn aggregate_names(&self) -> Vec<String> {
        self.names_where(|kind| kind == EntryKind::Aggregate)
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Resolves `name` and applies it to `qs`.
    pub fn dispatch(
        &self,
        qs: QuerySet<M>,
        name: &str,
        args: &ScopeArgs,
    ) -> ScopingResult<Dispatched<M>> {
        let span = dispatch_span(M::label(), name);
        let _guard = span.enter();
        match self.resolve(name)? {
            Resolved::Scope(scope) => run_scope(&scope, false, qs, args).map(Dispatched::QuerySet),
            Resolved::Negated(scope) => run_scope(&scope, true, qs, args).map(Dispatched::QuerySet),
            Resolved::Aggregate(aggregate) => {
                tracing::trace!("running aggregate");
                aggregate(&qs, args).map(Dispatched::Scalar)
            }
        }
    }

    /// Applies a scope or negated scope. Aggregate names fail with
    /// [`ScopingError::WrongEntryKind`].
    pub fn apply_scope(
        &self,
        qs: QuerySet<M>,
        name: &str,
        args: &ScopeArgs,
    ) -> ScopingResult<QuerySet<M>> {
        let span = dispatch_span(M::label(), name);
        let _guard = span.enter();
        match self.resolve(name)? {
            Resolved::Scope(scope) => run_scope(&scope, false, qs, args),
            Resolved::Negated(scope) => run_scope(&scope, true, qs, args),
            Resolved::Aggregate(_) => Err(ScopingError::WrongEntryKind {
                name: name.to_string(),
                expected: EntryKind::Scope,
            }),
        }
    }

    /// Runs an aggregate. Scope names fail with [`ScopingError::WrongEntryKind`].
    pub fn run_aggregate(
        &self,
        qs: &QuerySet<M>,
        name: &str,
        args: &ScopeArgs,
    ) -> ScopingResult<Value> {
        let span = dispatch_span(M::label(), name);
        let _guard = span.enter();
        match self.resolve(name)? {
            Resolved::Aggregate(aggregate) => aggregate(qs, args),
            Resolved::Scope(_) | Resolved::Negated(_) => Err(ScopingError::WrongEntryKind {
                name: name.to_string(),
                expected: EntryKind::Aggregate,
            }),
        }
    }
}

fn run_scope<M: Model>(
    scope: &ScopeFn<M>,
    negated: bool,
    qs: QuerySet<M>,
    args: &ScopeArgs,
) -> ScopingResult<QuerySet<M>> {
    if negated {
        tracing::trace!("applying negated scope");
        let matched = scope(qs.clone(), args)?;
        Ok(qs.difference(matched))
    } else {
        tracing::trace!("applying scope");
        scope(qs, args)
    }
}
