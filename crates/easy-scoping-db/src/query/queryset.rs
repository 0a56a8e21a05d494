//! QuerySet and Manager for building and executing queries.
//!
//! A [`QuerySet`] is a lazy query bound to an executor. Builder methods edit
//! its [`Query`] AST and return a new query set; nothing runs until a terminal
//! method (`fetch`, `count`, `get`, `aggregate`, ...) is called. A
//! [`Manager`] is the entry point for a model, equivalent to Django's
//! `objects` manager.
//!
//! # Examples
//!
//! ```
//! use std::sync::{Arc, LazyLock};
//! use easy_scoping_db::fields::{FieldDef, FieldType};
//! use easy_scoping_db::memory::MemoryDatabase;
//! use easy_scoping_db::model::{Model, ModelMeta, Row};
//! use easy_scoping_db::query::{Manager, Q};
//! use easy_scoping_db::value::Value;
//! use easy_scoping_core::ScopingResult;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Gadget { id: i64, color: String }
//!
//! impl Model for Gadget {
//!     fn meta() -> &'static ModelMeta {
//!         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
//!             ModelMeta::new("shop", "gadget").fields(vec![
//!                 FieldDef::new("id", FieldType::AutoField).primary_key(),
//!                 FieldDef::new("color", FieldType::CharField),
//!             ])
//!         });
//!         &META
//!     }
//!     fn pk(&self) -> Option<Value> { Some(Value::Int(self.id)) }
//!     fn field_values(&self) -> Vec<(&'static str, Value)> {
//!         vec![("id", Value::Int(self.id)), ("color", Value::from(self.color.as_str()))]
//!     }
//!     fn from_row(row: &Row) -> ScopingResult<Self> {
//!         Ok(Self { id: row.get("id")?, color: row.get("color")? })
//!     }
//! }
//!
//! let objects = Manager::<Gadget>::new(Arc::new(MemoryDatabase::new()));
//! objects.create(vec![("color", Value::from("blue"))]).unwrap();
//! objects.create(vec![("color", Value::from("red"))]).unwrap();
//!
//! let blue = objects.filter(Q::from_kwarg("color", "blue"));
//! assert_eq!(blue.count().unwrap(), 1);
//! assert_eq!(objects.all().difference(blue).count().unwrap(), 1);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use easy_scoping_core::{ScopingError, ScopingResult};

use super::ast::{AggregateFunc, CompoundQuery, CompoundType, OrderBy, Query, WhereNode};
use super::lookups::Q;
use crate::executor::{create_model, DbExecutor};
use crate::model::Model;
use crate::value::Value;

/// The entry point for model-level query operations.
///
/// A manager holds the executor its query sets run against. It carries no
/// query state and is cheap to clone.
pub struct Manager<M: Model> {
    db: Arc<dyn DbExecutor>,
    _phantom: PhantomData<M>,
}

impl<M: Model> Clone for Manager<M> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            _phantom: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for Manager<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager").field("model", &M::label()).finish()
    }
}

impl<M: Model> Manager<M> {
    /// Creates a manager bound to an executor.
    pub fn new(db: Arc<dyn DbExecutor>) -> Self {
        Self {
            db,
            _phantom: PhantomData,
        }
    }

    /// Returns the executor.
    pub fn db(&self) -> &Arc<dyn DbExecutor> {
        &self.db
    }

    /// Returns a new `QuerySet` that matches every row.
    pub fn all(&self) -> QuerySet<M> {
        QuerySet::new(Arc::clone(&self.db))
    }

    /// Returns a new `QuerySet` with the given filter applied.
    pub fn filter(&self, q: Q) -> QuerySet<M> {
        self.all().filter(q)
    }

    /// Returns a new `QuerySet` with the given exclusion applied.
    pub fn exclude(&self, q: Q) -> QuerySet<M> {
        self.all().exclude(q)
    }

    /// Returns an empty `QuerySet`.
    pub fn none(&self) -> QuerySet<M> {
        self.all().none()
    }

    /// Returns the single instance matching `q`.
    pub fn get(&self, q: Q) -> ScopingResult<M> {
        self.filter(q).get()
    }

    /// Returns the number of stored instances.
    pub fn count(&self) -> ScopingResult<i64> {
        self.all().count()
    }

    /// Validates, inserts, and returns a new instance.
    pub fn create(&self, fields: Vec<(&'static str, Value)>) -> ScopingResult<M> {
        create_model(self.db.as_ref(), fields)
    }

    /// Removes every stored instance.
    pub fn truncate(&self) -> ScopingResult<()> {
        self.db.truncate(M::table_name())
    }
}

/// A lazy, composable query over one model.
///
/// All builder methods consume `self` and return a modified query set, so
/// chains read left to right and never alias state. Clone a query set to
/// reuse it in two chains.
pub struct QuerySet<M: Model> {
    query: Query,
    db: Arc<dyn DbExecutor>,
    model: PhantomData<M>,
}

impl<M: Model> Clone for QuerySet<M> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            db: Arc::clone(&self.db),
            model: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for QuerySet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("model", &M::label())
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl<M: Model> QuerySet<M> {
    /// Creates a query set over every row of the model's table.
    pub fn new(db: Arc<dyn DbExecutor>) -> Self {
        let mut query = Query::new(M::table_name(), M::pk_field_name());
        query.order_by.clone_from(&M::meta().ordering);
        Self {
            query,
            db,
            model: PhantomData,
        }
    }

    /// Returns a reference to the underlying query AST.
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Returns the executor this query set runs against.
    pub fn db(&self) -> &Arc<dyn DbExecutor> {
        &self.db
    }

    // ── Filtering methods (lazy) ─────────────────────────────────────

    /// Adds a filter condition.
    ///
    /// An empty `Q` leaves the query set unchanged.
    #[must_use]
    pub fn filter(mut self, q: Q) -> Self {
        if q.is_empty() {
            return self;
        }
        self.query = self.query.and_where(WhereNode::from_q(&q));
        self
    }

    /// Adds an exclusion condition (NOT).
    #[must_use]
    pub fn exclude(mut self, q: Q) -> Self {
        if q.is_empty() {
            return self;
        }
        self.query = self
            .query
            .and_where(WhereNode::Not(Box::new(WhereNode::from_q(&q))));
        self
    }

    /// Filters by `field__lookup = value` pairs. The order of the pairs does
    /// not affect the result.
    pub fn filter_kwargs<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> ScopingResult<Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        Ok(self.filter(Q::from_kwargs(pairs)?))
    }

    /// Returns all rows (identity operation for chaining).
    #[must_use]
    pub fn all(self) -> Self {
        self
    }

    /// Returns an empty query set.
    #[must_use]
    pub fn none(mut self) -> Self {
        self.query.is_none = true;
        self
    }

    /// Sets the ordering from Django-style field names (`"-field"` descends).
    #[must_use]
    pub fn order_by(mut self, fields: &[&str]) -> Self {
        self.query.order_by = fields.iter().map(|f| OrderBy::parse(f)).collect();
        self
    }

    /// Reverses the current ordering.
    #[must_use]
    pub fn reverse(mut self) -> Self {
        for order in &mut self.query.order_by {
            order.descending = !order.descending;
        }
        self
    }

    /// Sets the LIMIT.
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.query.limit = Some(n);
        self
    }

    /// Sets the OFFSET.
    #[must_use]
    pub fn offset(mut self, n: usize) -> Self {
        self.query.offset = Some(n);
        self
    }

    // ── Set operations (lazy) ────────────────────────────────────────

    fn combine(mut self, compound_type: CompoundType, other: Self) -> Self {
        // A sliced query set is combined as a whole, not re-sliced.
        if self.query.needs_nesting() {
            self.query = self.query.nested();
        }
        self.query.compound_queries.push(CompoundQuery {
            compound_type,
            other: Box::new(other.query),
        });
        self
    }

    /// Rows in either query set.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        self.combine(CompoundType::Union, other)
    }

    /// Rows in both query sets.
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        self.combine(CompoundType::Intersect, other)
    }

    /// Rows in this query set that are not in `other`.
    #[must_use]
    pub fn difference(self, other: Self) -> Self {
        self.combine(CompoundType::Except, other)
    }

    // ── Terminal methods ─────────────────────────────────────────────

    /// Runs the query and builds model instances.
    pub fn fetch(&self) -> ScopingResult<Vec<M>> {
        let rows = self.db.query(&self.query)?;
        tracing::debug!(model = M::label(), rows = rows.len(), "fetched query set");
        rows.iter().map(M::from_row).collect()
    }

    /// Returns the number of matching rows.
    pub fn count(&self) -> ScopingResult<i64> {
        self.db.count(&self.query)
    }

    /// Returns whether any row matches.
    pub fn exists(&self) -> ScopingResult<bool> {
        Ok(self.count()? > 0)
    }

    /// Returns the first matching instance, ordering by primary key when the
    /// query set has no ordering of its own.
    pub fn first(&self) -> ScopingResult<Option<M>> {
        let mut query = self.query.clone();
        if query.order_by.is_empty() {
            query.order_by.push(OrderBy::asc(M::pk_field_name()));
        }
        query.limit = Some(1);
        match self.db.query(&query)?.first() {
            Some(row) => M::from_row(row).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the single matching instance.
    ///
    /// Returns `DoesNotExist` if nothing matches and `MultipleObjectsReturned`
    /// if more than one row does.
    pub fn get(&self) -> ScopingResult<M> {
        let rows = self.db.query(&self.query)?;
        match rows.as_slice() {
            [] => Err(ScopingError::DoesNotExist(format!(
                "{} matching query does not exist.",
                M::label()
            ))),
            [row] => M::from_row(row),
            _ => Err(ScopingError::MultipleObjectsReturned(format!(
                "get() returned more than one {} -- it returned {}!",
                M::label(),
                rows.len()
            ))),
        }
    }

    /// Returns the primary keys of the matching rows, in query order.
    pub fn pks(&self) -> ScopingResult<Vec<Value>> {
        let pk = M::pk_field_name();
        Ok(self
            .db
            .query(&self.query)?
            .into_iter()
            .map(|row| row.get_value(pk).cloned().unwrap_or(Value::Null))
            .collect())
    }

    /// Computes an aggregate over one field of the matching rows.
    pub fn aggregate(&self, func: AggregateFunc, field: &str) -> ScopingResult<Value> {
        self.db.aggregate(&self.query, func, field)
    }
}
