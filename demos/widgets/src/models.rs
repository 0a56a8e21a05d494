//! Demo models: `Widget`, `Customer` and `Purchase`.
//!
//! `Widget` and `Purchase` each own a scope registry, filled with their
//! built-in scopes the first time it is used.

use std::sync::{Arc, LazyLock};

use chrono::NaiveDate;
use easy_scoping_core::{ScopingError, ScopingResult, SETTINGS};
use easy_scoping_db::fields::{FieldDef, FieldType};
use easy_scoping_db::model::{Model, ModelMeta, Row};
use easy_scoping_db::{AggregateFunc, DbExecutor, Manager, OrderBy, Value, Q};
use easy_scoping_scopes::{fields_scope, filter_scope, kwargs_scope, ScopeRegistry, ScopedModel};

use crate::options::{COLORS, SHAPES, SIZES};

/// A colored, sized and shaped widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    /// Primary key.
    pub id: i64,
    /// One of [`COLORS`].
    pub color: String,
    /// One of [`SIZES`].
    pub size: String,
    /// One of [`SHAPES`].
    pub shape: String,
    /// The day the widget was last used, if ever.
    pub used_on: Option<NaiveDate>,
}

impl Widget {
    /// Returns the widget manager for `db`.
    pub fn objects(db: &Arc<dyn DbExecutor>) -> Manager<Self> {
        Manager::new(Arc::clone(db))
    }
}

impl Model for Widget {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("widgets", "widget")
                .fields(vec![
                    FieldDef::new("id", FieldType::AutoField).primary_key(),
                    FieldDef::new("color", FieldType::CharField)
                        .max_length(30)
                        .choices(COLORS.iter().copied()),
                    FieldDef::new("size", FieldType::CharField)
                        .max_length(30)
                        .choices(SIZES.iter().copied()),
                    FieldDef::new("shape", FieldType::CharField)
                        .max_length(30)
                        .choices(SHAPES.iter().copied()),
                    FieldDef::new("used_on", FieldType::DateField).nullable(),
                ])
                .ordering(vec![OrderBy::asc("id")])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        Some(Value::Int(self.id))
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Int(self.id)),
            ("color", Value::from(self.color.as_str())),
            ("size", Value::from(self.size.as_str())),
            ("shape", Value::from(self.shape.as_str())),
            ("used_on", Value::from(self.used_on)),
        ]
    }

    fn from_row(row: &Row) -> ScopingResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            color: row.get("color")?,
            size: row.get("size")?,
            shape: row.get("shape")?,
            used_on: row.get("used_on")?,
        })
    }
}

fn y2k() -> ScopingResult<NaiveDate> {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .ok_or_else(|| ScopingError::ConfigurationError("invalid cutoff date".to_string()))
}

/// Registers the built-in widget scopes and aggregates on `registry`.
pub fn register_widget_scopes(registry: &ScopeRegistry<Widget>) -> ScopingResult<()> {
    registry.register_scope_fn("blue", filter_scope(Q::from_kwarg("color", "blue")))?;
    registry.register_scope_fn("small", filter_scope(Q::from_kwarg("size", "small")))?;
    registry.register_scope_fn("circle", filter_scope(Q::from_kwarg("shape", "circle")))?;
    registry.register_scope_fn(
        "basic_query_widget",
        filter_scope(Q::from_kwargs([
            ("color", "blue"),
            ("size", "small"),
            ("shape", "circle"),
        ])?),
    )?;

    let cutoff = y2k()?;
    registry.register_scope_fn("before_y2k", filter_scope(Q::try_from_kwarg("used_on__lte", cutoff)?))?;
    registry.register_scope_fn("after_y2k", filter_scope(Q::try_from_kwarg("used_on__gte", cutoff)?))?;

    registry.register_scope_fn("take_kwargs", kwargs_scope())?;
    registry.register_scope_fn("take_args", fields_scope(&["color"]))?;
    registry.register_scope_fn("take_more_args", fields_scope(&["color", "size"]))?;

    registry.register_aggregate("num_blue", |qs, _| {
        qs.clone()
            .filter(Q::from_kwarg("color", "blue"))
            .aggregate(AggregateFunc::Count, "id")
    })?;
    Ok(())
}

/// Builds a registry from the global settings and fills it with `register`.
///
/// # Panics
///
/// Panics if `register` fails. The built-in names are fixed, so a failure
/// here is a programming error rather than bad input.
fn builtin_registry<M: Model>(
    register: fn(&ScopeRegistry<M>) -> ScopingResult<()>,
) -> ScopeRegistry<M> {
    let registry = ScopeRegistry::from_settings(SETTINGS.get_or_default());
    if let Err(e) = register(&registry) {
        tracing::error!(model = M::label(), "failed to register built-in scopes: {e}");
        panic!("built-in scopes for {} failed to register: {e}", M::label());
    }
    registry
}

impl ScopedModel for Widget {
    fn scopes() -> &'static ScopeRegistry<Self> {
        static SCOPES: LazyLock<ScopeRegistry<Widget>> =
            LazyLock::new(|| builtin_registry(register_widget_scopes));
        &SCOPES
    }
}

/// A customer who buys widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl Customer {
    pub fn objects(db: &Arc<dyn DbExecutor>) -> Manager<Self> {
        Manager::new(Arc::clone(db))
    }
}

impl Model for Customer {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("customers", "customer").fields(vec![
                FieldDef::new("id", FieldType::AutoField).primary_key(),
                FieldDef::new("name", FieldType::CharField).max_length(100),
                FieldDef::new("email", FieldType::CharField).max_length(254),
            ])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        Some(Value::Int(self.id))
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Int(self.id)),
            ("name", Value::from(self.name.as_str())),
            ("email", Value::from(self.email.as_str())),
        ]
    }

    fn from_row(row: &Row) -> ScopingResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
        })
    }
}

/// One purchase of a widget by a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub id: i64,
    /// Key of the purchased [`Widget`].
    pub widget: i64,
    /// Key of the buying [`Customer`].
    pub customer: i64,
    pub quantity: i64,
    pub purchased_on: NaiveDate,
}

impl Purchase {
    pub fn objects(db: &Arc<dyn DbExecutor>) -> Manager<Self> {
        Manager::new(Arc::clone(db))
    }
}

impl Model for Purchase {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("purchases", "purchase")
                .fields(vec![
                    FieldDef::new("id", FieldType::AutoField).primary_key(),
                    FieldDef::new(
                        "widget",
                        FieldType::ForeignKey {
                            to: "widgets.widget".to_string(),
                        },
                    ),
                    FieldDef::new(
                        "customer",
                        FieldType::ForeignKey {
                            to: "customers.customer".to_string(),
                        },
                    ),
                    FieldDef::new("quantity", FieldType::IntegerField).default(1),
                    FieldDef::new("purchased_on", FieldType::DateField),
                ])
                .ordering(vec![OrderBy::desc("purchased_on")])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        Some(Value::Int(self.id))
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Int(self.id)),
            ("widget", Value::Int(self.widget)),
            ("customer", Value::Int(self.customer)),
            ("quantity", Value::Int(self.quantity)),
            ("purchased_on", Value::Date(self.purchased_on)),
        ]
    }

    fn from_row(row: &Row) -> ScopingResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            widget: row.get("widget")?,
            customer: row.get("customer")?,
            quantity: row.get("quantity")?,
            purchased_on: row.get("purchased_on")?,
        })
    }
}

/// Registers the built-in purchase scopes and aggregates on `registry`.
pub fn register_purchase_scopes(registry: &ScopeRegistry<Purchase>) -> ScopingResult<()> {
    registry.register_scope_fn("bulk", filter_scope(Q::from_kwarg("quantity__gte", 10)))?;
    registry.register_scope_fn("by_customer", fields_scope(&["customer"]))?;
    registry.register_scope_fn("for_widget", fields_scope(&["widget"]))?;
    registry.register_aggregate("units", |qs, _| qs.aggregate(AggregateFunc::Sum, "quantity"))?;
    Ok(())
}

impl ScopedModel for Purchase {
    fn scopes() -> &'static ScopeRegistry<Self> {
        static SCOPES: LazyLock<ScopeRegistry<Purchase>> =
            LazyLock::new(|| builtin_registry(register_purchase_scopes));
        &SCOPES
    }
}
