//! Model trait and metadata.
//!
//! The [`Model`] trait is implemented by every type stored through the query
//! layer. It provides metadata, field values, and construction from rows.
//! [`ModelMeta`] captures the equivalent of Django's `class Meta` options.

use easy_scoping_core::{ScopingError, ScopingResult, ValidationError};
use std::collections::HashMap;

use crate::fields::FieldDef;
use crate::query::OrderBy;
use crate::value::Value;

pub use crate::query::Row;

/// The core trait for all models.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use easy_scoping_db::model::{Model, ModelMeta, Row};
/// use easy_scoping_db::fields::{FieldDef, FieldType};
/// use easy_scoping_db::value::Value;
/// use easy_scoping_core::ScopingResult;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Gadget {
///     id: i64,
///     name: String,
/// }
///
/// impl Model for Gadget {
///     fn meta() -> &'static ModelMeta {
///         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
///             ModelMeta::new("shop", "gadget").fields(vec![
///                 FieldDef::new("id", FieldType::AutoField).primary_key(),
///                 FieldDef::new("name", FieldType::CharField),
///             ])
///         });
///         &META
///     }
///
///     fn pk(&self) -> Option<Value> {
///         Some(Value::Int(self.id))
///     }
///
///     fn field_values(&self) -> Vec<(&'static str, Value)> {
///         vec![("id", Value::Int(self.id)), ("name", Value::from(self.name.as_str()))]
///     }
///
///     fn from_row(row: &Row) -> ScopingResult<Self> {
///         Ok(Self { id: row.get("id")?, name: row.get("name")? })
///     }
/// }
///
/// assert_eq!(Gadget::table_name(), "shop_gadget");
/// assert_eq!(Gadget::label(), "shop.gadget");
/// ```
pub trait Model: Send + Sync + Sized + 'static {
    /// Returns the static metadata for this model type.
    fn meta() -> &'static ModelMeta;

    /// Returns the table name.
    fn table_name() -> &'static str {
        &Self::meta().db_table
    }

    /// Returns the `app_label.model_name` label used in fixtures and errors.
    fn label() -> &'static str {
        &Self::meta().label
    }

    /// Returns the name of the primary key field.
    fn pk_field_name() -> &'static str {
        Self::meta().pk_field().map_or("id", |f| f.name)
    }

    /// Returns the primary key value, or `None` if unsaved.
    fn pk(&self) -> Option<Value>;

    /// Returns all field name-value pairs for this instance.
    fn field_values(&self) -> Vec<(&'static str, Value)>;

    /// Constructs a model instance from a row.
    fn from_row(row: &Row) -> ScopingResult<Self>;
}

/// Metadata about a model, equivalent to Django's `class Meta`.
#[derive(Debug, Clone)]
pub struct ModelMeta {
    /// The application label (e.g. "widgets").
    pub app_label: &'static str,
    /// The model name in lowercase (e.g. "widget").
    pub model_name: &'static str,
    /// `app_label.model_name`.
    pub label: String,
    /// The table name, `app_label_model_name` by default.
    pub db_table: String,
    /// Default ordering for queries.
    pub ordering: Vec<OrderBy>,
    /// Field definitions for this model.
    pub fields: Vec<FieldDef>,
}

impl ModelMeta {
    /// Creates metadata with the conventional label and table name.
    pub fn new(app_label: &'static str, model_name: &'static str) -> Self {
        Self {
            app_label,
            model_name,
            label: format!("{app_label}.{model_name}"),
            db_table: format!("{app_label}_{model_name}"),
            ordering: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Sets the field definitions.
    #[must_use]
    pub fn fields(mut self, fields: Vec<FieldDef>) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the default ordering.
    #[must_use]
    pub fn ordering(mut self, ordering: Vec<OrderBy>) -> Self {
        self.ordering = ordering;
        self
    }

    /// Overrides the table name.
    #[must_use]
    pub fn db_table(mut self, db_table: impl Into<String>) -> Self {
        self.db_table = db_table.into();
        self
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the primary key field, if one is declared.
    pub fn pk_field(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.primary_key)
    }

    /// Validates and completes a set of field values for insertion.
    ///
    /// Unknown fields are rejected, missing fields take their default (or
    /// `Null`), and every value is checked against its [`FieldDef`]. All field
    /// errors are collected before returning.
    pub fn clean(&self, values: Vec<(&'static str, Value)>) -> ScopingResult<Vec<(&'static str, Value)>> {
        let mut given: HashMap<&str, Value> = HashMap::new();
        for (name, value) in values {
            if self.field(name).is_none() {
                return Err(ScopingError::FieldError(format!(
                    "{} has no field named '{name}'",
                    self.label
                )));
            }
            given.insert(name, value);
        }

        let mut cleaned = Vec::with_capacity(self.fields.len());
        let mut errors: HashMap<String, Vec<ValidationError>> = HashMap::new();
        for field in &self.fields {
            let value = given
                .remove(field.name)
                .or_else(|| field.default.clone())
                .unwrap_or(Value::Null);
            if let Err(e) = field.validate(&value) {
                errors.entry(field.name.to_string()).or_default().push(e);
            }
            cleaned.push((field.name, value));
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(ValidationError::with_field_errors(errors).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldType;

    fn meta() -> ModelMeta {
        ModelMeta::new("widgets", "widget").fields(vec![
            FieldDef::new("id", FieldType::AutoField).primary_key(),
            FieldDef::new("color", FieldType::CharField).choices([("red", "Red"), ("blue", "Blue")]),
            FieldDef::new("size", FieldType::CharField).default("small"),
            FieldDef::new("used_on", FieldType::DateField).nullable(),
        ])
    }

    #[test]
    fn test_meta_names() {
        let m = meta();
        assert_eq!(m.label, "widgets.widget");
        assert_eq!(m.db_table, "widgets_widget");
        assert_eq!(m.pk_field().unwrap().name, "id");
        assert!(m.field("shape").is_none());
    }

    #[test]
    fn test_db_table_override() {
        let m = meta().db_table("widget");
        assert_eq!(m.db_table, "widget");
    }

    #[test]
    fn test_clean_fills_defaults() {
        let cleaned = meta().clean(vec![("color", Value::from("red"))]).unwrap();
        assert_eq!(
            cleaned,
            vec![
                ("id", Value::Null),
                ("color", Value::from("red")),
                ("size", Value::from("small")),
                ("used_on", Value::Null),
            ]
        );
    }

    #[test]
    fn test_clean_unknown_field() {
        let err = meta().clean(vec![("weight", Value::Int(3))]).unwrap_err();
        assert!(matches!(err, ScopingError::FieldError(_)));
    }

    #[test]
    fn test_clean_collects_field_errors() {
        let err = meta()
            .clean(vec![("color", Value::from("mauve")), ("size", Value::Null)])
            .unwrap_err();
        match err {
            ScopingError::ValidationError(v) => {
                assert!(v.field_errors.contains_key("color"));
                assert!(v.field_errors.contains_key("size"));
            }
            other => panic!("Expected ValidationError, got {other:?}"),
        }
    }
}
