//! Field type definitions.
//!
//! Each [`FieldType`] variant corresponds to a Django model field type, and
//! [`FieldDef`] captures the metadata the query layer needs about one field:
//! nullability, length limits and choices for validation, and the type used to
//! coerce JSON fixture data.

use easy_scoping_core::{ScopingError, ScopingResult, ValidationError};

use crate::value::Value;

/// The type of a model field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum FieldType {
    /// Auto-incrementing integer primary key.
    AutoField,
    /// Variable-length string with a max length.
    CharField,
    /// Unlimited-length text.
    TextField,
    /// 64-bit signed integer.
    IntegerField,
    /// 64-bit floating-point number.
    FloatField,
    /// Boolean (true/false).
    BooleanField,
    /// Date without time.
    DateField,
    /// Date and time.
    DateTimeField,
    /// JSON data.
    JsonField,
    /// Many-to-one relationship, stored as the target's integer key.
    ForeignKey {
        /// The target model label (e.g. "customers.customer").
        to: String,
    },
}

/// Definition of a model field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The attribute and column name of this field.
    pub name: &'static str,
    /// The type of this field.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed.
    pub null: bool,
    /// Default value used when a row omits this field.
    pub default: Option<Value>,
    /// Maximum character length (for `CharField`).
    pub max_length: Option<usize>,
    /// Allowed values as (value, display_label) pairs.
    pub choices: Option<Vec<(Value, String)>>,
}

impl FieldDef {
    /// Creates a new `FieldDef` with defaults (non-null, no choices).
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            primary_key: false,
            null: false,
            default: None,
            max_length: None,
            choices: None,
        }
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL values.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Sets the maximum character length.
    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets the default value for this field.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restricts this field to the given `(value, label)` choices.
    #[must_use]
    pub fn choices<V: Into<Value>>(mut self, choices: impl IntoIterator<Item = (V, &'static str)>) -> Self {
        self.choices = Some(
            choices
                .into_iter()
                .map(|(value, label)| (value.into(), label.to_string()))
                .collect(),
        );
        self
    }

    /// Returns `true` if this field represents a relational field.
    pub const fn is_relation(&self) -> bool {
        matches!(self.field_type, FieldType::ForeignKey { .. })
    }

    /// Checks a value against nullability, length, and choices.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if value.is_null() {
            if self.null || self.primary_key {
                return Ok(());
            }
            return Err(ValidationError::new(
                "This field cannot be null.",
                "null",
            ));
        }

        if let (Some(max), Some(s)) = (self.max_length, value.as_str()) {
            let len = s.chars().count();
            if len > max {
                return Err(ValidationError::new(
                    format!("Ensure this value has at most {max} characters (it has {len})."),
                    "max_length",
                )
                .with_param("limit_value", max.to_string()));
            }
        }

        if let Some(choices) = &self.choices {
            if !choices.iter().any(|(choice, _)| choice == value) {
                return Err(ValidationError::new(
                    format!("Value '{value}' is not a valid choice."),
                    "invalid_choice",
                )
                .with_param("value", value.to_string()));
            }
        }

        Ok(())
    }

    /// Converts a JSON fixture value into a [`Value`] of this field's type.
    pub fn coerce_json(&self, json: &serde_json::Value) -> ScopingResult<Value> {
        use serde_json::Value as Json;

        let mismatch = || {
            ScopingError::SerializationError(format!(
                "Field '{}' ({:?}) cannot take the value {json}",
                self.name, self.field_type
            ))
        };

        if json.is_null() {
            return Ok(Value::Null);
        }

        let value = match (&self.field_type, json) {
            (FieldType::JsonField, other) => Value::Json(other.clone()),
            (
                FieldType::AutoField | FieldType::IntegerField | FieldType::ForeignKey { .. },
                Json::Number(n),
            ) => Value::Int(n.as_i64().ok_or_else(mismatch)?),
            (FieldType::FloatField, Json::Number(n)) => Value::Float(n.as_f64().ok_or_else(mismatch)?),
            (FieldType::BooleanField, Json::Bool(b)) => Value::Bool(*b),
            (FieldType::CharField | FieldType::TextField, Json::String(s)) => Value::String(s.clone()),
            (FieldType::DateField, Json::String(s)) => Value::Date(
                chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| mismatch())?,
            ),
            (FieldType::DateTimeField, Json::String(s)) => Value::DateTime(
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                    .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
                    .map_err(|_| mismatch())?,
            ),
            _ => return Err(mismatch()),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_def_new_defaults() {
        let f = FieldDef::new("color", FieldType::CharField);
        assert_eq!(f.name, "color");
        assert!(!f.primary_key);
        assert!(!f.null);
        assert!(f.default.is_none());
        assert!(f.max_length.is_none());
        assert!(f.choices.is_none());
    }

    #[test]
    fn test_field_def_builder() {
        let f = FieldDef::new("size", FieldType::CharField)
            .max_length(12)
            .default("medium")
            .choices([("small", "Small"), ("medium", "Medium")]);
        assert_eq!(f.max_length, Some(12));
        assert_eq!(f.default, Some(Value::from("medium")));
        assert_eq!(f.choices.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_is_relation() {
        let fk = FieldDef::new(
            "customer",
            FieldType::ForeignKey {
                to: "customers.customer".into(),
            },
        );
        assert!(fk.is_relation());
        assert!(!FieldDef::new("color", FieldType::CharField).is_relation());
    }

    #[test]
    fn test_validate_null() {
        let f = FieldDef::new("color", FieldType::CharField);
        assert_eq!(f.validate(&Value::Null).unwrap_err().code, "null");
        assert!(f.clone().nullable().validate(&Value::Null).is_ok());
    }

    #[test]
    fn test_validate_max_length() {
        let f = FieldDef::new("color", FieldType::CharField).max_length(4);
        assert!(f.validate(&Value::from("blue")).is_ok());
        let err = f.validate(&Value::from("orange")).unwrap_err();
        assert_eq!(err.code, "max_length");
        assert_eq!(err.params.get("limit_value").unwrap(), "4");
    }

    #[test]
    fn test_validate_choices() {
        let f = FieldDef::new("color", FieldType::CharField).choices([("red", "Red")]);
        assert!(f.validate(&Value::from("red")).is_ok());
        assert_eq!(
            f.validate(&Value::from("mauve")).unwrap_err().code,
            "invalid_choice"
        );
    }

    #[test]
    fn test_coerce_json() {
        let date = FieldDef::new("used_on", FieldType::DateField);
        assert_eq!(
            date.coerce_json(&serde_json::json!("1999-12-31")).unwrap(),
            Value::Date(chrono::NaiveDate::from_ymd_opt(1999, 12, 31).unwrap())
        );
        assert!(date.coerce_json(&serde_json::json!("yesterday")).is_err());
        assert_eq!(date.coerce_json(&serde_json::Value::Null).unwrap(), Value::Null);

        let int = FieldDef::new("quantity", FieldType::IntegerField);
        assert_eq!(int.coerce_json(&serde_json::json!(3)).unwrap(), Value::Int(3));
        assert!(int.coerce_json(&serde_json::json!("3")).is_err());

        let dt = FieldDef::new("at", FieldType::DateTimeField);
        assert!(dt.coerce_json(&serde_json::json!("2018-07-13T19:37:00")).is_ok());
        assert!(dt.coerce_json(&serde_json::json!("2018-07-13 19:37:00")).is_ok());

        let json = FieldDef::new("meta", FieldType::JsonField);
        assert_eq!(
            json.coerce_json(&serde_json::json!({"k": 1})).unwrap(),
            Value::Json(serde_json::json!({"k": 1}))
        );
    }
}
