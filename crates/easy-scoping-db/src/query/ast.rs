//! The lazy query AST and the row type executors return.
//!
//! A [`QuerySet`](super::QuerySet) only ever edits a [`Query`]; executors
//! interpret it when a terminal method runs.

use easy_scoping_core::{ScopingError, ScopingResult};

use super::lookups::{Lookup, Q};
use crate::value::Value;

/// An ORDER BY clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The column name.
    pub column: String,
    /// Whether to sort descending.
    pub descending: bool,
}

impl OrderBy {
    /// Creates an ascending ORDER BY clause.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// Creates a descending ORDER BY clause.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    /// Parses Django's `"-field"` shorthand.
    pub fn parse(spec: &str) -> Self {
        spec.strip_prefix('-')
            .map_or_else(|| Self::asc(spec), Self::desc)
    }
}

/// A WHERE clause tree, built from [`Q`] objects.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereNode {
    /// A single column condition.
    Condition {
        /// The column name.
        column: String,
        /// The lookup to apply.
        lookup: Lookup,
    },
    /// All children must match.
    And(Vec<WhereNode>),
    /// At least one child must match.
    Or(Vec<WhereNode>),
    /// The child must not match.
    Not(Box<WhereNode>),
}

impl WhereNode {
    /// Converts a Q object into a WhereNode tree.
    pub fn from_q(q: &Q) -> Self {
        match q {
            Q::Filter { field, lookup } => Self::Condition {
                column: field.clone(),
                lookup: lookup.clone(),
            },
            Q::And(children) => Self::And(children.iter().map(Self::from_q).collect()),
            Q::Or(children) => Self::Or(children.iter().map(Self::from_q).collect()),
            Q::Not(inner) => Self::Not(Box::new(Self::from_q(inner))),
        }
    }

    /// Evaluates this clause against a row.
    ///
    /// An empty AND matches everything and an empty OR matches nothing.
    /// Unknown columns are a [`ScopingError::FieldError`].
    pub fn matches(&self, row: &Row) -> ScopingResult<bool> {
        match self {
            Self::Condition { column, lookup } => {
                let value = row.get_value(column).ok_or_else(|| {
                    ScopingError::FieldError(format!(
                        "Cannot resolve keyword '{column}' into field. Choices are: {}",
                        row.columns().join(", ")
                    ))
                })?;
                lookup.matches(value)
            }
            Self::And(children) => {
                for child in children {
                    if !child.matches(row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(children) => {
                for child in children {
                    if child.matches(row)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not(inner) => Ok(!inner.matches(row)?),
        }
    }
}

/// How a compound query combines with the query it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundType {
    /// Rows in either query.
    Union,
    /// Rows in both queries.
    Intersect,
    /// Rows in this query but not the other.
    Except,
}

/// A set operation with another query over the same table.
#[derive(Debug, Clone)]
pub struct CompoundQuery {
    /// The set operation.
    pub compound_type: CompoundType,
    /// The other query.
    pub other: Box<Query>,
}

/// Aggregate functions computed over a column of a query's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    /// Number of non-null values (or rows, for `"*"`).
    Count,
    /// Sum of numeric values.
    Sum,
    /// Mean of numeric values.
    Avg,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
}

/// The complete query AST.
///
/// Rows come from the table, or from `source` when the query wraps another
/// one. The WHERE clause is applied to those rows, then compound queries are
/// combined by primary key, then ordering, offset and limit are applied.
#[derive(Debug, Clone)]
pub struct Query {
    /// The table name.
    pub table: String,
    /// The primary key column, used to identify rows in set operations.
    pub pk: String,
    /// A query whose result replaces the table as the row source.
    pub source: Option<Box<Query>>,
    /// WHERE clause.
    pub where_clause: Option<WhereNode>,
    /// Set operations applied after the WHERE clause.
    pub compound_queries: Vec<CompoundQuery>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// LIMIT.
    pub limit: Option<usize>,
    /// OFFSET.
    pub offset: Option<usize>,
    /// Whether the query matches nothing.
    pub is_none: bool,
}

impl Query {
    /// Creates a new query over the given table.
    pub fn new(table: impl Into<String>, pk: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            pk: pk.into(),
            source: None,
            where_clause: None,
            compound_queries: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            is_none: false,
        }
    }

    /// Wraps this query so it becomes the row source of a fresh query.
    ///
    /// Used before filtering a query that has compound parts or a slice, so
    /// that the new filter applies to the combined result.
    pub fn nested(self) -> Self {
        Self {
            table: self.table.clone(),
            pk: self.pk.clone(),
            source: Some(Box::new(self)),
            ..Self::new("", "")
        }
    }

    /// Returns `true` if adding a WHERE condition would be applied before
    /// parts of this query that must see it.
    pub fn needs_nesting(&self) -> bool {
        !self.compound_queries.is_empty() || self.limit.is_some() || self.offset.is_some()
    }

    /// ANDs a condition onto the WHERE clause, nesting first if required.
    #[must_use]
    pub fn and_where(self, node: WhereNode) -> Self {
        let mut query = if self.needs_nesting() { self.nested() } else { self };
        query.where_clause = Some(match query.where_clause.take() {
            Some(WhereNode::And(mut children)) => {
                children.push(node);
                WhereNode::And(children)
            }
            Some(existing) => WhereNode::And(vec![existing, node]),
            None => node,
        });
        query
    }
}

/// A row passed between executors and models.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Creates a row from `(column, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        let (columns, values) = pairs
            .into_iter()
            .map(|(c, v)| (c.to_string(), v))
            .unzip();
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a typed value by column name.
    pub fn get<T: FromValue>(&self, column: &str) -> ScopingResult<T> {
        let value = self.get_value(column).ok_or_else(|| {
            ScopingError::DatabaseError(format!("Column '{column}' not found in row"))
        })?;
        T::from_value(value)
    }

    /// Returns a reference to the raw Value at the given column name.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Sets a column, appending it if the row does not have it.
    pub fn set(&mut self, column: &str, value: Value) {
        match self.columns.iter().position(|c| c == column) {
            Some(idx) => self.values[idx] = value,
            None => {
                self.columns.push(column.to_string());
                self.values.push(value);
            }
        }
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> ScopingResult<Self>;
}

fn type_error(expected: &str, value: &Value) -> ScopingError {
    ScopingError::DatabaseError(format!("Expected {expected}, got {value:?}"))
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> ScopingResult<Self> {
        value.as_int().ok_or_else(|| type_error("Int", value))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> ScopingResult<Self> {
        value.as_float().ok_or_else(|| type_error("Float", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> ScopingResult<Self> {
        value.as_bool().ok_or_else(|| type_error("Bool", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> ScopingResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| type_error("String", value))
    }
}

impl FromValue for chrono::NaiveDate {
    fn from_value(value: &Value) -> ScopingResult<Self> {
        match value {
            Value::Date(d) => Ok(*d),
            _ => Err(type_error("Date", value)),
        }
    }
}

impl FromValue for chrono::NaiveDateTime {
    fn from_value(value: &Value) -> ScopingResult<Self> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            _ => Err(type_error("DateTime", value)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> ScopingResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> ScopingResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget_row(color: &str, size: &str) -> Row {
        Row::from_pairs([
            ("id", Value::Int(1)),
            ("color", Value::from(color)),
            ("size", Value::from(size)),
            ("used_on", Value::Null),
        ])
    }

    #[test]
    fn test_order_by_parse() {
        assert_eq!(OrderBy::parse("color"), OrderBy::asc("color"));
        assert_eq!(OrderBy::parse("-color"), OrderBy::desc("color"));
    }

    #[test]
    fn test_row_get() {
        let row = widget_row("blue", "small");
        assert_eq!(row.get::<i64>("id").unwrap(), 1);
        assert_eq!(row.get::<String>("color").unwrap(), "blue");
        assert_eq!(row.get::<Option<chrono::NaiveDate>>("used_on").unwrap(), None);
        assert!(row.get::<i64>("color").is_err());
        assert!(row.get::<i64>("missing").is_err());
        assert_eq!(row.len(), 4);
        assert!(!row.is_empty());
    }

    #[test]
    fn test_row_set() {
        let mut row = widget_row("blue", "small");
        row.set("color", Value::from("red"));
        row.set("shape", Value::from("star"));
        assert_eq!(row.get::<String>("color").unwrap(), "red");
        assert_eq!(row.columns().last().unwrap(), "shape");
    }

    #[test]
    #[should_panic(expected = "column count")]
    fn test_row_new_mismatch_panics() {
        let _ = Row::new(vec!["a".into()], vec![]);
    }

    #[test]
    fn test_where_matches() {
        let row = widget_row("blue", "small");
        let node = WhereNode::from_q(&(Q::from_kwarg("color", "blue") & Q::from_kwarg("size", "small")));
        assert!(node.matches(&row).unwrap());

        let node = WhereNode::from_q(&!Q::from_kwarg("color", "blue"));
        assert!(!node.matches(&row).unwrap());

        let node = WhereNode::from_q(&(Q::from_kwarg("color", "red") | Q::from_kwarg("size", "small")));
        assert!(node.matches(&row).unwrap());

        assert!(WhereNode::And(vec![]).matches(&row).unwrap());
        assert!(!WhereNode::Or(vec![]).matches(&row).unwrap());
    }

    #[test]
    fn test_where_unknown_column() {
        let row = widget_row("blue", "small");
        let node = WhereNode::from_q(&Q::from_kwarg("weight", 3));
        let err = node.matches(&row).unwrap_err();
        assert!(matches!(err, ScopingError::FieldError(_)));
        assert!(err.to_string().contains("weight"));
    }

    #[test]
    fn test_and_where_flattens() {
        let query = Query::new("widgets_widget", "id")
            .and_where(WhereNode::from_q(&Q::from_kwarg("color", "blue")))
            .and_where(WhereNode::from_q(&Q::from_kwarg("size", "small")))
            .and_where(WhereNode::from_q(&Q::from_kwarg("shape", "circle")));
        match query.where_clause {
            Some(WhereNode::And(children)) => assert_eq!(children.len(), 3),
            other => panic!("Expected And, got {other:?}"),
        }
        assert!(query.source.is_none());
    }

    #[test]
    fn test_and_where_nests_after_compound() {
        let mut query = Query::new("widgets_widget", "id");
        query.compound_queries.push(CompoundQuery {
            compound_type: CompoundType::Union,
            other: Box::new(Query::new("widgets_widget", "id")),
        });
        let query = query.and_where(WhereNode::from_q(&Q::from_kwarg("color", "blue")));
        assert!(query.compound_queries.is_empty());
        assert_eq!(query.table, "widgets_widget");
        assert_eq!(query.source.as_ref().unwrap().compound_queries.len(), 1);
    }
}
