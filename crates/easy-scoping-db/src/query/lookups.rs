//! Query lookups and Q objects for building complex filters.
//!
//! [`Lookup`] is a field-level comparison and [`Q`] combines filters with AND,
//! OR, and NOT. [`Q::from_kwarg`] parses Django-style keyword filters such as
//! `used_on__lte`.
//!
//! # Examples
//!
//! ```
//! use easy_scoping_db::query::lookups::{Q, Lookup};
//! use easy_scoping_db::value::Value;
//!
//! // color = "blue"
//! let q = Q::filter("color", Lookup::Exact(Value::from("blue")));
//!
//! // color = "blue" AND size = "small"
//! let both = q & Q::from_kwarg("size", "small");
//!
//! // NOT(shape = "circle")
//! let negated = !Q::from_kwarg("shape", "circle");
//! ```

use easy_scoping_core::{ScopingError, ScopingResult};
use regex::RegexBuilder;
use std::cmp::Ordering;
use std::fmt;
use std::ops;

use crate::value::Value;

/// The separator between a field name and a lookup name in keyword filters.
pub const LOOKUP_SEP: &str = "__";

/// A field-level lookup operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Exact match (`field = value`).
    Exact(Value),
    /// Case-insensitive exact match.
    IExact(Value),
    /// Substring match.
    Contains(String),
    /// Case-insensitive substring match.
    IContains(String),
    /// Membership test.
    In(Vec<Value>),
    /// Greater than.
    Gt(Value),
    /// Greater than or equal.
    Gte(Value),
    /// Less than.
    Lt(Value),
    /// Less than or equal.
    Lte(Value),
    /// Starts with.
    StartsWith(String),
    /// Case-insensitive starts with.
    IStartsWith(String),
    /// Ends with.
    EndsWith(String),
    /// Case-insensitive ends with.
    IEndsWith(String),
    /// Inclusive range test.
    Range(Value, Value),
    /// NULL test (`true` for IS NULL, `false` for IS NOT NULL).
    IsNull(bool),
    /// Regular expression match.
    Regex(Pattern),
    /// Case-insensitive regular expression match.
    IRegex(Pattern),
}

/// A regular expression compiled once, when its lookup is built.
#[derive(Clone)]
pub struct Pattern(regex::Regex);

impl Pattern {
    /// Compiles `pattern`, failing with `InvalidArguments` if it is malformed.
    pub fn new(pattern: &str, case_insensitive: bool) -> ScopingResult<Self> {
        RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map(Self)
            .map_err(|e| ScopingError::InvalidArguments(format!("Invalid regex '{pattern}': {e}")))
    }

    /// The source text of the pattern.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether `text` contains a match.
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl Lookup {
    /// Builds a lookup from its keyword name (`"lte"`, `"in"`, ...) and operand.
    ///
    /// Returns `None` for names that are not lookups, so that the caller can
    /// treat the whole keyword as a field name.
    pub fn from_name(name: &str, value: Value) -> Option<ScopingResult<Self>> {
        let text = |value: &Value| value.as_str().map_or_else(|| value.to_string(), str::to_string);
        let lookup = match name {
            "exact" => Self::Exact(value),
            "iexact" => Self::IExact(value),
            "contains" => Self::Contains(text(&value)),
            "icontains" => Self::IContains(text(&value)),
            "startswith" => Self::StartsWith(text(&value)),
            "istartswith" => Self::IStartsWith(text(&value)),
            "endswith" => Self::EndsWith(text(&value)),
            "iendswith" => Self::IEndsWith(text(&value)),
            "regex" => match Pattern::new(&text(&value), false) {
                Ok(pattern) => Self::Regex(pattern),
                Err(e) => return Some(Err(e)),
            },
            "iregex" => match Pattern::new(&text(&value), true) {
                Ok(pattern) => Self::IRegex(pattern),
                Err(e) => return Some(Err(e)),
            },
            "gt" => Self::Gt(value),
            "gte" => Self::Gte(value),
            "lt" => Self::Lt(value),
            "lte" => Self::Lte(value),
            "isnull" => match value {
                Value::Bool(b) => Self::IsNull(b),
                other => {
                    return Some(Err(ScopingError::InvalidArguments(format!(
                        "isnull expects a boolean, got {other}"
                    ))))
                }
            },
            "in" => match value {
                Value::List(items) => Self::In(items),
                other => {
                    return Some(Err(ScopingError::InvalidArguments(format!(
                        "in expects a list, got {other}"
                    ))))
                }
            },
            "range" => {
                let pair = match value {
                    Value::List(items) => <[Value; 2]>::try_from(items).map_err(Value::List),
                    other => Err(other),
                };
                match pair {
                    Ok([low, high]) => Self::Range(low, high),
                    Err(other) => {
                        return Some(Err(ScopingError::InvalidArguments(format!(
                            "range expects a list of two values, got {other}"
                        ))))
                    }
                }
            }
            _ => return None,
        };
        Some(Ok(lookup))
    }

    /// Evaluates this lookup against a stored value.
    ///
    /// Comparisons involving `Null` are false; only `IsNull` matches it.
    pub fn matches(&self, stored: &Value) -> ScopingResult<bool> {
        if stored.is_null() {
            return Ok(matches!(self, Self::IsNull(true)));
        }
        let ordered = |operand: &Value, accept: fn(Ordering) -> bool| {
            stored.compare(operand).is_some_and(accept)
        };
        let text = stored.as_str().map_or_else(|| stored.to_string(), str::to_string);

        let result = match self {
            Self::Exact(v) => stored.loosely_equals(v),
            Self::IExact(v) => match (stored.as_str(), v.as_str()) {
                (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
                _ => stored.loosely_equals(v),
            },
            Self::Contains(s) => text.contains(s.as_str()),
            Self::IContains(s) => text.to_lowercase().contains(&s.to_lowercase()),
            Self::In(values) => values.iter().any(|v| stored.loosely_equals(v)),
            Self::Gt(v) => ordered(v, Ordering::is_gt),
            Self::Gte(v) => ordered(v, Ordering::is_ge),
            Self::Lt(v) => ordered(v, Ordering::is_lt),
            Self::Lte(v) => ordered(v, Ordering::is_le),
            Self::StartsWith(s) => text.starts_with(s.as_str()),
            Self::IStartsWith(s) => text.to_lowercase().starts_with(&s.to_lowercase()),
            Self::EndsWith(s) => text.ends_with(s.as_str()),
            Self::IEndsWith(s) => text.to_lowercase().ends_with(&s.to_lowercase()),
            Self::Range(low, high) => ordered(low, Ordering::is_ge) && ordered(high, Ordering::is_le),
            Self::IsNull(is_null) => !is_null,
            Self::Regex(pattern) | Self::IRegex(pattern) => pattern.is_match(&text),
        };
        Ok(result)
    }
}

/// A composable query filter, equivalent to Django's `Q` object.
#[derive(Debug, Clone, PartialEq)]
pub enum Q {
    /// A single field lookup.
    Filter {
        /// The field name.
        field: String,
        /// The lookup operation.
        lookup: Lookup,
    },
    /// Logical AND of multiple conditions.
    And(Vec<Q>),
    /// Logical OR of multiple conditions.
    Or(Vec<Q>),
    /// Logical negation of a condition.
    Not(Box<Q>),
}

impl Q {
    /// Creates a new filter Q object.
    pub fn filter(field: impl Into<String>, lookup: Lookup) -> Self {
        Self::Filter {
            field: field.into(),
            lookup,
        }
    }

    /// Builds a filter from a keyword such as `color` or `used_on__lte`.
    ///
    /// A trailing `__<lookup>` selects the lookup; without one the filter is
    /// an exact match. Meant for filters written in code; keywords that come
    /// from callers go through [`Q::try_from_kwarg`] or [`Q::from_kwargs`].
    ///
    /// # Panics
    ///
    /// Panics if the lookup cannot take the operand, such as `isnull` with a
    /// non-boolean or `regex` with a malformed pattern.
    pub fn from_kwarg(key: &str, value: impl Into<Value>) -> Self {
        match Self::try_from_kwarg(key, value) {
            Ok(q) => q,
            Err(e) => panic!("invalid filter `{key}`: {e}"),
        }
    }

    /// Fallible form of [`Q::from_kwarg`].
    pub fn try_from_kwarg(key: &str, value: impl Into<Value>) -> ScopingResult<Self> {
        let value = value.into();
        if let Some((field, name)) = key.rsplit_once(LOOKUP_SEP) {
            if let Some(lookup) = Lookup::from_name(name, value.clone()) {
                return Ok(Self::filter(field, lookup?));
            }
        }
        Ok(Self::filter(key, Lookup::Exact(value)))
    }

    /// Builds the conjunction of several keyword filters.
    ///
    /// The result does not depend on the order of `pairs`: filters are sorted
    /// by key before being combined.
    pub fn from_kwargs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> ScopingResult<Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut pairs: Vec<(String, Value)> = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.into()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let children = pairs
            .into_iter()
            .map(|(k, v)| Self::try_from_kwarg(&k, v))
            .collect::<ScopingResult<Vec<_>>>()?;
        Ok(Self::And(children))
    }

    /// Returns `true` if this is an empty AND or OR.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.is_empty(),
            _ => false,
        }
    }

    /// Returns the field names this filter references.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Filter { field, .. } => vec![field.as_str()],
            Self::And(children) | Self::Or(children) => {
                children.iter().flat_map(Self::fields).collect()
            }
            Self::Not(inner) => inner.fields(),
        }
    }
}

impl ops::BitAnd for Q {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl ops::BitOr for Q {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::Not for Q {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}
