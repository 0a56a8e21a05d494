//! Scope arguments and helpers that turn them into filters.
//!
//! A scope may be called with positional values, keyword values, or both.
//! [`ScopeArgs::to_q`] binds positional values to a scope's declared fields in
//! order and combines everything into one conjunctive [`Q`].

use std::collections::HashSet;

use easy_scoping_core::{ScopingError, ScopingResult};
use easy_scoping_db::{Model, Value, Q};

use crate::registry::{scope_fn, ScopeFn};

/// Arguments passed to a scope or aggregate at dispatch time.
///
/// # Examples
///
/// ```
/// use easy_scoping_scopes::ScopeArgs;
///
/// let args = ScopeArgs::new().arg("blue").kwarg("size", "small");
/// let q = args.to_q(&["color"]).unwrap();
/// assert_eq!(q.fields(), vec!["color", "size"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeArgs {
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
}

impl ScopeArgs {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an argument list of positional values.
    pub fn positional<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            keywords: Vec::new(),
        }
    }

    /// Creates an argument list of keyword values.
    pub fn keywords<K: Into<String>, V: Into<Value>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            positional: Vec::new(),
            keywords: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Appends a positional value.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Appends a keyword value.
    #[must_use]
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.push((key.into(), value.into()));
        self
    }

    /// Returns the positional values.
    pub fn args(&self) -> &[Value] {
        &self.positional
    }

    /// Returns the keyword values in the order given.
    pub fn kwargs(&self) -> &[(String, Value)] {
        &self.keywords
    }

    /// Returns the keyword value for `key`, if given.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.keywords.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if no arguments were given.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    /// Builds the conjunction of every argument as a field filter.
    ///
    /// Positional values bind to `fields` in order. Keyword keys may carry a
    /// lookup suffix (`used_on__lte`). The result does not depend on keyword
    /// order.
    ///
    /// Fails with [`ScopingError::InvalidArguments`] when there are more
    /// positional values than fields, or when a key is given twice.
    pub fn to_q(&self, fields: &[&str]) -> ScopingResult<Q> {
        if self.positional.len() > fields.len() {
            return Err(ScopingError::InvalidArguments(format!(
                "takes {} positional argument(s) but {} were given",
                fields.len(),
                self.positional.len()
            )));
        }

        let mut seen = HashSet::new();
        let mut pairs = Vec::with_capacity(self.positional.len() + self.keywords.len());
        let bound = fields.iter().map(|f| (*f).to_string()).zip(self.positional.iter());
        for (key, value) in bound.chain(self.keywords.iter().map(|(k, v)| (k.clone(), v))) {
            if !seen.insert(key.clone()) {
                return Err(ScopingError::InvalidArguments(format!(
                    "got multiple values for argument '{key}'"
                )));
            }
            pairs.push((key, value.clone()));
        }
        Q::from_kwargs(pairs)
    }
}

/// Builds a scope that filters on fixed conditions and takes no arguments.
pub fn filter_scope<M: Model>(q: Q) -> ScopeFn<M> {
    scope_fn(move |qs, args| {
        if !args.is_empty() {
            return Err(ScopingError::InvalidArguments(
                "scope takes no arguments".to_string(),
            ));
        }
        Ok(qs.filter(q.clone()))
    })
}

/// Builds a scope whose arguments bind, positionally or by keyword, to the
/// given fields.
pub fn fields_scope<M: Model>(fields: &[&str]) -> ScopeFn<M> {
    let fields: Vec<String> = fields.iter().map(|f| (*f).to_string()).collect();
    scope_fn(move |qs, args| {
        let names: Vec<&str> = fields.iter().map(String::as_str).collect();
        Ok(qs.filter(args.to_q(&names)?))
    })
}

/// Builds a scope that filters by whatever keyword arguments it is given.
pub fn kwargs_scope<M: Model>() -> ScopeFn<M> {
    scope_fn(|qs, args| Ok(qs.filter(args.to_q(&[])?)))
}
