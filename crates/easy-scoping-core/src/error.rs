//! Core error types for easy-scoping.
//!
//! [`ScopingError`] covers registry errors (naming conflicts, unresolved
//! names), ORM errors raised by the query layer, validation errors, and the
//! configuration and IO errors of the ambient stack.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// The two kinds of entry a scope registry can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A named filter returning a new query set.
    Scope,
    /// A named computation returning a scalar.
    Aggregate,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scope => write!(f, "scope"),
            Self::Aggregate => write!(f, "aggregate"),
        }
    }
}

/// Represents a validation error with optional field-level errors.
///
/// # Examples
///
/// ```
/// use easy_scoping_core::error::ValidationError;
///
/// let err = ValidationError::new("This field cannot be null.", "null");
///
/// let mut field_errors = std::collections::HashMap::new();
/// field_errors.insert(
///     "color".to_string(),
///     vec![ValidationError::new("Value 'mauve' is not a valid choice.", "invalid_choice")],
/// );
/// let err = ValidationError::with_field_errors(field_errors);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failure (e.g. "null", "invalid_choice").
    pub code: String,
    /// Additional parameters providing context for the error message.
    pub params: HashMap<String, String>,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: HashMap::new(),
            field_errors,
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut fields: Vec<_> = self.field_errors.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            let mut first = true;
            for (field, errors) in fields {
                for error in errors {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The error type shared by all easy-scoping crates.
#[derive(Error, Debug)]
pub enum ScopingError {
    // ── Registry errors ──────────────────────────────────────────────

    /// A name was registered under one kind while already present under the other.
    #[error("Naming conflict on {model}: '{name}' is already a registered {existing}")]
    NameConflict {
        /// The model label (e.g. "widgets.widget").
        model: String,
        /// The conflicting name.
        name: String,
        /// The kind the name is already registered as.
        existing: EntryKind,
    },

    /// A dispatched name matched no scope, aggregate, or negated scope.
    #[error("'{model}' query set has no scope or aggregate named '{name}'")]
    UnresolvedName {
        /// The model label.
        model: String,
        /// The name that failed to resolve.
        name: String,
    },

    /// A name resolved, but to the wrong kind of entry for the call site.
    #[error("'{name}' is not registered with kind '{expected}'")]
    WrongEntryKind {
        /// The resolved name.
        name: String,
        /// The kind the caller asked for.
        expected: EntryKind,
    },

    /// A scope or aggregate name is not acceptable for registration.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Arguments passed to a scope do not fit its declared fields.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    // ── ORM errors ───────────────────────────────────────────────────

    /// A query expected exactly one result but found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// A query expected exactly one result but found multiple.
    #[error("Multiple objects returned when one expected: {0}")]
    MultipleObjectsReturned(String),

    /// A lookup referenced a field the model does not have.
    #[error("Field error: {0}")]
    FieldError(String),

    /// A generic database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScopingError {
    /// Returns `true` for the errors a registry lookup can produce for a name
    /// that is simply not there.
    pub const fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnresolvedName { .. })
    }

    /// Returns `true` for cross-registration conflicts.
    pub const fn is_name_conflict(&self) -> bool {
        matches!(self, Self::NameConflict { .. })
    }
}

impl From<ValidationError> for ScopingError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

impl From<serde_json::Error> for ScopingError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, ScopingError>`.
pub type ScopingResult<T> = Result<T, ScopingError>;
