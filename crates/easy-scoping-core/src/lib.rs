//! # easy-scoping-core
//!
//! Core types, settings, and error types shared by every easy-scoping crate.
//! This crate has no framework dependencies and provides the foundation for the
//! ORM layer and the scope registry.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{EntryKind, ScopingError, ScopingResult, ValidationError};
pub use settings::{Settings, SETTINGS};
