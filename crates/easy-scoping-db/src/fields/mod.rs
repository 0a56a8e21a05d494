//! Field definitions for models.
//!
//! [`FieldDef`] and [`FieldType`] describe model fields. The query layer uses
//! them to validate new rows and to coerce fixture data into [`Value`](crate::value::Value)s.

pub mod types;

pub use types::{FieldDef, FieldType};
