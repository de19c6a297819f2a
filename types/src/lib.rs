//! Shared type definitions for sqlweave
//!
//! This crate provides the small vocabulary every other sqlweave crate agrees on:
//!
//! - [`Dialect`] - placeholder style of a rendered statement
//! - [`SQLType`] - the semantic type of a column
//! - [`EnumDef`] - a named, closed set of string variants
//!
//! # Features
//!
//! - `serde` - Enable serde serialization/deserialization

mod dialect;
mod enum_def;
mod sql_type;

pub use dialect::{Dialect, DialectParseError};
pub use enum_def::{EnumDef, EnumValueError};
pub use sql_type::SQLType;

/// Prelude module for commonly used types
pub mod prelude {
    pub use crate::{Dialect, EnumDef, SQLType};
}
