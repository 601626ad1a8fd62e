#![forbid(unsafe_code)]

//! Core: field values, field paths, and column definitions.
//!
//! # Role in formtable
//! `formtable-core` holds the vocabulary shared by every other crate: the
//! closed [`FieldValue`] variant stored in each cell, the value-only
//! [`Record`] handed to validators and submit handlers, the canonical
//! [`FieldPath`] used for navigation, and the [`Column`] list a store is
//! configured from.
//!
//! Nothing here knows about validation, timers, or listeners.

pub mod column;
pub mod logging;
pub mod path;
pub mod value;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, trace};

pub use column::{Column, FieldKind, SelectOption};
pub use path::{FieldPath, PATH_SEPARATOR, PathError};
pub use value::{FieldValue, Record};
