#![forbid(unsafe_code)]

//! Store errors.
//!
//! Field validation failures are state, not errors: they live in
//! [`FieldState::error`](crate::FieldState::error). `StoreError` covers
//! misuse: addressing a form or field that was never configured, invalid
//! construction input, or reaching a store that is gone.

use std::fmt;

use formtable_core::{FieldPath, PathError};

/// Errors returned by store construction and store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No form with this id is configured.
    UnknownForm(String),
    /// The (form, field) pair is not configured.
    UnknownField {
        /// Form id as given by the caller.
        form: String,
        /// Field name as given by the caller.
        field: String,
    },
    /// A form id or field name is empty or contains the path separator.
    InvalidIdentifier(PathError),
    /// The same (form, field) pair was configured twice.
    DuplicateColumn(FieldPath),
    /// The store behind a context handle does not exist.
    MissingContext,
    /// The store is already borrowed, e.g. from inside one of its listeners.
    ContextBusy,
}

impl StoreError {
    pub(crate) fn unknown_field(form: &str, field: &str) -> Self {
        Self::UnknownField {
            form: form.to_string(),
            field: field.to_string(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownForm(form) => write!(f, "unknown form {form:?}"),
            Self::UnknownField { form, field } => {
                write!(f, "unknown field {field:?} in form {form:?}")
            }
            Self::InvalidIdentifier(err) => write!(f, "invalid identifier: {err}"),
            Self::DuplicateColumn(path) => write!(f, "column {path} is configured twice"),
            Self::MissingContext => {
                write!(f, "form store used outside of its provider (no store attached)")
            }
            Self::ContextBusy => write!(f, "form store is already borrowed"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidIdentifier(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PathError> for StoreError {
    fn from(err: PathError) -> Self {
        Self::InvalidIdentifier(err)
    }
}
