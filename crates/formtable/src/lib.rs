#![forbid(unsafe_code)]

//! formtable public facade crate.
//!
//! Re-exports the types most hosts need from the internal crates and offers
//! a small prelude.
//!
//! # Example
//!
//! A trading row with a buy and a sell form whose columns interleave:
//!
//! ```rust
//! use formtable::prelude::*;
//!
//! let schema = || {
//!     ObjectSchema::new()
//!         .field("quantity", FieldRules::new().required("Required").min(1.0, "Min 1"))
//!         .field("price", FieldRules::new().required("Required").min(0.01, "Min 0.01"))
//! };
//!
//! let mut store = FormStore::builder()
//!     .columns([
//!         Column::new("buy", "quantity").with_kind(FieldKind::Number),
//!         Column::new("buy", "price").with_kind(FieldKind::Number),
//!         Column::new("sell", "quantity").with_kind(FieldKind::Number),
//!         Column::new("sell", "price").with_kind(FieldKind::Number),
//!     ])
//!     .schema("buy", schema())
//!     .schema("sell", schema())
//!     .initial_values("buy", record([("quantity", 100.into()), ("price", 10.5.into())]))
//!     .on_submit("buy", |form: &str, values: Record| println!("{form}: {values:?}"))
//!     .executor(InlineExecutor)
//!     .build()?;
//!
//! store.focus_field(FieldPath::parse("buy.price")?)?;
//! assert_eq!(store.submit(), SubmitOutcome::Submitted { form: "buy".into() });
//! # Ok::<(), formtable::Error>(())
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use formtable_core::{Column, FieldKind, FieldPath, FieldValue, PathError, Record, SelectOption};

// --- Validation re-exports -------------------------------------------------

pub use formtable_validation::{
    FieldRules, FormSchema, ObjectSchema, SchemaError, ValidationError, ValidationResult,
    Validator,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use formtable_runtime::{
    FieldState, FormKey, FormStore, FormStoreBuilder, FormsState, InlineExecutor, KeyOutcome,
    NavOutcome, NavigationState, QueuedExecutor, SharedFormStore, StoreConfig, StoreContext,
    StoreError, SubmitOutcome, Subscription, ThreadExecutor, ValidationExecutor, record,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for formtable hosts.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Store construction or a store operation failed.
    #[cfg(feature = "runtime")]
    Store(StoreError),
    /// A field path could not be parsed or built.
    Path(PathError),
    /// A schema could not run.
    Schema(SchemaError),
    /// A value failed a validator used outside the store.
    Validation(ValidationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "runtime")]
            Self::Store(err) => write!(f, "{err}"),
            Self::Path(err) => write!(f, "{err}"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "runtime")]
            Self::Store(err) => Some(err),
            Self::Path(err) => Some(err),
            Self::Schema(err) => Some(err),
            Self::Validation(err) => Some(err),
        }
    }
}

#[cfg(feature = "runtime")]
impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<PathError> for Error {
    fn from(err: PathError) -> Self {
        Self::Path(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

/// Standard result type for formtable APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Column, Error, FieldKind, FieldPath, FieldRules, FieldValue, ObjectSchema, Record, Result,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{
        FormKey, FormStore, InlineExecutor, KeyOutcome, NavOutcome, StoreConfig, SubmitOutcome,
        record,
    };

    pub use crate::{core, validation};
    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use formtable_core as core;
#[cfg(feature = "runtime")]
pub use formtable_runtime as runtime;
pub use formtable_validation as validation;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn errors_convert_and_keep_source() {
        let err: Error = PathError::Empty.into();
        assert!(matches!(err, Error::Path(PathError::Empty)));
        assert!(err.source().is_some());

        let err: Error = SchemaError::Internal("offline".into()).into();
        assert!(err.to_string().contains("offline"));
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn store_errors_convert() {
        let err: Error = StoreError::UnknownForm("hold".into()).into();
        assert_eq!(err.to_string(), "unknown form \"hold\"");
        assert_eq!(err, Error::Store(StoreError::UnknownForm("hold".into())));
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn prelude_builds_a_store() {
        use crate::prelude::*;

        let store = FormStore::builder()
            .column(Column::new("buy", "quantity"))
            .executor(InlineExecutor)
            .build()
            .map_err(Error::from);
        assert!(store.is_ok());
    }
}
