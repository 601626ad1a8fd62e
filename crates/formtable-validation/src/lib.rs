#![forbid(unsafe_code)]

//! Field validation for formtable stores.
//!
//! This crate provides:
//! - A core [`Validator`] trait and built-in validators over [`FieldValue`]
//!   (required, number, min/max, length, email, URL, one-of)
//! - Composable validators (`And`, `Or`, `Not`, `All`, `Any`)
//! - The [`FormSchema`] seam the store validates through, plus the
//!   rule-based [`ObjectSchema`]
//! - Token bookkeeping and a checksummable trace for asynchronous,
//!   per-field validation ([`AsyncValidationCoordinator`])
//!
//! # Example
//!
//! ```rust
//! use formtable_core::{FieldValue, Record};
//! use formtable_validation::{FieldRules, FormSchema, ObjectSchema};
//!
//! let schema = ObjectSchema::new().field(
//!     "price",
//!     FieldRules::new().required("Required").min(0.01, "Min 0.01"),
//! );
//!
//! let mut record = Record::new();
//! record.insert("price".into(), FieldValue::from(0));
//! assert!(schema.validate_field("price", &record).is_err());
//!
//! record.insert("price".into(), FieldValue::from(10.5));
//! assert!(schema.validate_field("price", &record).is_ok());
//! ```
//!
//! [`FieldValue`]: formtable_core::FieldValue

pub mod async_validation;
pub mod schema;
mod validators;

pub use async_validation::{
    AsyncValidationCoordinator, InFlightValidation, StaleReason, ValidationEvent,
    ValidationToken, ValidationTrace,
};
pub use schema::{
    DEFAULT_EMAIL_MESSAGE, DEFAULT_NUMBER_MESSAGE, DEFAULT_REQUIRED_MESSAGE, ERROR_CODE_TEST,
    FieldRules, FormSchema, ObjectSchema, SchemaError,
};
pub use validators::{
    // Composition
    All,
    And,
    Any,
    // Error codes
    ERROR_CODE_EMAIL,
    ERROR_CODE_MAX,
    ERROR_CODE_MAX_LENGTH,
    ERROR_CODE_MIN,
    ERROR_CODE_MIN_LENGTH,
    ERROR_CODE_ONE_OF,
    ERROR_CODE_PATTERN,
    ERROR_CODE_RANGE,
    ERROR_CODE_REQUIRED,
    ERROR_CODE_TYPE,
    ERROR_CODE_URL,
    // Built-in validators
    Email,
    IsNumber,
    Max,
    MaxLength,
    Min,
    MinLength,
    Not,
    OneOf,
    Or,
    Pattern,
    Range,
    Required,
    Url,
    // Core types
    ValidationError,
    ValidationResult,
    Validator,
    // Builder
    ValidatorBuilder,
};
