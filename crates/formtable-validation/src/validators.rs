#![forbid(unsafe_code)]

//! Core validation types and built-in validators over [`FieldValue`].
//!
//! Every built-in treats `Null` as "not my concern" except [`Required`], so
//! rules compose the way schema libraries usually do: `required` decides
//! presence, the other rules only look at values that are there.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use formtable_core::FieldValue;

// ---------------------------------------------------------------------------
// Error Codes
// ---------------------------------------------------------------------------

/// Error code for required field validation.
pub const ERROR_CODE_REQUIRED: &str = "required";
/// Error code for a value of the wrong type (e.g. text in a number column).
pub const ERROR_CODE_TYPE: &str = "type";
/// Error code for minimum length validation.
pub const ERROR_CODE_MIN_LENGTH: &str = "too_short";
/// Error code for maximum length validation.
pub const ERROR_CODE_MAX_LENGTH: &str = "too_long";
/// Error code for pattern validation.
pub const ERROR_CODE_PATTERN: &str = "pattern";
/// Error code for email validation.
pub const ERROR_CODE_EMAIL: &str = "email";
/// Error code for URL validation.
pub const ERROR_CODE_URL: &str = "url";
/// Error code for numeric lower bound validation.
pub const ERROR_CODE_MIN: &str = "min";
/// Error code for numeric upper bound validation.
pub const ERROR_CODE_MAX: &str = "max";
/// Error code for range validation.
pub const ERROR_CODE_RANGE: &str = "range";
/// Error code for membership validation.
pub const ERROR_CODE_ONE_OF: &str = "one_of";

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// A validation error with code, message, and interpolation parameters.
///
/// The `code` field is a stable identifier for programmatic handling.
/// The `message` field is a human-readable template; `{key}` placeholders
/// are filled from `params` by [`format_message`](Self::format_message).
///
/// # Example
///
/// ```rust
/// use formtable_validation::ValidationError;
///
/// let error = ValidationError::new("too_short", "Min {min} chars").with_param("min", 2);
/// assert_eq!(error.format_message(), "Min 2 chars");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Stable error code.
    pub code: &'static str,
    /// Human-readable error message template.
    pub message: String,
    /// Parameters for message interpolation.
    pub params: HashMap<String, String>,
}

impl ValidationError {
    /// Create a new validation error with the given code and message.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            params: HashMap::new(),
        }
    }

    /// Add a parameter for message interpolation.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Format the message with parameter substitution.
    #[must_use]
    pub fn format_message(&self) -> String {
        let mut result = self.message.clone();
        for (key, value) in &self.params {
            result = result.replace(&format!("{{{key}}}"), value);
        }
        result
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_message())
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

/// The result of a validation operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationResult {
    /// The value is valid.
    #[default]
    Valid,
    /// The value is invalid with an error.
    Invalid(ValidationError),
}

impl ValidationResult {
    /// Returns `true` if the result is `Valid`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns `true` if the result is `Invalid`.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Returns the error if the result is `Invalid`, otherwise `None`.
    #[must_use]
    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Self::Valid => None,
            Self::Invalid(e) => Some(e),
        }
    }

    /// Returns the formatted error message if the result is `Invalid`.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error().map(ValidationError::format_message)
    }

    /// Combine two results, returning the first error if any.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::Valid => other,
            Self::Invalid(_) => self,
        }
    }

    /// Convert into a `Result`, for `?` in schema code.
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Validator Trait
// ---------------------------------------------------------------------------

/// A trait for validating values of type `T`.
///
/// Validators are composable and can be combined using `And`, `Or`, and `Not`.
///
/// # Implementing a Custom Validator
///
/// ```rust
/// use formtable_core::FieldValue;
/// use formtable_validation::{ValidationError, ValidationResult, Validator};
///
/// struct Even;
///
/// impl Validator<FieldValue> for Even {
///     fn validate(&self, value: &FieldValue) -> ValidationResult {
///         match value.as_f64() {
///             Some(n) if n % 2.0 != 0.0 => {
///                 ValidationResult::Invalid(ValidationError::new("even", "Must be even"))
///             }
///             _ => ValidationResult::Valid,
///         }
///     }
///
///     fn error_message(&self) -> &str {
///         "Must be even"
///     }
/// }
///
/// assert!(Even.validate(&FieldValue::from(3)).is_invalid());
/// ```
pub trait Validator<T: ?Sized>: Send + Sync {
    /// Validate the given value.
    fn validate(&self, value: &T) -> ValidationResult;

    /// Return the default error message for this validator.
    fn error_message(&self) -> &str;
}

fn fail(code: &'static str, message: &str) -> ValidationResult {
    ValidationResult::Invalid(ValidationError::new(code, message))
}

// ---------------------------------------------------------------------------
// Built-in Validators
// ---------------------------------------------------------------------------

/// Rejects `Null` and blank text.
///
/// By default, whitespace-only text counts as blank.
#[derive(Debug, Clone, Default)]
pub struct Required {
    /// If `true`, whitespace-only text is accepted.
    pub allow_whitespace: bool,
    message: Option<String>,
}

impl Required {
    /// Create a new `Required` validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow whitespace-only text to pass validation.
    #[must_use]
    pub fn allow_whitespace(mut self) -> Self {
        self.allow_whitespace = true;
        self
    }

    /// Replace the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator<FieldValue> for Required {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        let missing = match value {
            FieldValue::Null => true,
            FieldValue::Text(s) if self.allow_whitespace => s.is_empty(),
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Bool(_) | FieldValue::Number(_) => false,
        };
        if missing {
            fail(ERROR_CODE_REQUIRED, self.error_message())
        } else {
            ValidationResult::Valid
        }
    }

    fn error_message(&self) -> &str {
        self.message.as_deref().unwrap_or("This field is required")
    }
}

/// Rejects non-numeric values (text that did not parse, booleans).
#[derive(Debug, Clone, Default)]
pub struct IsNumber {
    message: Option<String>,
}

impl IsNumber {
    /// Create a new `IsNumber` validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator<FieldValue> for IsNumber {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        match value {
            FieldValue::Null | FieldValue::Number(_) => ValidationResult::Valid,
            FieldValue::Text(s) if s.trim().is_empty() => ValidationResult::Valid,
            FieldValue::Text(_) | FieldValue::Bool(_) => fail(ERROR_CODE_TYPE, self.error_message()),
        }
    }

    fn error_message(&self) -> &str {
        self.message.as_deref().unwrap_or("Must be a number")
    }
}

/// Text must have at least `min` characters.
#[derive(Debug, Clone)]
pub struct MinLength {
    /// Minimum number of characters required.
    pub min: usize,
    message: Option<String>,
}

impl MinLength {
    /// Create a new `MinLength` validator.
    #[must_use]
    pub fn new(min: usize) -> Self {
        Self { min, message: None }
    }

    /// Replace the error message (`{min}` and `{actual}` are interpolated).
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator<FieldValue> for MinLength {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        let Some(text) = value.as_str() else {
            return ValidationResult::Valid;
        };
        let len = text.chars().count();
        if len < self.min {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MIN_LENGTH, self.error_message())
                    .with_param("min", self.min)
                    .with_param("actual", len),
            )
        } else {
            ValidationResult::Valid
        }
    }

    fn error_message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or("Must be at least {min} characters")
    }
}

/// Text must have at most `max` characters.
#[derive(Debug, Clone)]
pub struct MaxLength {
    /// Maximum number of characters allowed.
    pub max: usize,
    message: Option<String>,
}

impl MaxLength {
    /// Create a new `MaxLength` validator.
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self { max, message: None }
    }

    /// Replace the error message (`{max}` and `{actual}` are interpolated).
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator<FieldValue> for MaxLength {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        let Some(text) = value.as_str() else {
            return ValidationResult::Valid;
        };
        let len = text.chars().count();
        if len > self.max {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MAX_LENGTH, self.error_message())
                    .with_param("max", self.max)
                    .with_param("actual", len),
            )
        } else {
            ValidationResult::Valid
        }
    }

    fn error_message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or("Must be at most {max} characters")
    }
}

/// Text must contain (or equal) a literal pattern.
///
/// No regex engine; implement [`Validator`] directly for richer formats.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// The literal to look for.
    pub pattern: String,
    /// Error message.
    pub message: String,
    /// Whether the whole text must equal the pattern.
    pub exact: bool,
}

impl Pattern {
    /// Text must contain `pattern`.
    #[must_use]
    pub fn contains(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            message: "Invalid format".to_string(),
            exact: false,
        }
    }

    /// Text must equal `pattern`.
    #[must_use]
    pub fn exact(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            message: "Invalid format".to_string(),
            exact: true,
        }
    }

    /// Set a custom error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Validator<FieldValue> for Pattern {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        let Some(text) = value.as_str() else {
            return ValidationResult::Valid;
        };
        if text.is_empty() {
            return ValidationResult::Valid;
        }
        let matches = if self.exact {
            text == self.pattern
        } else {
            text.contains(&self.pattern)
        };
        if matches {
            ValidationResult::Valid
        } else {
            fail(ERROR_CODE_PATTERN, &self.message)
        }
    }

    fn error_message(&self) -> &str {
        &self.message
    }
}

/// Text must look like an email address.
///
/// Heuristic: one `@` with text on both sides, a dotted domain, and a TLD of
/// at least two characters. Empty text is valid (use [`Required`]).
#[derive(Debug, Clone, Default)]
pub struct Email {
    message: Option<String>,
}

impl Email {
    /// Create a new `Email` validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn looks_like_email(text: &str) -> bool {
        let Some((local, domain)) = text.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return false;
        }
        let parts: Vec<&str> = domain.split('.').collect();
        parts.len() >= 2
            && parts.iter().all(|p| !p.is_empty())
            && parts.last().is_some_and(|tld| tld.len() >= 2)
    }
}

impl Validator<FieldValue> for Email {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        let Some(text) = value.as_str() else {
            return ValidationResult::Valid;
        };
        let trimmed = text.trim();
        if trimmed.is_empty() || Self::looks_like_email(trimmed) {
            ValidationResult::Valid
        } else {
            fail(ERROR_CODE_EMAIL, self.error_message())
        }
    }

    fn error_message(&self) -> &str {
        self.message.as_deref().unwrap_or("Invalid email address")
    }
}

/// Text must start with `http://` or `https://`.
#[derive(Debug, Clone, Default)]
pub struct Url {
    /// If `true`, require HTTPS only.
    pub require_https: bool,
    message: Option<String>,
}

impl Url {
    /// Create a new `Url` validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require HTTPS URLs only.
    #[must_use]
    pub fn require_https(mut self) -> Self {
        self.require_https = true;
        self
    }

    /// Replace the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator<FieldValue> for Url {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        let Some(text) = value.as_str() else {
            return ValidationResult::Valid;
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return ValidationResult::Valid;
        }
        let https = trimmed.starts_with("https://") && trimmed.len() > 8;
        let http = trimmed.starts_with("http://") && trimmed.len() > 7;
        if https || (!self.require_https && http) {
            ValidationResult::Valid
        } else {
            fail(ERROR_CODE_URL, self.error_message())
        }
    }

    fn error_message(&self) -> &str {
        match (&self.message, self.require_https) {
            (Some(m), _) => m,
            (None, true) => "Invalid URL (must use HTTPS)",
            (None, false) => "Invalid URL",
        }
    }
}

/// Number must be `>= min`.
#[derive(Debug, Clone)]
pub struct Min {
    /// Inclusive lower bound.
    pub min: f64,
    message: Option<String>,
}

impl Min {
    /// Create a new `Min` validator.
    #[must_use]
    pub fn new(min: f64) -> Self {
        Self { min, message: None }
    }

    /// Replace the error message (`{min}` is interpolated).
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator<FieldValue> for Min {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        match value.as_f64() {
            Some(n) if n < self.min => ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MIN, self.error_message())
                    .with_param("min", self.min)
                    .with_param("actual", n),
            ),
            _ => ValidationResult::Valid,
        }
    }

    fn error_message(&self) -> &str {
        self.message.as_deref().unwrap_or("Must be at least {min}")
    }
}

/// Number must be `<= max`.
#[derive(Debug, Clone)]
pub struct Max {
    /// Inclusive upper bound.
    pub max: f64,
    message: Option<String>,
}

impl Max {
    /// Create a new `Max` validator.
    #[must_use]
    pub fn new(max: f64) -> Self {
        Self { max, message: None }
    }

    /// Replace the error message (`{max}` is interpolated).
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator<FieldValue> for Max {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        match value.as_f64() {
            Some(n) if n > self.max => ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MAX, self.error_message())
                    .with_param("max", self.max)
                    .with_param("actual", n),
            ),
            _ => ValidationResult::Valid,
        }
    }

    fn error_message(&self) -> &str {
        self.message.as_deref().unwrap_or("Must be at most {max}")
    }
}

/// A value within an inclusive range.
///
/// Generic over any ordered, displayable value; the [`FieldValue`] impl
/// ignores non-numbers.
#[derive(Debug, Clone, Copy)]
pub struct Range<T> {
    /// Minimum value (inclusive).
    pub min: T,
    /// Maximum value (inclusive).
    pub max: T,
}

impl<T: Copy> Range<T> {
    /// Create a new `Range` validator.
    #[must_use]
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T> Validator<T> for Range<T>
where
    T: PartialOrd + fmt::Display + Copy + Send + Sync,
{
    fn validate(&self, value: &T) -> ValidationResult {
        if *value >= self.min && *value <= self.max {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_RANGE, "Must be between {min} and {max}")
                    .with_param("min", self.min)
                    .with_param("max", self.max)
                    .with_param("actual", *value),
            )
        }
    }

    fn error_message(&self) -> &str {
        "Must be between {min} and {max}"
    }
}

impl Validator<FieldValue> for Range<f64> {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        value
            .as_f64()
            .map_or(ValidationResult::Valid, |n| Validator::<f64>::validate(self, &n))
    }

    fn error_message(&self) -> &str {
        "Must be between {min} and {max}"
    }
}

/// Value must equal one of a fixed set (select columns).
#[derive(Debug, Clone)]
pub struct OneOf {
    /// Allowed values.
    pub allowed: Vec<FieldValue>,
    message: Option<String>,
}

impl OneOf {
    /// Create a new `OneOf` validator.
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = FieldValue>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            message: None,
        }
    }

    /// Replace the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator<FieldValue> for OneOf {
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        if value.is_null() || self.allowed.contains(value) {
            ValidationResult::Valid
        } else {
            fail(ERROR_CODE_ONE_OF, self.error_message())
        }
    }

    fn error_message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or("Must be one of the allowed options")
    }
}

// ---------------------------------------------------------------------------
// Composition Validators
// ---------------------------------------------------------------------------

/// Combines two validators with AND logic.
#[derive(Debug, Clone)]
pub struct And<A, B> {
    /// First validator.
    pub first: A,
    /// Second validator.
    pub second: B,
}

impl<A, B> And<A, B> {
    /// Create a new `And` validator.
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<T: ?Sized, A, B> Validator<T> for And<A, B>
where
    A: Validator<T>,
    B: Validator<T>,
{
    fn validate(&self, value: &T) -> ValidationResult {
        match self.first.validate(value) {
            ValidationResult::Valid => self.second.validate(value),
            err => err,
        }
    }

    fn error_message(&self) -> &str {
        self.first.error_message()
    }
}

/// Combines two validators with OR logic.
#[derive(Debug, Clone)]
pub struct Or<A, B> {
    /// First validator.
    pub first: A,
    /// Second validator.
    pub second: B,
}

impl<A, B> Or<A, B> {
    /// Create a new `Or` validator.
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<T: ?Sized, A, B> Validator<T> for Or<A, B>
where
    A: Validator<T>,
    B: Validator<T>,
{
    fn validate(&self, value: &T) -> ValidationResult {
        match self.first.validate(value) {
            ValidationResult::Valid => ValidationResult::Valid,
            _ => self.second.validate(value),
        }
    }

    fn error_message(&self) -> &str {
        self.second.error_message()
    }
}

/// Negates a validator.
#[derive(Debug, Clone)]
pub struct Not<V> {
    /// Inner validator.
    pub inner: V,
    /// Error message when the inner validator passes.
    pub message: String,
}

impl<V> Not<V> {
    /// Create a new `Not` validator with a custom error message.
    #[must_use]
    pub fn new(inner: V, message: impl Into<String>) -> Self {
        Self {
            inner,
            message: message.into(),
        }
    }
}

impl<T: ?Sized, V> Validator<T> for Not<V>
where
    V: Validator<T>,
{
    fn validate(&self, value: &T) -> ValidationResult {
        match self.inner.validate(value) {
            ValidationResult::Valid => fail("not", &self.message),
            ValidationResult::Invalid(_) => ValidationResult::Valid,
        }
    }

    fn error_message(&self) -> &str {
        &self.message
    }
}

/// All validators must pass; the first failure wins.
pub struct All<T: ?Sized> {
    validators: Vec<Box<dyn Validator<T>>>,
}

impl<T: ?Sized> All<T> {
    /// Create a new `All` validator with the given validators.
    #[must_use]
    pub fn new(validators: Vec<Box<dyn Validator<T>>>) -> Self {
        Self { validators }
    }

    /// Number of composed validators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// `true` when nothing is composed (always valid).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl<T: ?Sized> Validator<T> for All<T> {
    fn validate(&self, value: &T) -> ValidationResult {
        for validator in &self.validators {
            let result = validator.validate(value);
            if result.is_invalid() {
                return result;
            }
        }
        ValidationResult::Valid
    }

    fn error_message(&self) -> &str {
        self.validators
            .first()
            .map_or("Validation failed", |v| v.error_message())
    }
}

impl<T: ?Sized> fmt::Debug for All<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("All")
            .field(
                "validators",
                &format!("[{} validators]", self.validators.len()),
            )
            .finish()
    }
}

/// At least one validator must pass; otherwise the last error is reported.
pub struct Any<T: ?Sized> {
    validators: Vec<Box<dyn Validator<T>>>,
}

impl<T: ?Sized> Any<T> {
    /// Create a new `Any` validator with the given validators.
    #[must_use]
    pub fn new(validators: Vec<Box<dyn Validator<T>>>) -> Self {
        Self { validators }
    }
}

impl<T: ?Sized> Validator<T> for Any<T> {
    fn validate(&self, value: &T) -> ValidationResult {
        let mut last_error = None;
        for validator in &self.validators {
            let result = validator.validate(value);
            if result.is_valid() {
                return ValidationResult::Valid;
            }
            last_error = result.error().cloned();
        }
        last_error.map_or(ValidationResult::Valid, ValidationResult::Invalid)
    }

    fn error_message(&self) -> &str {
        self.validators
            .last()
            .map_or("Validation failed", |v| v.error_message())
    }
}

impl<T: ?Sized> fmt::Debug for Any<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Any")
            .field(
                "validators",
                &format!("[{} validators]", self.validators.len()),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ValidatorBuilder
// ---------------------------------------------------------------------------

/// A builder for constructing validators fluently.
///
/// # Example
///
/// ```rust
/// use formtable_core::FieldValue;
/// use formtable_validation::{Validator, ValidatorBuilder};
///
/// let validator = ValidatorBuilder::<FieldValue>::new()
///     .required()
///     .min_length(3)
///     .build();
///
/// assert!(validator.validate(&FieldValue::from("alice")).is_valid());
/// assert!(validator.validate(&FieldValue::from("ab")).is_invalid());
/// ```
pub struct ValidatorBuilder<T: ?Sized> {
    validators: Vec<Box<dyn Validator<T>>>,
    _phantom: PhantomData<T>,
}

impl<T: ?Sized> Default for ValidatorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> ValidatorBuilder<T> {
    /// Create a new empty validator builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Add a custom validator.
    #[must_use]
    pub fn custom(mut self, validator: impl Validator<T> + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Build the combined validator.
    #[must_use]
    pub fn build(self) -> All<T> {
        All::new(self.validators)
    }
}

impl ValidatorBuilder<FieldValue> {
    /// Add a `Required` validator.
    #[must_use]
    pub fn required(self) -> Self {
        self.custom(Required::new())
    }

    /// Add an `IsNumber` validator.
    #[must_use]
    pub fn number(self) -> Self {
        self.custom(IsNumber::new())
    }

    /// Add a `MinLength` validator.
    #[must_use]
    pub fn min_length(self, min: usize) -> Self {
        self.custom(MinLength::new(min))
    }

    /// Add a `MaxLength` validator.
    #[must_use]
    pub fn max_length(self, max: usize) -> Self {
        self.custom(MaxLength::new(max))
    }

    /// Add a `Min` validator.
    #[must_use]
    pub fn min(self, min: f64) -> Self {
        self.custom(Min::new(min))
    }

    /// Add a `Max` validator.
    #[must_use]
    pub fn max(self, max: f64) -> Self {
        self.custom(Max::new(max))
    }

    /// Add an `Email` validator.
    #[must_use]
    pub fn email(self) -> Self {
        self.custom(Email::new())
    }

    /// Add a `Url` validator.
    #[must_use]
    pub fn url(self) -> Self {
        self.custom(Url::new())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::from(s)
    }

    fn num(n: f64) -> FieldValue {
        FieldValue::Number(n)
    }

    // -- ValidationError tests --

    #[test]
    fn validation_error_format_multiple_params() {
        let err = ValidationError::new("test", "Between {min} and {max}")
            .with_param("min", 1)
            .with_param("max", 10);
        assert_eq!(err.format_message(), "Between 1 and 10");
        assert_eq!(err.to_string(), "Between 1 and 10");
    }

    #[test]
    fn validation_result_combinators() {
        let valid = ValidationResult::Valid;
        let invalid = ValidationResult::Invalid(ValidationError::new("x", "bad"));

        assert!(valid.clone().and(valid.clone()).is_valid());
        assert!(valid.clone().and(invalid.clone()).is_invalid());
        assert_eq!(invalid.error_message().as_deref(), Some("bad"));
        assert!(invalid.into_result().is_err());
        assert!(valid.into_result().is_ok());
    }

    // -- Required tests --

    #[test]
    fn required_rejects_null_and_blank() {
        let v = Required::new();
        assert!(v.validate(&FieldValue::Null).is_invalid());
        assert!(v.validate(&text("")).is_invalid());
        assert!(v.validate(&text(" \t")).is_invalid());
        assert!(v.validate(&text("x")).is_valid());
        assert!(v.validate(&num(0.0)).is_valid());
        assert!(v.validate(&FieldValue::Bool(false)).is_valid());
    }

    #[test]
    fn required_whitespace_allowed() {
        let v = Required::new().allow_whitespace();
        assert!(v.validate(&text("   ")).is_valid());
        assert!(v.validate(&text("")).is_invalid());
    }

    #[test]
    fn required_custom_message() {
        let v = Required::new().with_message("Required");
        assert_eq!(
            v.validate(&FieldValue::Null).error_message().as_deref(),
            Some("Required")
        );
    }

    // -- IsNumber tests --

    #[test]
    fn is_number() {
        let v = IsNumber::new();
        assert!(v.validate(&num(1.0)).is_valid());
        assert!(v.validate(&FieldValue::Null).is_valid());
        assert!(v.validate(&text("")).is_valid());
        assert!(v.validate(&text("12a")).is_invalid());
        assert!(v.validate(&FieldValue::Bool(true)).is_invalid());
    }

    // -- Length tests --

    #[test]
    fn min_length_boundary_and_message() {
        let v = MinLength::new(2).with_message("Min {min} chars");
        let result = v.validate(&text("A"));
        assert_eq!(result.error_message().as_deref(), Some("Min 2 chars"));
        assert!(v.validate(&text("AB")).is_valid());
        assert!(v.validate(&FieldValue::Null).is_valid());
    }

    #[test]
    fn min_length_counts_chars_not_bytes() {
        let v = MinLength::new(4);
        assert!(v.validate(&text("café")).is_valid());
        assert!(v.validate(&text("caf")).is_invalid());
    }

    #[test]
    fn max_length_boundary() {
        let v = MaxLength::new(3);
        assert!(v.validate(&text("abc")).is_valid());
        let result = v.validate(&text("abcd"));
        let err = result.error().expect("too long");
        assert_eq!(err.params.get("actual"), Some(&"4".to_string()));
    }

    // -- Pattern / Email / Url tests --

    #[test]
    fn pattern_contains_and_exact() {
        assert!(Pattern::contains("@").validate(&text("a@b")).is_valid());
        assert!(Pattern::contains("@").validate(&text("ab")).is_invalid());
        assert!(Pattern::exact("yes").validate(&text("yes")).is_valid());
        assert!(Pattern::exact("yes").validate(&text("yes!")).is_invalid());
        assert!(Pattern::exact("yes").validate(&text("")).is_valid());
    }

    #[test]
    fn email_heuristics() {
        let v = Email::new();
        assert!(v.validate(&text("user@example.com")).is_valid());
        assert!(v.validate(&text("")).is_valid());
        for bad in ["user", "@example.com", "user@", "user@example", "user@example.c", "a@b..com"] {
            assert!(v.validate(&text(bad)).is_invalid(), "{bad} should fail");
        }
    }

    #[test]
    fn url_heuristics() {
        assert!(Url::new().validate(&text("http://x.io")).is_valid());
        assert!(Url::new().validate(&text("ftp://x.io")).is_invalid());
        let https = Url::new().require_https();
        assert!(https.validate(&text("http://x.io")).is_invalid());
        assert!(https.validate(&text("https://x.io")).is_valid());
        assert_eq!(https.error_message(), "Invalid URL (must use HTTPS)");
    }

    // -- Numeric tests --

    #[test]
    fn min_max_on_numbers_only() {
        let min = Min::new(1.0).with_message("Min 1");
        assert_eq!(
            min.validate(&num(0.0)).error_message().as_deref(),
            Some("Min 1")
        );
        assert!(min.validate(&num(1.0)).is_valid());
        assert!(min.validate(&text("abc")).is_valid());
        assert!(min.validate(&FieldValue::Null).is_valid());

        let max = Max::new(10.0);
        assert_eq!(
            max.validate(&num(11.0)).error_message().as_deref(),
            Some("Must be at most 10")
        );
    }

    #[test]
    fn range_generic_and_field_value() {
        let r = Range::new(1.0, 5.0);
        assert!(Validator::<f64>::validate(&r, &3.0).is_valid());
        assert!(Validator::<FieldValue>::validate(&r, &num(6.0)).is_invalid());
        assert!(Validator::<FieldValue>::validate(&r, &text("x")).is_valid());
        let ints = Range::new(1u64, 10);
        assert!(ints.validate(&0).is_invalid());
    }

    #[test]
    fn one_of() {
        let v = OneOf::new([text("a"), text("b")]);
        assert!(v.validate(&text("a")).is_valid());
        assert!(v.validate(&FieldValue::Null).is_valid());
        assert!(v.validate(&text("c")).is_invalid());
    }

    // -- Composition tests --

    #[test]
    fn and_or_not() {
        let both = And::new(Required::new(), MinLength::new(3));
        assert!(both.validate(&text("abc")).is_valid());
        assert_eq!(
            both.validate(&text("")).error().map(|e| e.code),
            Some(ERROR_CODE_REQUIRED)
        );

        let either = Or::new(Pattern::exact("x"), Pattern::exact("y"));
        assert!(either.validate(&text("y")).is_valid());
        assert!(either.validate(&text("z")).is_invalid());

        let not_admin = Not::new(Pattern::exact("admin"), "Reserved name");
        assert!(not_admin.validate(&text("admin")).is_invalid());
        assert!(not_admin.validate(&text("alice")).is_valid());
    }

    #[test]
    fn all_and_any() {
        let all = ValidatorBuilder::<FieldValue>::new()
            .required()
            .number()
            .min(1.0)
            .max(100.0)
            .build();
        assert_eq!(all.len(), 4);
        assert!(all.validate(&num(50.0)).is_valid());
        assert_eq!(
            all.validate(&text("x")).error().map(|e| e.code),
            Some(ERROR_CODE_TYPE)
        );
        assert!(all.validate(&num(101.0)).is_invalid());
        assert!(format!("{all:?}").contains("4 validators"));

        let any: Any<FieldValue> = Any::new(vec![
            Box::new(Email::new()),
            Box::new(Url::new()),
        ]);
        assert!(any.validate(&text("https://example.com")).is_valid());
        assert_eq!(
            any.validate(&text("nope")).error().map(|e| e.code),
            Some(ERROR_CODE_URL)
        );
    }

    #[test]
    fn empty_all_is_valid() {
        let all = All::<FieldValue>::new(Vec::new());
        assert!(all.is_empty());
        assert!(all.validate(&FieldValue::Null).is_valid());
    }
}
