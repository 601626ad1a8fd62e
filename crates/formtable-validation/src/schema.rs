#![forbid(unsafe_code)]

//! Per-form schemas.
//!
//! The store only knows [`FormSchema`]: "validate field `f` of this record".
//! [`ObjectSchema`] is the built-in rule-based implementation, composed from
//! the validators in [`crate::validators`]. Closures with the right signature
//! are schemas too.

use std::collections::BTreeMap;
use std::fmt;

use formtable_core::{Column, FieldKind, FieldValue, Record};

use crate::validators::{
    Email, IsNumber, Max, MaxLength, Min, MinLength, OneOf, Pattern, Required, Url,
    ValidationError, ValidationResult, Validator,
};

/// Error code for failed custom tests.
pub const ERROR_CODE_TEST: &str = "test";

/// Message for blank required columns without an explicit schema.
pub const DEFAULT_REQUIRED_MESSAGE: &str = "Required";
/// Message for non-numeric number columns without an explicit schema.
pub const DEFAULT_NUMBER_MESSAGE: &str = "Must be a number";
/// Message for malformed email columns without an explicit schema.
pub const DEFAULT_EMAIL_MESSAGE: &str = "Invalid email";

/// Why a field failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The value broke a rule; the message is shown to the user.
    Invalid(ValidationError),
    /// The schema itself failed. The store shows its fallback message.
    Internal(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Internal(msg) => write!(f, "schema failure: {msg}"),
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Internal(_) => None,
        }
    }
}

impl From<ValidationError> for SchemaError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err)
    }
}

/// Validates one field of a form against the form's current values.
///
/// `record` is the whole form, so cross-field rules can look at siblings.
/// Implementations run on worker threads, hence `Send + Sync`.
pub trait FormSchema: Send + Sync {
    /// Validate `field` inside `record`.
    fn validate_field(&self, field: &str, record: &Record) -> Result<(), SchemaError>;
}

impl<F> FormSchema for F
where
    F: Fn(&str, &Record) -> Result<(), SchemaError> + Send + Sync,
{
    fn validate_field(&self, field: &str, record: &Record) -> Result<(), SchemaError> {
        self(field, record)
    }
}

// ---------------------------------------------------------------------------
// FieldRules
// ---------------------------------------------------------------------------

type TestFn = dyn Fn(&FieldValue, &Record) -> bool + Send + Sync;

enum Rule {
    Value(Box<dyn Validator<FieldValue>>),
    Test {
        name: String,
        message: String,
        check: Box<TestFn>,
    },
}

impl Rule {
    fn check(&self, value: &FieldValue, record: &Record) -> ValidationResult {
        match self {
            Self::Value(validator) => validator.validate(value),
            Self::Test {
                name,
                message,
                check,
            } => {
                if check(value, record) {
                    ValidationResult::Valid
                } else {
                    ValidationResult::Invalid(
                        ValidationError::new(ERROR_CODE_TEST, message.clone())
                            .with_param("test", name),
                    )
                }
            }
        }
    }
}

/// Ordered rules for one field. The first failing rule reports.
///
/// Every method takes the user-facing message, in the style of schema
/// builders where each rule carries its own text.
///
/// ```rust
/// use formtable_validation::FieldRules;
///
/// let quantity = FieldRules::new()
///     .required("Required")
///     .number("Must be a number")
///     .min(1.0, "Min 1");
/// assert_eq!(quantity.len(), 3);
/// ```
#[derive(Default)]
pub struct FieldRules {
    rules: Vec<Rule>,
}

impl FieldRules {
    /// No rules: every value passes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add any validator.
    #[must_use]
    pub fn rule(mut self, validator: impl Validator<FieldValue> + 'static) -> Self {
        self.rules.push(Rule::Value(Box::new(validator)));
        self
    }

    /// Value must be present and non-blank.
    #[must_use]
    pub fn required(self, message: impl Into<String>) -> Self {
        self.rule(Required::new().with_message(message))
    }

    /// Value must be numeric when present.
    #[must_use]
    pub fn number(self, message: impl Into<String>) -> Self {
        self.rule(IsNumber::new().with_message(message))
    }

    /// Number must be `>= min`.
    #[must_use]
    pub fn min(self, min: f64, message: impl Into<String>) -> Self {
        self.rule(Min::new(min).with_message(message))
    }

    /// Number must be `<= max`.
    #[must_use]
    pub fn max(self, max: f64, message: impl Into<String>) -> Self {
        self.rule(Max::new(max).with_message(message))
    }

    /// Text must have at least `min` characters.
    #[must_use]
    pub fn min_length(self, min: usize, message: impl Into<String>) -> Self {
        self.rule(MinLength::new(min).with_message(message))
    }

    /// Text must have at most `max` characters.
    #[must_use]
    pub fn max_length(self, max: usize, message: impl Into<String>) -> Self {
        self.rule(MaxLength::new(max).with_message(message))
    }

    /// Text must contain `needle`.
    #[must_use]
    pub fn contains(self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        self.rule(Pattern::contains(needle).with_message(message))
    }

    /// Text must look like an email address.
    #[must_use]
    pub fn email(self, message: impl Into<String>) -> Self {
        self.rule(Email::new().with_message(message))
    }

    /// Text must be an http(s) URL.
    #[must_use]
    pub fn url(self, message: impl Into<String>) -> Self {
        self.rule(Url::new().with_message(message))
    }

    /// Value must be one of `allowed`.
    #[must_use]
    pub fn one_of(
        self,
        allowed: impl IntoIterator<Item = FieldValue>,
        message: impl Into<String>,
    ) -> Self {
        self.rule(OneOf::new(allowed).with_message(message))
    }

    /// Custom check with access to the whole form record.
    #[must_use]
    pub fn test<F>(mut self, name: impl Into<String>, message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&FieldValue, &Record) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule::Test {
            name: name.into(),
            message: message.into(),
            check: Box::new(check),
        });
        self
    }

    /// Rules implied by a column definition: `required` first, then the
    /// type check for number and email kinds.
    #[must_use]
    pub fn for_column(column: &Column) -> Self {
        let mut rules = Self::new();
        if column.required {
            rules = rules.required(DEFAULT_REQUIRED_MESSAGE);
        }
        match column.kind {
            FieldKind::Number => rules.number(DEFAULT_NUMBER_MESSAGE),
            FieldKind::Email => rules.email(DEFAULT_EMAIL_MESSAGE),
            FieldKind::Text | FieldKind::Select { .. } => rules,
        }
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// `true` when there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run the rules in order against `value`.
    pub fn check(&self, value: &FieldValue, record: &Record) -> ValidationResult {
        for rule in &self.rules {
            let result = rule.check(value, record);
            if result.is_invalid() {
                return result;
            }
        }
        ValidationResult::Valid
    }
}

impl fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRules")
            .field("rules", &format!("[{} rules]", self.rules.len()))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ObjectSchema
// ---------------------------------------------------------------------------

/// A rule set per field name.
///
/// Fields without rules are valid. A missing key in the record is treated as
/// `Null`.
#[derive(Debug, Default)]
pub struct ObjectSchema {
    fields: BTreeMap<String, FieldRules>,
}

impl ObjectSchema {
    /// Empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach rules to `field`, replacing earlier ones.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>, rules: FieldRules) -> Self {
        self.fields.insert(field.into(), rules);
        self
    }

    /// Schema implied by column definitions. Only columns of `form_id` are
    /// used; columns that imply no rules are left out.
    #[must_use]
    pub fn from_columns<'a>(form_id: &str, columns: impl IntoIterator<Item = &'a Column>) -> Self {
        columns
            .into_iter()
            .filter(|column| column.form_id == form_id)
            .fold(Self::new(), |schema, column| {
                let rules = FieldRules::for_column(column);
                if rules.is_empty() {
                    schema
                } else {
                    schema.field(column.field.clone(), rules)
                }
            })
    }

    /// Number of fields with rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` when no field has rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Rules registered for `field`.
    #[must_use]
    pub fn rules(&self, field: &str) -> Option<&FieldRules> {
        self.fields.get(field)
    }

    /// Validate every field with rules; returns the failures by field name.
    #[must_use]
    pub fn validate_record(&self, record: &Record) -> BTreeMap<String, ValidationError> {
        self.fields
            .keys()
            .filter_map(|field| {
                self.validate_field(field, record)
                    .err()
                    .and_then(|err| match err {
                        SchemaError::Invalid(e) => Some((field.clone(), e)),
                        SchemaError::Internal(_) => None,
                    })
            })
            .collect()
    }
}

impl FormSchema for ObjectSchema {
    fn validate_field(&self, field: &str, record: &Record) -> Result<(), SchemaError> {
        let Some(rules) = self.fields.get(field) else {
            return Ok(());
        };
        let null = FieldValue::Null;
        let value = record.get(field).unwrap_or(&null);
        rules.check(value, record).into_result()?;
        Ok(())
    }
}
