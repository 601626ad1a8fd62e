#![forbid(unsafe_code)]

//! Canonical `"<form>.<field>"` paths.
//!
//! A [`FieldPath`] is the unit of navigation and visited-tracking. Form ids
//! and field names are non-empty and never contain [`PATH_SEPARATOR`], so a
//! rendered path always splits back into exactly one (form, field) pair.

use std::fmt;
use std::str::FromStr;

/// Separator between the form id and the field name.
pub const PATH_SEPARATOR: char = '.';

/// Why an identifier or path was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The form id or field name was empty.
    Empty,
    /// The identifier contains the path separator.
    ContainsSeparator(String),
    /// The path did not have exactly one separator.
    Malformed(String),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "form id and field name must not be empty"),
            Self::ContainsSeparator(id) => {
                write!(f, "identifier {id:?} contains the path separator '{PATH_SEPARATOR}'")
            }
            Self::Malformed(path) => {
                write!(f, "field path {path:?} must look like \"form{PATH_SEPARATOR}field\"")
            }
        }
    }
}

impl std::error::Error for PathError {}

/// Check a single form id or field name.
pub fn validate_identifier(id: &str) -> Result<(), PathError> {
    if id.is_empty() {
        return Err(PathError::Empty);
    }
    if id.contains(PATH_SEPARATOR) {
        return Err(PathError::ContainsSeparator(id.to_string()));
    }
    Ok(())
}

/// A `(form, field)` pair identifying one navigable cell.
///
/// Ordering is by form id, then field name; navigation order is carried
/// separately by the configured column list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    form: String,
    field: String,
}

impl FieldPath {
    /// Build a path from its parts, validating both.
    pub fn new(form: impl Into<String>, field: impl Into<String>) -> Result<Self, PathError> {
        let form = form.into();
        let field = field.into();
        validate_identifier(&form)?;
        validate_identifier(&field)?;
        Ok(Self { form, field })
    }

    /// Parse `"form.field"`.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let mut parts = path.split(PATH_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(form), Some(field), None) if !form.is_empty() && !field.is_empty() => {
                Ok(Self {
                    form: form.to_string(),
                    field: field.to_string(),
                })
            }
            _ => {
                crate::trace!(path, "rejected malformed field path");
                Err(PathError::Malformed(path.to_string()))
            }
        }
    }

    /// The form this path belongs to.
    #[must_use]
    pub fn form(&self) -> &str {
        &self.form
    }

    /// The field name within the form.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// `true` if this path belongs to `form`.
    #[must_use]
    pub fn in_form(&self, form: &str) -> bool {
        self.form == form
    }

    /// `true` if this path names exactly `(form, field)`.
    #[must_use]
    pub fn is(&self, form: &str, field: &str) -> bool {
        self.form == form && self.field == field
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{PATH_SEPARATOR}{}", self.form, self.field)
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_parse() {
        let path = FieldPath::new("buy", "quantity").unwrap();
        assert_eq!(path.to_string(), "buy.quantity");
        assert_eq!(FieldPath::parse("buy.quantity").unwrap(), path);
        assert_eq!("buy.quantity".parse::<FieldPath>().unwrap(), path);
    }

    #[test]
    fn parse_rejects_wrong_shapes() {
        for bad in ["buy", "buy.", ".qty", "a.b.c", ""] {
            assert!(
                matches!(FieldPath::parse(bad), Err(PathError::Malformed(_))),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn new_rejects_separator_and_empty() {
        assert_eq!(
            FieldPath::new("bu.y", "qty"),
            Err(PathError::ContainsSeparator("bu.y".into()))
        );
        assert_eq!(FieldPath::new("buy", ""), Err(PathError::Empty));
    }

    #[test]
    fn membership() {
        let path = FieldPath::new("sell", "price").unwrap();
        assert!(path.in_form("sell"));
        assert!(!path.in_form("buy"));
        assert!(path.is("sell", "price"));
        assert!(!path.is("sell", "quantity"));
    }

    #[test]
    fn error_display() {
        let err = PathError::Malformed("x".into());
        assert!(err.to_string().contains("form.field"));
    }
}
