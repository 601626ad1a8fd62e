#![forbid(unsafe_code)]

//! The closed value type stored in every cell.
//!
//! The store never interprets a [`FieldValue`]; the per-form schema owns the
//! typed shape. Numbers are `f64` so that quantity/price style columns and
//! integer columns share one representation.

use std::collections::BTreeMap;
use std::fmt;

/// A value-only snapshot of one form: field name to value.
///
/// This is what validators see and what submit handlers receive. It never
/// carries errors or other metadata.
pub type Record = BTreeMap<String, FieldValue>;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    /// No value (blank number input, unset select).
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Free text.
    Text(String),
}

impl FieldValue {
    /// Returns the numeric value, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text, if this is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the flag, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// `true` for `Null` and for text that is empty after trimming.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// `true` if this is `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view used by computed cells: numbers as-is, numeric text
    /// parsed, everything else `0.0`.
    #[must_use]
    pub fn to_f64_lossy(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(0.0),
            Self::Bool(true) => 1.0,
            Self::Bool(false) | Self::Null => 0.0,
        }
    }

    /// Short name of the variant, for log fields and error params.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_null() {
        assert_eq!(FieldValue::default(), FieldValue::Null);
        assert!(FieldValue::default().is_null());
    }

    #[test]
    fn blankness() {
        assert!(FieldValue::Null.is_blank());
        assert!(FieldValue::from("   ").is_blank());
        assert!(!FieldValue::from("x").is_blank());
        assert!(!FieldValue::from(0).is_blank());
        assert!(!FieldValue::from(false).is_blank());
    }

    #[test]
    fn accessors() {
        assert_eq!(FieldValue::from(10.5).as_f64(), Some(10.5));
        assert_eq!(FieldValue::from("abc").as_str(), Some("abc"));
        assert_eq!(FieldValue::from(true).as_bool(), Some(true));
        assert_eq!(FieldValue::from("abc").as_f64(), None);
    }

    #[test]
    fn lossy_numeric_view() {
        assert_eq!(FieldValue::from(3).to_f64_lossy(), 3.0);
        assert_eq!(FieldValue::from(" 2.5 ").to_f64_lossy(), 2.5);
        assert_eq!(FieldValue::from("abc").to_f64_lossy(), 0.0);
        assert_eq!(FieldValue::Null.to_f64_lossy(), 0.0);
    }

    #[test]
    fn display() {
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::from(100).to_string(), "100");
        assert_eq!(FieldValue::from(10.5).to_string(), "10.5");
        assert_eq!(FieldValue::from("Ann").to_string(), "Ann");
    }

    #[test]
    fn option_conversion() {
        assert_eq!(FieldValue::from(None::<f64>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(2)), FieldValue::Number(2.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_untagged() {
        let record: Record = serde_json::from_str(r#"{"a":1.5,"b":"x","c":null,"d":true}"#)
            .expect("valid json");
        assert_eq!(record["a"], FieldValue::Number(1.5));
        assert_eq!(record["b"], FieldValue::from("x"));
        assert_eq!(record["c"], FieldValue::Null);
        assert_eq!(record["d"], FieldValue::Bool(true));
        let back = serde_json::to_string(&record).expect("serializable");
        assert_eq!(back, r#"{"a":1.5,"b":"x","c":null,"d":true}"#);
    }
}
