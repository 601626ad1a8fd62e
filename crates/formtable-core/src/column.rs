#![forbid(unsafe_code)]

//! Column definitions.
//!
//! A store is configured from an ordered list of [`Column`]s. The order is
//! the navigation order; the `(form_id, field)` pairs define which forms and
//! fields exist. The [`FieldKind`] tag translates raw input text into a
//! [`FieldValue`]. Together with [`Column::required`] it also implies the
//! rules of forms registered without a schema.

use crate::path::{FieldPath, PathError};
use crate::value::FieldValue;

/// One choice of a select column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectOption {
    /// Stored value.
    pub value: FieldValue,
    /// Text shown to the user.
    pub label: String,
}

impl SelectOption {
    /// Create an option.
    #[must_use]
    pub fn new(value: impl Into<FieldValue>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Input type tag of a column.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum FieldKind {
    /// Free text.
    #[default]
    Text,
    /// Numeric input.
    Number,
    /// Email address.
    Email,
    /// Fixed list of choices.
    Select {
        /// Available choices, in display order.
        options: Vec<SelectOption>,
    },
}

impl FieldKind {
    /// Translate raw input text into a value.
    ///
    /// - `Number`: blank → `Null`; parseable → `Number`; anything else stays
    ///   `Text` so the schema can report it.
    /// - `Select`: matches an option by its rendered value, then by label;
    ///   blank → `Null`; unknown text stays `Text`.
    /// - `Text`/`Email`: the text as-is.
    #[must_use]
    pub fn parse_input(&self, raw: &str) -> FieldValue {
        match self {
            Self::Text | Self::Email => FieldValue::Text(raw.to_string()),
            Self::Number => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    FieldValue::Null
                } else {
                    match trimmed.parse::<f64>() {
                        Ok(n) if n.is_finite() => FieldValue::Number(n),
                        _ => {
                            crate::trace!(raw, "number input kept as text");
                            FieldValue::Text(raw.to_string())
                        }
                    }
                }
            }
            Self::Select { options } => {
                if raw.trim().is_empty() {
                    return FieldValue::Null;
                }
                options
                    .iter()
                    .find(|opt| opt.value.to_string() == raw)
                    .or_else(|| options.iter().find(|opt| opt.label == raw))
                    .map_or_else(|| FieldValue::Text(raw.to_string()), |opt| opt.value.clone())
            }
        }
    }

    /// Options of a select column, empty for every other kind.
    #[must_use]
    pub fn options(&self) -> &[SelectOption] {
        match self {
            Self::Select { options } => options,
            _ => &[],
        }
    }
}

/// One editable column: a field of a form plus its presentation hints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    /// Form the field belongs to.
    pub form_id: String,
    /// Field name within the form.
    pub field: String,
    /// Input type tag.
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: FieldKind,
    /// Header label.
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String,
    /// Placeholder text for empty inputs.
    #[cfg_attr(feature = "serde", serde(default))]
    pub placeholder: String,
    /// Blank values are rejected when the form has no explicit schema.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required: bool,
}

impl Column {
    /// Create a text column labelled with its field name.
    #[must_use]
    pub fn new(form_id: impl Into<String>, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            form_id: form_id.into(),
            label: field.clone(),
            field,
            kind: FieldKind::Text,
            placeholder: String::new(),
            required: false,
        }
    }

    /// Set the input kind.
    #[must_use]
    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the header label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the placeholder.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Mark the column as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The canonical path of this column.
    pub fn path(&self) -> Result<FieldPath, PathError> {
        FieldPath::new(self.form_id.clone(), self.field.clone())
    }
}
