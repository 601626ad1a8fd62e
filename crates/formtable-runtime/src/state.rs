#![forbid(unsafe_code)]

//! Snapshot types handed to readers and listeners.
//!
//! Snapshots are immutable. Every write builds a new top-level
//! [`FormsState`]; forms that were not touched keep their `Arc`, so
//! `Arc::ptr_eq` answers "did this form change".

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use formtable_core::{FieldPath, FieldValue, Record};

/// Value and current validation error of one field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldState {
    /// Current value.
    pub value: FieldValue,
    /// Message from the last applied validation, if it failed.
    pub error: Option<String>,
}

impl FieldState {
    /// A field holding `value` with no error.
    #[must_use]
    pub fn new(value: FieldValue) -> Self {
        Self { value, error: None }
    }

    /// `true` if the field carries an error.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Field name to state, for one form.
pub type FormState = BTreeMap<String, FieldState>;

/// Form id to form snapshot.
pub type FormsState = BTreeMap<String, Arc<FormState>>;

/// Value-only view of a form.
pub(crate) fn record_of(form: &FormState) -> Record {
    form.iter()
        .map(|(name, state)| (name.clone(), state.value.clone()))
        .collect()
}

/// Focus, navigation order, and visited fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationState {
    /// The focused field, if any.
    pub active_field: Option<FieldPath>,
    /// Every configured field in column order.
    pub fields: Vec<FieldPath>,
    /// Fields that have been focused or completed at least once.
    pub visited_fields: BTreeSet<FieldPath>,
}

impl NavigationState {
    /// Fields of `form`, in navigation order.
    pub fn fields_of<'a>(&'a self, form: &'a str) -> impl Iterator<Item = &'a FieldPath> + 'a {
        self.fields.iter().filter(move |p| p.in_form(form))
    }

    /// `true` if `path` is configured.
    #[must_use]
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.fields.contains(path)
    }

    /// `true` if `path` has been visited.
    #[must_use]
    pub fn is_visited(&self, path: &FieldPath) -> bool {
        self.visited_fields.contains(path)
    }

    /// `true` if the active field is `path`.
    #[must_use]
    pub fn is_active(&self, path: &FieldPath) -> bool {
        self.active_field.as_ref() == Some(path)
    }

    /// The form of the active field.
    #[must_use]
    pub fn active_form(&self) -> Option<&str> {
        self.active_field.as_ref().map(FieldPath::form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn scoped_field_iteration_keeps_order() {
        let nav = NavigationState {
            fields: vec![
                path("buy.quantity"),
                path("sell.quantity"),
                path("buy.price"),
                path("sell.price"),
            ],
            ..NavigationState::default()
        };
        let buy: Vec<String> = nav.fields_of("buy").map(ToString::to_string).collect();
        assert_eq!(buy, vec!["buy.quantity", "buy.price"]);
        assert_eq!(nav.fields_of("hold").count(), 0);
    }

    #[test]
    fn active_and_visited() {
        let mut nav = NavigationState::default();
        assert_eq!(nav.active_form(), None);
        nav.active_field = Some(path("sell.price"));
        nav.visited_fields.insert(path("sell.price"));
        assert_eq!(nav.active_form(), Some("sell"));
        assert!(nav.is_active(&path("sell.price")));
        assert!(nav.is_visited(&path("sell.price")));
        assert!(!nav.is_visited(&path("buy.price")));
    }

    #[test]
    fn record_drops_errors() {
        let mut form = FormState::new();
        form.insert(
            "price".into(),
            FieldState {
                value: FieldValue::from(0),
                error: Some("Min 0.01".into()),
            },
        );
        let record = record_of(&form);
        assert_eq!(record["price"], FieldValue::from(0));
        assert!(form["price"].has_error());
    }
}
