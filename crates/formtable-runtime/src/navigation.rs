#![forbid(unsafe_code)]

//! Focus navigation scoped to the active field's form.
//!
//! Fields of all forms interleave in column order, but next/previous only
//! ever cycle through the fields of the form that owns the active field.
//! Leaving a field forward or backward requires it to validate first.

use formtable_core::FieldPath;

use crate::error::StoreError;
use crate::store::FormStore;

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    /// Focus moved. `from` is `None` when nothing was focused before.
    Moved {
        from: Option<FieldPath>,
        to: FieldPath,
    },
    /// The active field failed validation; focus stayed on it.
    Blocked { field: FieldPath },
    /// Nothing to move to.
    Unchanged,
}

impl NavOutcome {
    /// The field that ended up focused, if focus moved.
    #[must_use]
    pub fn target(&self) -> Option<&FieldPath> {
        match self {
            Self::Moved { to, .. } => Some(to),
            Self::Blocked { .. } | Self::Unchanged => None,
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

impl FormStore {
    /// Focus `field` directly, or clear focus with `None`. No validation.
    pub fn set_active_field(&mut self, field: Option<FieldPath>) -> Result<(), StoreError> {
        if let Some(path) = &field
            && !self.navigation.contains(path)
        {
            return Err(StoreError::unknown_field(path.form(), path.field()));
        }
        self.update_navigation(|nav| nav.active_field = field);
        Ok(())
    }

    /// Validate the active field and, if valid, focus the next field of
    /// its form (wrapping). With nothing focused, focus the first field.
    pub fn next_field(&mut self) -> NavOutcome {
        self.step(Direction::Forward)
    }

    /// Like [`next_field`](Self::next_field), backwards.
    pub fn previous_field(&mut self) -> NavOutcome {
        self.step(Direction::Backward)
    }

    fn step(&mut self, direction: Direction) -> NavOutcome {
        let Some(active) = self.navigation.active_field.clone() else {
            let Some(first) = self.navigation.fields.first().cloned() else {
                return NavOutcome::Unchanged;
            };
            tracing::debug!(to = %first, "focusing first field");
            self.update_navigation(|nav| nav.active_field = Some(first.clone()));
            return NavOutcome::Moved {
                from: None,
                to: first,
            };
        };

        if !self.validate_path_sync(&active) {
            tracing::debug!(field = %active, "navigation blocked by invalid field");
            return NavOutcome::Blocked { field: active };
        }

        let scoped: Vec<&FieldPath> = self.navigation.fields_of(active.form()).collect();
        let Some(index) = scoped.iter().position(|p| **p == active) else {
            return NavOutcome::Unchanged;
        };
        let len = scoped.len();
        let next = match direction {
            Direction::Forward => (index + 1) % len,
            Direction::Backward => (index + len - 1) % len,
        };
        let to = scoped[next].clone();
        if to == active {
            return NavOutcome::Unchanged;
        }

        tracing::debug!(from = %active, to = %to, "focus moved");
        self.update_navigation(|nav| nav.active_field = Some(to.clone()));
        NavOutcome::Moved {
            from: Some(active),
            to,
        }
    }

    /// Record that a field has been visited. Idempotent.
    pub fn mark_field_visited(&mut self, form_id: &str, field: &str) -> Result<(), StoreError> {
        let path = self.resolve(form_id, field)?;
        self.update_navigation(|nav| {
            nav.visited_fields.insert(path);
        });
        Ok(())
    }

    /// `true` if every field of the form has been visited.
    ///
    /// Unknown forms have no fields and are never complete.
    #[must_use]
    pub fn has_visited_all_fields(&self, form_id: &str) -> bool {
        let nav = &self.navigation;
        let mut fields = nav.fields_of(form_id).peekable();
        fields.peek().is_some() && fields.all(|p| nav.is_visited(p))
    }

    /// `true` if visiting `field` would complete the form: every other field
    /// of the form is already visited.
    #[must_use]
    pub fn will_complete_all_fields(&self, form_id: &str, field: &str) -> bool {
        let nav = &self.navigation;
        let mut fields = nav.fields_of(form_id).peekable();
        fields.peek().is_some()
            && fields.all(|p| p.field() == field || nav.is_visited(p))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use formtable_core::{Column, FieldValue, Record};
    use formtable_validation::{FieldRules, ObjectSchema};

    use super::*;
    use crate::builder::record;
    use crate::executor::InlineExecutor;

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    fn store_with(values: Record) -> FormStore {
        FormStore::builder()
            .columns([
                Column::new("buy", "quantity"),
                Column::new("sell", "quantity"),
                Column::new("buy", "price"),
                Column::new("sell", "price"),
            ])
            .schema(
                "buy",
                ObjectSchema::new().field("quantity", FieldRules::new().required("Required")),
            )
            .initial_values("buy", values)
            .executor(InlineExecutor)
            .build()
            .unwrap()
    }

    fn valid_store() -> FormStore {
        store_with(record([("quantity", 1.into())]))
    }

    #[test]
    fn first_next_focuses_first_field() {
        let mut store = valid_store();
        assert_eq!(
            store.next_field(),
            NavOutcome::Moved {
                from: None,
                to: path("buy.quantity")
            }
        );
    }

    #[test]
    fn next_and_previous_stay_in_form() {
        let mut store = valid_store();
        store.set_active_field(Some(path("buy.quantity"))).unwrap();
        assert_eq!(store.next_field().target(), Some(&path("buy.price")));
        assert_eq!(store.next_field().target(), Some(&path("buy.quantity")));
        assert_eq!(store.previous_field().target(), Some(&path("buy.price")));

        store.set_active_field(Some(path("sell.price"))).unwrap();
        assert_eq!(store.next_field().target(), Some(&path("sell.quantity")));
        assert_eq!(store.previous_field().target(), Some(&path("sell.price")));
    }

    #[test]
    fn invalid_field_blocks_navigation() {
        let mut store = store_with(Record::new());
        store.set_active_field(Some(path("buy.quantity"))).unwrap();
        assert_eq!(
            store.next_field(),
            NavOutcome::Blocked {
                field: path("buy.quantity")
            }
        );
        assert_eq!(
            store.get_navigation().active_field,
            Some(path("buy.quantity"))
        );
        assert_eq!(
            store.field("buy", "quantity").unwrap().error.as_deref(),
            Some("Required")
        );
        assert!(matches!(store.previous_field(), NavOutcome::Blocked { .. }));
    }

    #[test]
    fn single_field_form_is_unchanged() {
        let mut store = FormStore::builder()
            .column(Column::new("solo", "only"))
            .executor(InlineExecutor)
            .build()
            .unwrap();
        store.set_active_field(Some(path("solo.only"))).unwrap();
        assert_eq!(store.next_field(), NavOutcome::Unchanged);
    }

    #[test]
    fn empty_store_is_unchanged() {
        let mut store = FormStore::builder().build().unwrap();
        assert_eq!(store.next_field(), NavOutcome::Unchanged);
    }

    #[test]
    fn set_active_field_rejects_unknown_and_skips_validation() {
        let mut store = store_with(Record::new());
        assert!(store.set_active_field(Some(path("hold.price"))).is_err());
        store.set_active_field(Some(path("buy.quantity"))).unwrap();
        store.set_active_field(Some(path("buy.price"))).unwrap();
        assert_eq!(store.field("buy", "quantity").unwrap().error, None);
        store.set_active_field(None).unwrap();
        assert!(store.get_navigation().active_field.is_none());
    }

    #[test]
    fn visited_tracking_is_per_form() {
        let mut store = valid_store();
        assert!(!store.has_visited_all_fields("buy"));
        assert!(!store.will_complete_all_fields("sell", "price"));

        store.mark_field_visited("buy", "quantity").unwrap();
        store.mark_field_visited("buy", "quantity").unwrap();
        assert!(!store.has_visited_all_fields("buy"));
        assert!(store.will_complete_all_fields("buy", "price"));
        assert!(!store.will_complete_all_fields("buy", "quantity"));

        store.mark_field_visited("buy", "price").unwrap();
        assert!(store.has_visited_all_fields("buy"));
        assert!(!store.has_visited_all_fields("sell"));
        assert!(!store.has_visited_all_fields("hold"));
        assert!(store.mark_field_visited("buy", "volume").is_err());
    }

    #[test]
    fn navigation_listeners_fire_only_on_change() {
        let mut store = valid_store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = store.subscribe_navigation(move |nav| {
            sink.borrow_mut().push(nav.active_field.clone());
        });
        store.mark_field_visited("buy", "quantity").unwrap();
        store.mark_field_visited("buy", "quantity").unwrap();
        store.set_active_field(Some(path("buy.price"))).unwrap();
        store.set_active_field(Some(path("buy.price"))).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![None, Some(path("buy.price"))]
        );
    }

    #[test]
    fn select_navigation_projects_active_form() {
        let mut store = valid_store();
        let forms = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&forms);
        let _sub = store.select_navigation(
            |nav| nav.active_form().map(str::to_string),
            move |form: &Option<String>| sink.borrow_mut().push(form.clone()),
        );
        store.set_active_field(Some(path("buy.quantity"))).unwrap();
        store.next_field();
        store.set_active_field(Some(path("sell.price"))).unwrap();
        assert_eq!(
            *forms.borrow(),
            vec![Some("buy".to_string()), Some("sell".to_string())]
        );
        assert_eq!(store.field("buy", "quantity").unwrap().value, FieldValue::from(1));
    }
}
