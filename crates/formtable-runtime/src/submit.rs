#![forbid(unsafe_code)]

//! Submitting the active field's form.

use formtable_core::FieldPath;

use crate::store::FormStore;

/// Result of [`FormStore::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing is focused, so there is no form to submit.
    NoActiveField,
    /// `field` failed validation and now has focus.
    Blocked { field: FieldPath },
    /// The form's handler received its values.
    Submitted { form: String },
    /// The form validated but has no handler.
    NoHandler { form: String },
}

impl SubmitOutcome {
    /// `true` if the form passed validation (with or without a handler).
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Submitted { .. } | Self::NoHandler { .. })
    }
}

impl FormStore {
    /// Validate every field of the active field's form, in column order.
    ///
    /// The first invalid field takes focus and submission stops there.
    /// Otherwise the form's values go to its submit handler. Other forms
    /// are neither validated nor submitted.
    pub fn submit(&mut self) -> SubmitOutcome {
        let Some(active) = self.navigation.active_field.clone() else {
            tracing::debug!("submit ignored: no active field");
            return SubmitOutcome::NoActiveField;
        };
        let form = active.form().to_string();
        let scoped: Vec<FieldPath> = self.navigation.fields_of(&form).cloned().collect();

        for path in scoped {
            if !self.validate_path_sync(&path) {
                tracing::debug!(form = %form, field = path.field(), "submit blocked");
                self.update_navigation(|nav| nav.active_field = Some(path.clone()));
                return SubmitOutcome::Blocked { field: path };
            }
        }

        let values = self.values(&form).unwrap_or_default();
        match self.handlers.get_mut(&form) {
            Some(handler) => {
                tracing::debug!(form = %form, fields = values.len(), "submitting form");
                handler(&form, values);
                SubmitOutcome::Submitted { form }
            }
            None => {
                tracing::debug!(form = %form, "form is valid but has no submit handler");
                SubmitOutcome::NoHandler { form }
            }
        }
    }
}
