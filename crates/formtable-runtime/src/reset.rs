#![forbid(unsafe_code)]

//! Restoring forms to their initial values.

use std::sync::Arc;

use formtable_core::FieldPath;

use crate::error::StoreError;
use crate::store::FormStore;

impl FormStore {
    /// Reset one form (`Some`) or every form (`None`).
    ///
    /// Pending timers are dropped and in-flight results for the affected
    /// fields become stale. Values and errors return to the initial
    /// snapshot, visited marks are cleared, and focus is cleared if it was
    /// inside an affected form.
    pub fn reset(&mut self, form_id: Option<&str>) -> Result<(), StoreError> {
        match form_id {
            Some(form_id) => {
                if !self.initial.contains_key(form_id) {
                    return Err(StoreError::UnknownForm(form_id.to_string()));
                }
                let cancelled = self.debouncer.cancel_form(form_id);
                self.record_cancelled(&cancelled);
                self.restore_form(form_id);
                self.notify_state();
                self.update_navigation(|nav| {
                    nav.visited_fields.retain(|p| !p.in_form(form_id));
                    if nav.active_field.as_ref().is_some_and(|p| p.in_form(form_id)) {
                        nav.active_field = None;
                    }
                });
                tracing::debug!(form = form_id, "form reset");
            }
            None => {
                let cancelled = self.debouncer.cancel_all();
                self.record_cancelled(&cancelled);
                let forms: Vec<String> = self.initial.keys().cloned().collect();
                for form_id in &forms {
                    self.restore_form(form_id);
                }
                self.notify_state();
                self.update_navigation(|nav| {
                    nav.visited_fields.clear();
                    nav.active_field = None;
                });
                tracing::debug!(forms = forms.len(), "all forms reset");
            }
        }
        Ok(())
    }

    fn record_cancelled(&mut self, paths: &[FieldPath]) {
        let now = self.clock;
        for path in paths {
            self.coordinator.record_cancelled(path, now);
        }
    }

    fn restore_form(&mut self, form_id: &str) {
        let now = self.clock;
        let paths: Vec<_> = self.navigation.fields_of(form_id).cloned().collect();
        for path in &paths {
            self.coordinator.invalidate(path, now);
        }
        if let Some(initial) = self.initial.get(form_id) {
            let initial = Arc::clone(initial);
            self.replace_form(form_id, initial);
        }
    }
}
