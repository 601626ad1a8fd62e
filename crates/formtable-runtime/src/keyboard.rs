#![forbid(unsafe_code)]

//! Keyboard and focus events coming from the rendering layer.
//!
//! | key | active field | effect |
//! |---|---|---|
//! | `Tab` | some | mark visited, [`next_field`](FormStore::next_field) |
//! | `BackTab` | some | mark visited, [`previous_field`](FormStore::previous_field) |
//! | `Enter` | last unvisited of its form | mark visited, [`submit`](FormStore::submit) |
//! | `Enter` | otherwise | mark visited, `next_field` |
//! | `Escape` | some | reset the active form |
//! | `Tab` / `Enter` | none | focus the first field |

use formtable_core::FieldPath;

use crate::error::StoreError;
use crate::navigation::NavOutcome;
use crate::store::FormStore;
use crate::submit::SubmitOutcome;

/// Keys the store reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKey {
    Tab,
    BackTab,
    Enter,
    Escape,
}

/// What a key did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Navigated(NavOutcome),
    Submitted(SubmitOutcome),
    Reset { form: String },
    Ignored,
}

impl FormStore {
    /// Route a key press.
    pub fn handle_key(&mut self, key: FormKey) -> KeyOutcome {
        let Some(active) = self.navigation.active_field.clone() else {
            return match key {
                FormKey::Tab | FormKey::Enter => KeyOutcome::Navigated(self.next_field()),
                FormKey::BackTab | FormKey::Escape => KeyOutcome::Ignored,
            };
        };
        tracing::trace!(?key, field = %active, "key");

        match key {
            FormKey::Tab => {
                self.visit(&active);
                KeyOutcome::Navigated(self.next_field())
            }
            FormKey::BackTab => {
                self.visit(&active);
                KeyOutcome::Navigated(self.previous_field())
            }
            FormKey::Enter => {
                let completes = self.will_complete_all_fields(active.form(), active.field());
                self.visit(&active);
                if completes {
                    KeyOutcome::Submitted(self.submit())
                } else {
                    KeyOutcome::Navigated(self.next_field())
                }
            }
            FormKey::Escape => {
                let form = active.form().to_string();
                match self.reset(Some(&form)) {
                    Ok(()) => KeyOutcome::Reset { form },
                    Err(_) => KeyOutcome::Ignored,
                }
            }
        }
    }

    /// Focus moved into `path`: make it active and mark it visited.
    pub fn focus_field(&mut self, path: FieldPath) -> Result<(), StoreError> {
        if !self.navigation.contains(&path) {
            return Err(StoreError::unknown_field(path.form(), path.field()));
        }
        self.update_navigation(|nav| {
            nav.visited_fields.insert(path.clone());
            nav.active_field = Some(path);
        });
        Ok(())
    }

    /// Focus left a field of `form_id`.
    ///
    /// `left_form` says whether focus went outside the form altogether, in
    /// which case the form is reset. Returns whether a reset happened.
    pub fn focus_left(&mut self, form_id: &str, left_form: bool) -> Result<bool, StoreError> {
        if !self.initial.contains_key(form_id) {
            return Err(StoreError::UnknownForm(form_id.to_string()));
        }
        if !left_form {
            return Ok(false);
        }
        tracing::debug!(form = form_id, "focus left form");
        self.reset(Some(form_id))?;
        Ok(true)
    }

    fn visit(&mut self, path: &FieldPath) {
        self.update_navigation(|nav| {
            nav.visited_fields.insert(path.clone());
        });
    }
}
