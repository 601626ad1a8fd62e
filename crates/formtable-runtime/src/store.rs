#![forbid(unsafe_code)]

//! The form store: field state, the validation pipeline, and subscriptions.
//!
//! # Event loop
//!
//! The store is single-threaded. Time-sensitive operations come in pairs:
//! `op()` reads the clock, `op_at(now)` takes it explicitly so hosts and
//! tests stay deterministic. The host calls [`FormStore::tick`] (or
//! [`tick_at`](FormStore::tick_at)) regularly; a tick fires expired debounce
//! timers, dispatches their jobs, and applies whatever results have come
//! back. [`FormStore::time_until_next_validation`] says how long the host may
//! sleep; while jobs are in flight it never says more than
//! [`StoreConfig::result_poll`].
//!
//! ```rust
//! use std::time::Duration;
//! use formtable_core::Column;
//! use formtable_runtime::{FormStore, InlineExecutor};
//! use formtable_validation::{FieldRules, ObjectSchema};
//! use web_time::Instant;
//!
//! let mut store = FormStore::builder()
//!     .column(Column::new("buy", "quantity"))
//!     .schema("buy", ObjectSchema::new().field("quantity", FieldRules::new().min(1.0, "Min 1")))
//!     .executor(InlineExecutor)
//!     .build()
//!     .unwrap();
//!
//! let t0 = Instant::now();
//! store.set_value_at("buy", "quantity", 0, t0).unwrap();
//! assert_eq!(store.field("buy", "quantity").unwrap().error, None);
//!
//! store.tick_at(t0 + Duration::from_millis(300));
//! assert_eq!(store.field("buy", "quantity").unwrap().error.as_deref(), Some("Min 1"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use formtable_core::{Column, FieldPath, FieldValue, Record};
use formtable_validation::{AsyncValidationCoordinator, FormSchema, ValidationTrace};
use web_time::Instant;

use crate::builder::FormStoreBuilder;
use crate::config::StoreConfig;
use crate::debounce::Debouncer;
use crate::error::StoreError;
use crate::executor::{ValidationExecutor, ValidationJob, ValidationOutcome, Verdict, run_schema};
use crate::reactive::{ListenerSet, Selector, Subscription};
use crate::state::{FieldState, FormState, FormsState, NavigationState, record_of};

/// Callback receiving `(form_id, values)` when a form submits cleanly.
pub type SubmitHandler = Box<dyn FnMut(&str, Record)>;

/// Reactive state for one table row holding several forms.
pub struct FormStore {
    pub(crate) config: StoreConfig,
    pub(crate) columns: Vec<Column>,
    pub(crate) forms: Arc<FormsState>,
    pub(crate) initial: FormsState,
    pub(crate) navigation: Arc<NavigationState>,
    pub(crate) schemas: BTreeMap<String, Arc<dyn FormSchema>>,
    pub(crate) handlers: BTreeMap<String, SubmitHandler>,
    pub(crate) debouncer: Debouncer,
    pub(crate) coordinator: AsyncValidationCoordinator,
    pub(crate) executor: Box<dyn ValidationExecutor>,
    pub(crate) results_tx: Sender<ValidationOutcome>,
    pub(crate) results_rx: Receiver<ValidationOutcome>,
    pub(crate) state_listeners: ListenerSet<Arc<FormsState>>,
    pub(crate) navigation_listeners: ListenerSet<Arc<NavigationState>>,
    /// Latest instant the store has been told about.
    pub(crate) clock: Instant,
}

impl fmt::Debug for FormStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormStore")
            .field("forms", &self.forms.keys().collect::<Vec<_>>())
            .field("active_field", &self.navigation.active_field)
            .field("pending_timers", &self.debouncer.pending_count())
            .field("in_flight", &self.coordinator.in_flight_count())
            .field("listeners", &self.state_listeners.len())
            .finish()
    }
}

impl FormStore {
    /// Start configuring a store.
    #[must_use]
    pub fn builder() -> FormStoreBuilder {
        FormStoreBuilder::new()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Current snapshot of every form.
    #[must_use]
    pub fn get_state(&self) -> Arc<FormsState> {
        Arc::clone(&self.forms)
    }

    /// Current navigation snapshot.
    #[must_use]
    pub fn get_navigation(&self) -> Arc<NavigationState> {
        Arc::clone(&self.navigation)
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Configured columns in navigation order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The column for `(form_id, field)`.
    #[must_use]
    pub fn column(&self, form_id: &str, field: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.form_id == form_id && c.field == field)
    }

    /// State of one field.
    #[must_use]
    pub fn field(&self, form_id: &str, field: &str) -> Option<FieldState> {
        self.forms.get(form_id)?.get(field).cloned()
    }

    /// Values of one form, without errors.
    #[must_use]
    pub fn values(&self, form_id: &str) -> Option<Record> {
        self.forms.get(form_id).map(|form| record_of(form))
    }

    /// Values of every form.
    #[must_use]
    pub fn all_values(&self) -> BTreeMap<String, Record> {
        self.forms
            .iter()
            .map(|(id, form)| (id.clone(), record_of(form)))
            .collect()
    }

    /// `true` if any value of the form differs from its initial value.
    #[must_use]
    pub fn is_dirty(&self, form_id: &str) -> bool {
        let (Some(current), Some(initial)) = (self.forms.get(form_id), self.initial.get(form_id))
        else {
            return false;
        };
        if Arc::ptr_eq(current, initial) {
            return false;
        }
        current
            .iter()
            .any(|(name, state)| initial.get(name).map(|s| &s.value) != Some(&state.value))
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Write a value and schedule its validation.
    pub fn set_value(
        &mut self,
        form_id: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), StoreError> {
        self.set_value_at(form_id, field, value, Instant::now())
    }

    /// [`set_value`](Self::set_value) at an explicit instant.
    ///
    /// The field's current error is kept; only validation changes errors.
    pub fn set_value_at(
        &mut self,
        form_id: &str,
        field: &str,
        value: impl Into<FieldValue>,
        now: Instant,
    ) -> Result<(), StoreError> {
        let path = self.resolve(form_id, field)?;
        self.observe(now);
        let value = value.into();

        self.update_form(form_id, |form| {
            if let Some(slot) = form.get_mut(field) {
                slot.value = value.clone();
            }
        });
        tracing::trace!(form = form_id, field, kind = value.kind_name(), "value set");
        self.notify_state();

        if self.debouncer.schedule(path.clone(), value, now) {
            self.coordinator.record_cancelled(&path, now);
        }
        self.coordinator.record_scheduled(&path, now);
        Ok(())
    }

    /// Translate raw input text with the column's kind, then write it.
    pub fn set_input(&mut self, form_id: &str, field: &str, raw: &str) -> Result<(), StoreError> {
        self.set_input_at(form_id, field, raw, Instant::now())
    }

    /// [`set_input`](Self::set_input) at an explicit instant.
    pub fn set_input_at(
        &mut self,
        form_id: &str,
        field: &str,
        raw: &str,
        now: Instant,
    ) -> Result<(), StoreError> {
        let value = self
            .column(form_id, field)
            .map(|c| c.kind.parse_input(raw))
            .ok_or_else(|| StoreError::unknown_field(form_id, field))?;
        self.set_value_at(form_id, field, value, now)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Validate a field now, superseding any pending or in-flight run.
    ///
    /// Returns `true` when valid. Unknown fields are never valid.
    pub fn validate_field_sync(&mut self, form_id: &str, field: &str) -> bool {
        match self.resolve(form_id, field) {
            Ok(path) => self.validate_path_sync(&path),
            Err(_) => {
                tracing::debug!(form = form_id, field, "cannot validate unknown field");
                false
            }
        }
    }

    pub(crate) fn validate_path_sync(&mut self, path: &FieldPath) -> bool {
        let now = self.clock;
        if self.debouncer.cancel(path) {
            self.coordinator.record_cancelled(path, now);
        }
        let record = self.values(path.form()).unwrap_or_default();
        let schema = self.schemas.get(path.form()).map(|s| &**s);
        let verdict = run_schema(schema, path.field(), &record);
        let valid = verdict.is_valid();
        let token = self.coordinator.apply_sync(path, valid, now);
        tracing::trace!(
            form = path.form(),
            field = path.field(),
            token = token.raw(),
            valid,
            "validated synchronously"
        );
        self.apply_verdict(path, &verdict);
        valid
    }

    /// Validate every field of a form now, without stopping at the first
    /// failure, so each field shows its error.
    ///
    /// Returns `true` when all fields are valid. Unknown forms are never
    /// valid.
    pub fn validate_form(&mut self, form_id: &str) -> bool {
        if !self.forms.contains_key(form_id) {
            tracing::debug!(form = form_id, "cannot validate unknown form");
            return false;
        }
        let paths: Vec<FieldPath> = self.navigation.fields_of(form_id).cloned().collect();
        paths
            .iter()
            .fold(true, |valid, path| self.validate_path_sync(path) && valid)
    }

    /// Validate every field of every form now. Returns `true` when all are
    /// valid.
    pub fn validate_all(&mut self) -> bool {
        let forms: Vec<String> = self.forms.keys().cloned().collect();
        forms
            .iter()
            .fold(true, |valid, form_id| self.validate_form(form_id) && valid)
    }

    /// Fire due timers and apply finished validations, using the clock.
    pub fn tick(&mut self) -> usize {
        self.tick_at(Instant::now())
    }

    /// Fire due timers and apply finished validations at `now`.
    ///
    /// Returns the number of results applied to the store.
    pub fn tick_at(&mut self, now: Instant) -> usize {
        self.observe(now);
        for (path, value) in self.debouncer.take_due(now) {
            self.dispatch(path, value, now);
        }
        self.drain_results(now)
    }

    /// How long the host may sleep before the next tick.
    ///
    /// This is the time until the next debounce timer fires, capped at
    /// [`StoreConfig::result_poll`] while any job has not reported back.
    /// `None` means nothing is pending.
    #[must_use]
    pub fn time_until_next_validation(&self, now: Instant) -> Option<Duration> {
        let timer = self.debouncer.time_until_next(now);
        if !self.coordinator.has_in_flight() {
            return timer;
        }
        let poll = self.config.result_poll;
        Some(timer.map_or(poll, |wait| wait.min(poll)))
    }

    /// `true` while any timer is armed or any job has not reported back.
    #[must_use]
    pub fn has_pending_validation(&self) -> bool {
        self.debouncer.has_pending() || self.coordinator.has_in_flight()
    }

    /// Jobs dispatched but not yet applied or discarded.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.coordinator.in_flight_count()
    }

    /// The validation lifecycle trace.
    #[must_use]
    pub fn validation_trace(&self) -> &ValidationTrace {
        self.coordinator.trace()
    }

    /// Check the trace invariants (monotonic tokens, no stale applies).
    pub fn verify_validation_trace(&self) -> Result<(), Vec<String>> {
        self.coordinator.verify_trace()
    }

    fn dispatch(&mut self, path: FieldPath, value: FieldValue, now: Instant) {
        let Some(mut record) = self.values(path.form()) else {
            return;
        };
        record.insert(path.field().to_string(), value.clone());
        let schema = self.schemas.get(path.form()).cloned();
        let token = self.coordinator.start_validation(&path, now);
        tracing::trace!(
            form = path.form(),
            field = path.field(),
            token = token.raw(),
            "dispatching validation"
        );
        let job = ValidationJob {
            path,
            token,
            value,
            record,
            schema,
        };
        self.executor.execute(job, self.results_tx.clone());
    }

    fn drain_results(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.results_rx.try_recv() {
            if self.apply_outcome(outcome, now) {
                applied += 1;
            }
        }
        applied
    }

    fn apply_outcome(&mut self, outcome: ValidationOutcome, now: Instant) -> bool {
        let ValidationOutcome {
            path,
            token,
            value,
            verdict,
        } = outcome;
        if verdict == Verdict::Abandoned {
            if self.coordinator.abandon(&path, token, now) {
                tracing::debug!(
                    form = path.form(),
                    field = path.field(),
                    token = token.raw(),
                    "validation job dropped by executor"
                );
            }
            return false;
        }
        let value_matches = self
            .forms
            .get(path.form())
            .and_then(|form| form.get(path.field()))
            .is_some_and(|state| state.value == value);

        match self
            .coordinator
            .try_apply(&path, token, value_matches, verdict.is_valid(), now)
        {
            Ok(()) => {
                self.apply_verdict(&path, &verdict);
                true
            }
            Err(reason) => {
                tracing::debug!(
                    form = path.form(),
                    field = path.field(),
                    token = token.raw(),
                    %reason,
                    "discarding stale validation result"
                );
                false
            }
        }
    }

    fn apply_verdict(&mut self, path: &FieldPath, verdict: &Verdict) {
        if let Verdict::Failed(reason) = verdict {
            tracing::warn!(
                form = path.form(),
                field = path.field(),
                reason = reason.as_str(),
                "validator failed; showing fallback message"
            );
        }
        let error = verdict.error_message(&self.config.fallback_error);
        self.write_error(path, error);
    }

    /// Store `error` for `path`, notifying only if it changed.
    fn write_error(&mut self, path: &FieldPath, error: Option<String>) -> bool {
        let unchanged = self
            .forms
            .get(path.form())
            .and_then(|form| form.get(path.field()))
            .is_some_and(|state| state.error == error);
        if unchanged {
            return false;
        }
        self.update_form(path.form(), |form| {
            if let Some(slot) = form.get_mut(path.field()) {
                slot.error = error;
            }
        });
        self.notify_state();
        true
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Listen to field data changes.
    pub fn subscribe(&self, listener: impl FnMut(&Arc<FormsState>) + 'static) -> Subscription {
        self.state_listeners.subscribe(listener)
    }

    /// Listen to navigation changes.
    pub fn subscribe_navigation(
        &self,
        listener: impl FnMut(&Arc<NavigationState>) + 'static,
    ) -> Subscription {
        self.navigation_listeners.subscribe(listener)
    }

    /// Call `on_change` whenever `projection` of the field data changes.
    pub fn select<T: PartialEq + 'static>(
        &self,
        projection: impl Fn(&FormsState) -> T + 'static,
        mut on_change: impl FnMut(&T) + 'static,
    ) -> Subscription {
        let mut selector = Selector::<FormsState, T>::seeded(projection, &self.forms);
        self.state_listeners.subscribe(move |state: &Arc<FormsState>| {
            if selector.update(state)
                && let Some(value) = selector.get()
            {
                on_change(value);
            }
        })
    }

    /// Call `on_change` whenever `projection` of the navigation changes.
    pub fn select_navigation<T: PartialEq + 'static>(
        &self,
        projection: impl Fn(&NavigationState) -> T + 'static,
        mut on_change: impl FnMut(&T) + 'static,
    ) -> Subscription {
        let mut selector = Selector::<NavigationState, T>::seeded(projection, &self.navigation);
        self.navigation_listeners
            .subscribe(move |nav: &Arc<NavigationState>| {
                if selector.update(nav)
                    && let Some(value) = selector.get()
                {
                    on_change(value);
                }
            })
    }

    // -----------------------------------------------------------------------
    // Internals shared with navigation, submit, and reset
    // -----------------------------------------------------------------------

    pub(crate) fn resolve(&self, form_id: &str, field: &str) -> Result<FieldPath, StoreError> {
        let known = self
            .forms
            .get(form_id)
            .is_some_and(|form| form.contains_key(field));
        if !known {
            return Err(StoreError::unknown_field(form_id, field));
        }
        FieldPath::new(form_id, field).map_err(|_| StoreError::unknown_field(form_id, field))
    }

    pub(crate) fn observe(&mut self, now: Instant) {
        if now > self.clock {
            self.clock = now;
        }
    }

    /// Replace one form's snapshot. Other forms keep their `Arc`.
    pub(crate) fn update_form(&mut self, form_id: &str, update: impl FnOnce(&mut FormState)) {
        let mut forms = (*self.forms).clone();
        if let Some(slot) = forms.get_mut(form_id) {
            update(Arc::make_mut(slot));
        }
        self.forms = Arc::new(forms);
    }

    pub(crate) fn replace_form(&mut self, form_id: &str, snapshot: Arc<FormState>) {
        let mut forms = (*self.forms).clone();
        forms.insert(form_id.to_string(), snapshot);
        self.forms = Arc::new(forms);
    }

    pub(crate) fn notify_state(&self) {
        self.state_listeners.notify(&self.forms);
    }

    /// Apply `update` to a copy of the navigation state; publish and notify
    /// only if something changed.
    pub(crate) fn update_navigation(&mut self, update: impl FnOnce(&mut NavigationState)) -> bool {
        let mut next = (*self.navigation).clone();
        update(&mut next);
        if next == *self.navigation {
            return false;
        }
        self.navigation = Arc::new(next);
        self.navigation_listeners.notify(&self.navigation);
        true
    }
}
