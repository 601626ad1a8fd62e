#![forbid(unsafe_code)]

//! Store construction.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc;

use formtable_core::{Column, FieldPath, FieldValue, Record};
use formtable_validation::{AsyncValidationCoordinator, FormSchema, ObjectSchema};
use web_time::Instant;

use crate::config::StoreConfig;
use crate::debounce::Debouncer;
use crate::error::StoreError;
use crate::executor::{ThreadExecutor, ValidationExecutor};
use crate::reactive::ListenerSet;
use crate::state::{FieldState, FormState, FormsState, NavigationState};
use crate::store::{FormStore, SubmitHandler};

/// Configures and validates a [`FormStore`].
///
/// ```rust
/// use formtable_core::{Column, Record};
/// use formtable_runtime::{FormStore, StoreConfig};
///
/// let store = FormStore::builder()
///     .columns([Column::new("buy", "quantity"), Column::new("buy", "price")])
///     .on_submit("buy", |form: &str, values: Record| println!("{form}: {values:?}"))
///     .config(StoreConfig::default().with_debounce_ms(150))
///     .build()
///     .unwrap();
/// assert_eq!(store.get_navigation().fields.len(), 2);
/// ```
#[must_use]
pub struct FormStoreBuilder {
    columns: Vec<Column>,
    initial: Vec<(String, Record)>,
    schemas: BTreeMap<String, Arc<dyn FormSchema>>,
    handlers: BTreeMap<String, SubmitHandler>,
    config: StoreConfig,
    executor: Option<Box<dyn ValidationExecutor>>,
    origin: Option<Instant>,
}

impl Default for FormStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormStoreBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormStoreBuilder")
            .field("columns", &self.columns.len())
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

impl FormStoreBuilder {
    /// Empty builder with default configuration.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            initial: Vec::new(),
            schemas: BTreeMap::new(),
            handlers: BTreeMap::new(),
            config: StoreConfig::default(),
            executor: None,
            origin: None,
        }
    }

    /// Append columns; their order is the navigation order.
    pub fn columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Append one column.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Initial values of a form. Fields left out start as `Null`.
    ///
    /// Reset restores these values.
    pub fn initial_values(mut self, form_id: impl Into<String>, values: Record) -> Self {
        self.initial.push((form_id.into(), values));
        self
    }

    /// Schema used to validate a form's fields.
    pub fn schema(mut self, form_id: impl Into<String>, schema: impl FormSchema + 'static) -> Self {
        self.schemas.insert(form_id.into(), Arc::new(schema));
        self
    }

    /// Handler called with a form's values when it submits cleanly.
    pub fn on_submit(
        mut self,
        form_id: impl Into<String>,
        handler: impl FnMut(&str, Record) + 'static,
    ) -> Self {
        self.handlers.insert(form_id.into(), Box::new(handler));
        self
    }

    /// Replace the configuration.
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Where validation jobs run. Defaults to [`ThreadExecutor`].
    pub fn executor(mut self, executor: impl ValidationExecutor + 'static) -> Self {
        self.executor = Some(Box::new(executor));
        self
    }

    /// Time origin of the validation trace. Defaults to build time.
    pub fn origin(mut self, origin: Instant) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Check the configuration and create the store.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidIdentifier`] for an empty id or one containing `.`
    /// - [`StoreError::DuplicateColumn`] for a repeated (form, field) pair
    /// - [`StoreError::UnknownForm`] / [`StoreError::UnknownField`] for initial
    ///   values, schemas, or handlers naming something no column defines
    pub fn build(self) -> Result<FormStore, StoreError> {
        let mut fields: Vec<FieldPath> = Vec::with_capacity(self.columns.len());
        let mut seen: BTreeSet<FieldPath> = BTreeSet::new();
        let mut forms: BTreeMap<String, FormState> = BTreeMap::new();

        for column in &self.columns {
            let path = column.path()?;
            if !seen.insert(path.clone()) {
                return Err(StoreError::DuplicateColumn(path));
            }
            forms
                .entry(column.form_id.clone())
                .or_default()
                .insert(column.field.clone(), FieldState::default());
            fields.push(path);
        }

        for (form_id, values) in self.initial {
            let form = forms
                .get_mut(&form_id)
                .ok_or_else(|| StoreError::UnknownForm(form_id.clone()))?;
            for (field, value) in values {
                let slot = form
                    .get_mut(&field)
                    .ok_or_else(|| StoreError::unknown_field(&form_id, &field))?;
                slot.value = value;
            }
        }

        for form_id in self.schemas.keys().chain(self.handlers.keys()) {
            if !forms.contains_key(form_id) {
                return Err(StoreError::UnknownForm(form_id.clone()));
            }
        }

        let mut schemas = self.schemas;
        for form_id in forms.keys() {
            if schemas.contains_key(form_id) {
                continue;
            }
            let derived = ObjectSchema::from_columns(form_id, &self.columns);
            if !derived.is_empty() {
                tracing::debug!(form = %form_id, fields = derived.len(), "schema derived from columns");
                schemas.insert(form_id.clone(), Arc::new(derived));
            }
        }

        let initial: FormsState = forms
            .into_iter()
            .map(|(id, form)| (id, Arc::new(form)))
            .collect();
        let origin = self.origin.unwrap_or_else(Instant::now);
        let (results_tx, results_rx) = mpsc::channel();

        tracing::debug!(
            forms = initial.len(),
            fields = fields.len(),
            debounce_ms = u64::try_from(self.config.debounce.as_millis()).unwrap_or(u64::MAX),
            "form store built"
        );

        Ok(FormStore {
            forms: Arc::new(initial.clone()),
            initial,
            navigation: Arc::new(NavigationState {
                active_field: None,
                fields,
                visited_fields: BTreeSet::new(),
            }),
            columns: self.columns,
            schemas,
            handlers: self.handlers,
            debouncer: Debouncer::new(self.config.debounce),
            coordinator: AsyncValidationCoordinator::with_origin(origin, self.config.trace_capacity),
            executor: self
                .executor
                .unwrap_or_else(|| Box::new(ThreadExecutor::new())),
            results_tx,
            results_rx,
            state_listeners: ListenerSet::new(),
            navigation_listeners: ListenerSet::new(),
            clock: origin,
            config: self.config,
        })
    }
}

/// Shorthand for building a [`Record`] from pairs.
///
/// ```rust
/// use formtable_runtime::record;
///
/// let r = record([("quantity", 100.into()), ("price", 10.5.into())]);
/// assert_eq!(r.len(), 2);
/// ```
pub fn record<'a>(pairs: impl IntoIterator<Item = (&'a str, FieldValue)>) -> Record {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
