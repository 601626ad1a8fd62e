#![forbid(unsafe_code)]

//! formtable runtime
//!
//! A reactive state store for one table row that holds several independent
//! forms (a "buy" and a "sell" form, say) whose fields interleave as
//! columns.
//!
//! # Key Components
//!
//! - [`FormStore`] - field values and errors, immutable per-form snapshots
//! - [`FormStoreBuilder`] - columns, initial values, schemas, submit handlers
//! - [`Debouncer`] - per-field timers; only the last edit in a burst validates
//! - [`ValidationExecutor`] - where validation jobs run ([`ThreadExecutor`],
//!   [`InlineExecutor`], [`QueuedExecutor`])
//! - [`NavOutcome`] / [`SubmitOutcome`] / [`KeyOutcome`] - results of the
//!   navigation state machine, submission and keyboard handling
//! - [`Subscription`] / [`Selector`] - change listeners and projections
//! - [`StoreContext`] - weak handles for components sharing a store
//!
//! # How it fits
//!
//! `formtable-core` supplies values, paths and columns. `formtable-validation`
//! supplies schemas and the token bookkeeping that keeps stale results out.
//! This crate owns the state and drives everything from the host's event
//! loop through [`FormStore::tick`].

pub mod builder;
pub mod config;
pub mod context;
pub mod debounce;
pub mod error;
pub mod executor;
pub mod keyboard;
pub mod navigation;
pub mod reactive;
mod reset;
pub mod state;
pub mod store;
pub mod submit;

pub use builder::{FormStoreBuilder, record};
pub use config::{DEFAULT_DEBOUNCE, DEFAULT_FALLBACK_ERROR, DEFAULT_RESULT_POLL, StoreConfig};
pub use context::{SharedFormStore, StoreContext};
pub use debounce::Debouncer;
pub use error::StoreError;
pub use executor::{
    InlineExecutor, QueuedExecutor, ThreadExecutor, ValidationExecutor, ValidationJob,
    ValidationOutcome, Verdict,
};
pub use keyboard::{FormKey, KeyOutcome};
pub use navigation::NavOutcome;
pub use reactive::{ListenerSet, Selector, Subscription};
pub use state::{FieldState, FormState, FormsState, NavigationState};
pub use store::{FormStore, SubmitHandler};
pub use submit::SubmitOutcome;
