#![forbid(unsafe_code)]

//! Store configuration.

use std::time::Duration;

/// Default quiet period before a changed field is validated.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default interval for polling results while jobs are in flight.
pub const DEFAULT_RESULT_POLL: Duration = Duration::from_millis(16);

/// Default message shown when a schema fails instead of judging the value.
pub const DEFAULT_FALLBACK_ERROR: &str = "Validation error";

/// Tunables for a [`FormStore`](crate::FormStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Quiet period after the last edit of a field before it is validated.
    pub debounce: Duration,

    /// Longest sleep hinted by
    /// [`time_until_next_validation`](crate::FormStore::time_until_next_validation)
    /// while a dispatched job has not reported back.
    pub result_poll: Duration,

    /// Error text written to a field when its schema reports an internal
    /// failure or panics.
    pub fallback_error: String,

    /// Maximum number of validation trace events kept (0 disables tracing).
    pub trace_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            result_poll: DEFAULT_RESULT_POLL,
            fallback_error: DEFAULT_FALLBACK_ERROR.to_string(),
            trace_capacity: 256,
        }
    }
}

impl StoreConfig {
    /// Set the debounce delay.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the debounce delay in milliseconds.
    #[must_use]
    pub fn with_debounce_ms(self, ms: u64) -> Self {
        self.with_debounce(Duration::from_millis(ms))
    }

    /// Set the result poll interval.
    #[must_use]
    pub fn with_result_poll(mut self, poll: Duration) -> Self {
        self.result_poll = poll;
        self
    }

    /// Set the fallback error message.
    #[must_use]
    pub fn with_fallback_error(mut self, message: impl Into<String>) -> Self {
        self.fallback_error = message.into();
        self
    }

    /// Set the trace capacity.
    #[must_use]
    pub fn with_trace_capacity(mut self, capacity: usize) -> Self {
        self.trace_capacity = capacity;
        self
    }
}
