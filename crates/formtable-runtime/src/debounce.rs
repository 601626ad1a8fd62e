#![forbid(unsafe_code)]

//! Per-field debounce timers.
//!
//! Timers are deadlines, not threads: the host drives time by calling
//! [`Debouncer::take_due`] with the current instant (through
//! [`FormStore::tick_at`](crate::FormStore::tick_at)). Scheduling a field
//! that already has a timer replaces it, so a burst of edits collapses into
//! one validation of the last value.
//!
//! # Invariants
//!
//! 1. At most one pending timer per field.
//! 2. A timer fires no earlier than `delay` after its last (re)schedule.
//! 3. A fired or cancelled timer never fires again.

use std::collections::BTreeMap;
use std::time::Duration;

use formtable_core::{FieldPath, FieldValue};
use web_time::Instant;

#[inline]
fn duration_since_or_zero(now: Instant, earlier: Instant) -> Duration {
    now.checked_duration_since(earlier).unwrap_or(Duration::ZERO)
}

#[derive(Debug, Clone, PartialEq)]
struct PendingValidation {
    value: FieldValue,
    scheduled_at: Instant,
}

/// Deadline-based debounce keyed by field.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: BTreeMap<FieldPath, PendingValidation>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: BTreeMap::new(),
        }
    }

    /// The quiet period.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm (or re-arm) the timer for `path` with the value to validate.
    ///
    /// Returns `true` if an earlier timer was replaced.
    pub fn schedule(&mut self, path: FieldPath, value: FieldValue, now: Instant) -> bool {
        self.pending
            .insert(
                path,
                PendingValidation {
                    value,
                    scheduled_at: now,
                },
            )
            .is_some()
    }

    /// Drop the timer for `path`. Returns `true` if one was pending.
    pub fn cancel(&mut self, path: &FieldPath) -> bool {
        self.pending.remove(path).is_some()
    }

    /// Drop every timer of `form`, returning the affected paths.
    pub fn cancel_form(&mut self, form: &str) -> Vec<FieldPath> {
        let doomed: Vec<FieldPath> = self
            .pending
            .keys()
            .filter(|p| p.in_form(form))
            .cloned()
            .collect();
        for path in &doomed {
            self.pending.remove(path);
        }
        doomed
    }

    /// Drop every timer, returning the affected paths.
    pub fn cancel_all(&mut self) -> Vec<FieldPath> {
        std::mem::take(&mut self.pending).into_keys().collect()
    }

    /// Remove and return the timers whose quiet period has elapsed,
    /// oldest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<(FieldPath, FieldValue)> {
        let mut due: Vec<(Instant, FieldPath)> = self
            .pending
            .iter()
            .filter(|(_, p)| duration_since_or_zero(now, p.scheduled_at) >= self.delay)
            .map(|(path, p)| (p.scheduled_at, path.clone()))
            .collect();
        due.sort();
        due.into_iter()
            .filter_map(|(_, path)| {
                self.pending
                    .remove(&path)
                    .map(|pending| (path, pending.value))
            })
            .collect()
    }

    /// Time until the next timer fires, `None` if nothing is pending.
    #[must_use]
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.pending
            .values()
            .map(|p| {
                self.delay
                    .saturating_sub(duration_since_or_zero(now, p.scheduled_at))
            })
            .min()
    }

    /// `true` if `path` has a pending timer.
    #[must_use]
    pub fn is_pending(&self, path: &FieldPath) -> bool {
        self.pending.contains_key(path)
    }

    /// Check if any timer is pending.
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of pending timers.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
