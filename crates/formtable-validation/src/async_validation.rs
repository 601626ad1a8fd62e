#![forbid(unsafe_code)]

//! Token-based staleness bookkeeping for per-field asynchronous validation.
//!
//! Every validation run, synchronous or not, is issued a [`ValidationToken`]
//! from one monotonic counter. For each [`FieldPath`] the coordinator
//! remembers the newest token whose result reached the store. A late result
//! is applied only when it is newer than that and the caller confirms the
//! field still holds the value that was validated.
//!
//! # Design Principles
//!
//! 1. **Monotonic Tokens**: one counter for all fields, so tokens also order
//!    events across fields in the trace.
//! 2. **Last Applied Wins**: an older token never overwrites a newer result,
//!    whatever order the workers finish in.
//! 3. **Event Tracing**: the whole lifecycle (scheduled, cancelled, started,
//!    applied, discarded, sync) is recorded in a bounded [`ValidationTrace`].
//! 4. **Golden Trace Support**: traces can be checksummed for regression tests.
//!
//! # Example
//!
//! ```rust
//! use formtable_core::FieldPath;
//! use web_time::Instant;
//! use formtable_validation::{AsyncValidationCoordinator, StaleReason};
//!
//! let origin = Instant::now();
//! let mut coordinator = AsyncValidationCoordinator::with_origin(origin, 64);
//! let path = FieldPath::new("buy", "quantity").unwrap();
//!
//! let first = coordinator.start_validation(&path, origin);
//! let second = coordinator.start_validation(&path, origin);
//!
//! // The newer run lands first; the older one is then stale.
//! assert!(coordinator.try_apply(&path, second, true, false, origin).is_ok());
//! assert_eq!(
//!     coordinator.try_apply(&path, first, true, true, origin),
//!     Err(StaleReason::Superseded)
//! );
//! assert!(coordinator.verify_trace().is_ok());
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use formtable_core::FieldPath;
use web_time::Instant;

// ---------------------------------------------------------------------------
// ValidationToken
// ---------------------------------------------------------------------------

/// A monotonically increasing token representing one validation run.
///
/// # Invariants
///
/// - Tokens are strictly monotonic: `token_n < token_{n+1}`
/// - Token 0 is reserved for "no validation"
/// - Tokens never wrap (u64 provides sufficient headroom)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValidationToken(u64);

impl ValidationToken {
    /// The null token representing no validation.
    pub const NONE: Self = Self(0);

    /// Create a token from a raw value (for testing).
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw token value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Check if this is the null token.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl Default for ValidationToken {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for ValidationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ValidationEvent
// ---------------------------------------------------------------------------

/// Why a completed validation was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaleReason {
    /// The field's value changed after the run was dispatched.
    ValueChanged,
    /// A newer run for the field was already applied.
    Superseded,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ValueChanged => "value_changed",
            Self::Superseded => "superseded",
        })
    }
}

/// An event in the validation lifecycle of one field.
///
/// `elapsed_ns` is measured from the coordinator's origin, so traces built
/// from explicit instants are reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValidationEvent {
    /// A debounce timer was armed.
    Scheduled { path: FieldPath, elapsed_ns: u64 },

    /// A pending debounce timer was dropped before firing.
    Cancelled { path: FieldPath, elapsed_ns: u64 },

    /// A validation job was dispatched.
    Started {
        path: FieldPath,
        token: ValidationToken,
        elapsed_ns: u64,
    },

    /// A job's result was written to the store.
    Applied {
        path: FieldPath,
        token: ValidationToken,
        is_valid: bool,
        elapsed_ns: u64,
    },

    /// A job's result was thrown away.
    StaleDiscarded {
        path: FieldPath,
        token: ValidationToken,
        reason: StaleReason,
        /// The newest applied token for the path when the result arrived.
        last_applied: ValidationToken,
        elapsed_ns: u64,
    },

    /// The field was validated synchronously; always applied.
    SyncValidated {
        path: FieldPath,
        token: ValidationToken,
        is_valid: bool,
        elapsed_ns: u64,
    },

    /// The field was reset; results of earlier runs are now stale.
    Invalidated {
        path: FieldPath,
        token: ValidationToken,
        elapsed_ns: u64,
    },

    /// A dispatched job was dropped by its executor and will never report.
    Abandoned {
        path: FieldPath,
        token: ValidationToken,
        elapsed_ns: u64,
    },
}

impl ValidationEvent {
    /// The field this event is about.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        match self {
            Self::Scheduled { path, .. }
            | Self::Cancelled { path, .. }
            | Self::Started { path, .. }
            | Self::Applied { path, .. }
            | Self::StaleDiscarded { path, .. }
            | Self::SyncValidated { path, .. }
            | Self::Invalidated { path, .. }
            | Self::Abandoned { path, .. } => path,
        }
    }

    /// The token, for events that carry one.
    #[must_use]
    pub fn token(&self) -> Option<ValidationToken> {
        match self {
            Self::Scheduled { .. } | Self::Cancelled { .. } => None,
            Self::Started { token, .. }
            | Self::Applied { token, .. }
            | Self::StaleDiscarded { token, .. }
            | Self::SyncValidated { token, .. }
            | Self::Invalidated { token, .. }
            | Self::Abandoned { token, .. } => Some(*token),
        }
    }

    /// Get the event type name for logging.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Scheduled { .. } => "scheduled",
            Self::Cancelled { .. } => "cancelled",
            Self::Started { .. } => "started",
            Self::Applied { .. } => "applied",
            Self::StaleDiscarded { .. } => "stale_discarded",
            Self::SyncValidated { .. } => "sync_validated",
            Self::Invalidated { .. } => "invalidated",
            Self::Abandoned { .. } => "abandoned",
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationTrace
// ---------------------------------------------------------------------------

/// A bounded log of validation events.
///
/// When full, the oldest event is evicted. A capacity of zero records
/// nothing.
#[derive(Debug, Clone)]
pub struct ValidationTrace {
    events: VecDeque<ValidationEvent>,
    capacity: usize,
    evicted: u64,
}

impl Default for ValidationTrace {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl ValidationTrace {
    /// Create an empty trace holding at most `capacity` events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            evicted: 0,
        }
    }

    /// Add an event, evicting the oldest if full.
    pub fn push(&mut self, event: ValidationEvent) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.evicted += 1;
        }
        self.events.push_back(event);
    }

    /// Iterate events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &ValidationEvent> {
        self.events.iter()
    }

    /// Events about one field, oldest first.
    #[must_use]
    pub fn events_for(&self, path: &FieldPath) -> Vec<&ValidationEvent> {
        self.events.iter().filter(|e| e.path() == path).collect()
    }

    /// Event type names for one field, oldest first.
    #[must_use]
    pub fn event_types_for(&self, path: &FieldPath) -> Vec<&'static str> {
        self.events
            .iter()
            .filter(|e| e.path() == path)
            .map(ValidationEvent::event_type)
            .collect()
    }

    /// Count events of a type across all fields.
    #[must_use]
    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }

    /// Compute a checksum of the trace for golden comparison.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for event in &self.events {
            event.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the trace is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events dropped because the trace was full.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Clear all events from the trace.
    pub fn clear(&mut self) {
        self.events.clear();
        self.evicted = 0;
    }

    /// Verify trace invariants.
    ///
    /// Returns a list of violations if any invariants are broken.
    #[must_use]
    pub fn verify_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        // Issued tokens are monotonic across the whole trace.
        let mut last_issued = ValidationToken::NONE;
        // Per field, applied tokens only move forward.
        let mut applied: BTreeMap<&FieldPath, ValidationToken> = BTreeMap::new();

        for event in &self.events {
            match event {
                ValidationEvent::Started { token, .. }
                | ValidationEvent::SyncValidated { token, .. }
                | ValidationEvent::Invalidated { token, .. } => {
                    if *token <= last_issued {
                        violations.push(format!(
                            "Non-monotonic token: {token} after {last_issued}"
                        ));
                    }
                    last_issued = *token;
                }
                _ => {}
            }

            match event {
                ValidationEvent::Applied { path, token, .. }
                | ValidationEvent::SyncValidated { path, token, .. }
                | ValidationEvent::Invalidated { path, token, .. } => {
                    let prev = applied.insert(path, *token).unwrap_or_default();
                    if *token <= prev {
                        violations.push(format!(
                            "{path}: applied {token} after newer {prev}"
                        ));
                    }
                }
                ValidationEvent::StaleDiscarded {
                    path,
                    token,
                    reason: StaleReason::Superseded,
                    last_applied,
                    ..
                } if token > last_applied => {
                    violations.push(format!(
                        "{path}: superseded discard of {token} newer than {last_applied}"
                    ));
                }
                _ => {}
            }
        }

        violations
    }
}

// ---------------------------------------------------------------------------
// AsyncValidationCoordinator
// ---------------------------------------------------------------------------

/// A dispatched validation that has not reported back yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlightValidation {
    /// The token for this run.
    pub token: ValidationToken,
    /// When the run was dispatched.
    pub started_at: Instant,
}

#[derive(Debug, Default)]
struct FieldLedger {
    last_applied: ValidationToken,
    in_flight: Vec<InFlightValidation>,
}

/// Issues tokens and decides which results may be applied, per field.
///
/// # Thread Safety
///
/// Single-threaded by design: the owner thread issues tokens and applies
/// results; workers only carry a token back with their result.
pub struct AsyncValidationCoordinator {
    next_token: u64,
    fields: BTreeMap<FieldPath, FieldLedger>,
    trace: ValidationTrace,
    origin: Instant,
}

impl fmt::Debug for AsyncValidationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncValidationCoordinator")
            .field("next_token", &self.next_token)
            .field("in_flight_count", &self.in_flight_count())
            .field("trace_events", &self.trace.len())
            .finish()
    }
}

impl Default for AsyncValidationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncValidationCoordinator {
    /// Create a coordinator whose trace times are relative to now.
    #[must_use]
    pub fn new() -> Self {
        Self::with_origin(Instant::now(), 256)
    }

    /// Create a coordinator with an explicit time origin and trace capacity.
    #[must_use]
    pub fn with_origin(origin: Instant, trace_capacity: usize) -> Self {
        Self {
            next_token: 1,
            fields: BTreeMap::new(),
            trace: ValidationTrace::with_capacity(trace_capacity),
            origin,
        }
    }

    fn elapsed_ns(&self, now: Instant) -> u64 {
        u64::try_from(now.saturating_duration_since(self.origin).as_nanos()).unwrap_or(u64::MAX)
    }

    fn issue(&mut self) -> ValidationToken {
        let token = ValidationToken(self.next_token);
        self.next_token += 1;
        token
    }

    /// Record that a debounce timer was armed for `path`.
    pub fn record_scheduled(&mut self, path: &FieldPath, now: Instant) {
        let elapsed_ns = self.elapsed_ns(now);
        self.trace.push(ValidationEvent::Scheduled {
            path: path.clone(),
            elapsed_ns,
        });
    }

    /// Record that a pending debounce timer for `path` was dropped.
    pub fn record_cancelled(&mut self, path: &FieldPath, now: Instant) {
        let elapsed_ns = self.elapsed_ns(now);
        self.trace.push(ValidationEvent::Cancelled {
            path: path.clone(),
            elapsed_ns,
        });
    }

    /// Issue a token for an asynchronous run and mark it in flight.
    pub fn start_validation(&mut self, path: &FieldPath, now: Instant) -> ValidationToken {
        let token = self.issue();
        let elapsed_ns = self.elapsed_ns(now);
        self.fields
            .entry(path.clone())
            .or_default()
            .in_flight
            .push(InFlightValidation {
                token,
                started_at: now,
            });
        self.trace.push(ValidationEvent::Started {
            path: path.clone(),
            token,
            elapsed_ns,
        });
        token
    }

    /// Decide whether a finished run may be applied.
    ///
    /// `value_matches` is the caller's check that the field still holds the
    /// value the run validated. The run leaves the in-flight set either way.
    pub fn try_apply(
        &mut self,
        path: &FieldPath,
        token: ValidationToken,
        value_matches: bool,
        is_valid: bool,
        now: Instant,
    ) -> Result<(), StaleReason> {
        let elapsed_ns = self.elapsed_ns(now);
        let ledger = self.fields.entry(path.clone()).or_default();
        ledger.in_flight.retain(|v| v.token != token);

        let stale = if token <= ledger.last_applied {
            Some(StaleReason::Superseded)
        } else if !value_matches {
            Some(StaleReason::ValueChanged)
        } else {
            None
        };

        match stale {
            Some(reason) => {
                let last_applied = ledger.last_applied;
                self.trace.push(ValidationEvent::StaleDiscarded {
                    path: path.clone(),
                    token,
                    reason,
                    last_applied,
                    elapsed_ns,
                });
                Err(reason)
            }
            None => {
                ledger.last_applied = token;
                self.trace.push(ValidationEvent::Applied {
                    path: path.clone(),
                    token,
                    is_valid,
                    elapsed_ns,
                });
                Ok(())
            }
        }
    }

    /// Record a synchronous run. It is applied unconditionally and
    /// supersedes everything in flight for the field.
    pub fn apply_sync(&mut self, path: &FieldPath, is_valid: bool, now: Instant) -> ValidationToken {
        let token = self.issue();
        let elapsed_ns = self.elapsed_ns(now);
        self.fields.entry(path.clone()).or_default().last_applied = token;
        self.trace.push(ValidationEvent::SyncValidated {
            path: path.clone(),
            token,
            is_valid,
            elapsed_ns,
        });
        token
    }

    /// Make every earlier run for `path` stale (used on reset).
    pub fn invalidate(&mut self, path: &FieldPath, now: Instant) -> ValidationToken {
        let token = self.issue();
        let elapsed_ns = self.elapsed_ns(now);
        self.fields.entry(path.clone()).or_default().last_applied = token;
        self.trace.push(ValidationEvent::Invalidated {
            path: path.clone(),
            token,
            elapsed_ns,
        });
        token
    }

    /// Forget a run that will never report back.
    ///
    /// Returns `false` if `token` was not in flight for `path`.
    pub fn abandon(&mut self, path: &FieldPath, token: ValidationToken, now: Instant) -> bool {
        let elapsed_ns = self.elapsed_ns(now);
        let Some(ledger) = self.fields.get_mut(path) else {
            return false;
        };
        let before = ledger.in_flight.len();
        ledger.in_flight.retain(|v| v.token != token);
        if ledger.in_flight.len() == before {
            return false;
        }
        self.trace.push(ValidationEvent::Abandoned {
            path: path.clone(),
            token,
            elapsed_ns,
        });
        true
    }

    /// Newest applied token for `path`.
    #[must_use]
    pub fn last_applied(&self, path: &FieldPath) -> ValidationToken {
        self.fields
            .get(path)
            .map_or(ValidationToken::NONE, |l| l.last_applied)
    }

    /// Runs for `path` that have not reported back.
    #[must_use]
    pub fn in_flight(&self, path: &FieldPath) -> &[InFlightValidation] {
        self.fields.get(path).map_or(&[], |l| l.in_flight.as_slice())
    }

    /// Total runs in flight across all fields.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.fields.values().map(|l| l.in_flight.len()).sum()
    }

    /// Check if there are any in-flight validations.
    #[must_use]
    pub fn has_in_flight(&self) -> bool {
        self.fields.values().any(|l| !l.in_flight.is_empty())
    }

    /// Get the event trace.
    #[must_use]
    pub fn trace(&self) -> &ValidationTrace {
        &self.trace
    }

    /// Clear the trace (for reuse).
    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Verify that the trace satisfies all invariants.
    ///
    /// Returns `Ok(())` if valid, or `Err` with violation descriptions.
    pub fn verify_trace(&self) -> Result<(), Vec<String>> {
        let violations = self.trace.verify_invariants();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
