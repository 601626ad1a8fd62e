#![forbid(unsafe_code)]

//! Where validation jobs run.
//!
//! A [`ValidationJob`] owns everything it needs: the form's values, the
//! schema, and the token it was issued. It never references the store.
//! Executors run the job somewhere and send the [`ValidationOutcome`] back
//! over an `mpsc` channel; the store drains that channel on its own thread
//! during [`tick`](crate::FormStore::tick).
//!
//! | executor | runs jobs | use |
//! |---|---|---|
//! | [`ThreadExecutor`] | one background thread per job | default |
//! | [`InlineExecutor`] | immediately on the dispatching thread | simple hosts |
//! | [`QueuedExecutor`] | when the host releases them | deterministic tests |

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use formtable_core::{FieldPath, FieldValue, Record};
use formtable_validation::{FormSchema, SchemaError, ValidationToken};

/// What a schema said about one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The value passed.
    Valid,
    /// The value failed; the message is shown as-is.
    Invalid(String),
    /// The schema failed or panicked; the store shows its fallback message.
    Failed(String),
    /// The executor dropped the job without running it.
    Abandoned,
}

impl Verdict {
    /// `true` for [`Verdict::Valid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The error text to store for this verdict.
    #[must_use]
    pub fn error_message(&self, fallback: &str) -> Option<String> {
        match self {
            Self::Valid | Self::Abandoned => None,
            Self::Invalid(message) => Some(message.clone()),
            Self::Failed(_) => Some(fallback.to_string()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `schema` for `field`, turning errors and panics into a [`Verdict`].
///
/// No schema means there is nothing to violate.
pub(crate) fn run_schema(
    schema: Option<&dyn FormSchema>,
    field: &str,
    record: &Record,
) -> Verdict {
    let Some(schema) = schema else {
        tracing::debug!(field, "no schema registered; field treated as valid");
        return Verdict::Valid;
    };
    match catch_unwind(AssertUnwindSafe(|| schema.validate_field(field, record))) {
        Ok(Ok(())) => Verdict::Valid,
        Ok(Err(SchemaError::Invalid(err))) => Verdict::Invalid(err.format_message()),
        Ok(Err(SchemaError::Internal(reason))) => Verdict::Failed(reason),
        Err(payload) => Verdict::Failed(format!("panic: {}", panic_message(payload.as_ref()))),
    }
}

/// One dispatched validation.
pub struct ValidationJob {
    /// Field being validated.
    pub path: FieldPath,
    /// Token issued at dispatch.
    pub token: ValidationToken,
    /// The value captured when the timer was armed.
    pub value: FieldValue,
    /// The form's values, with `value` in place for `path`.
    pub record: Record,
    /// The form's schema, if it has one.
    pub schema: Option<Arc<dyn FormSchema>>,
}

impl ValidationJob {
    /// Validate and package the result.
    #[must_use]
    pub fn run(self) -> ValidationOutcome {
        let verdict = run_schema(self.schema.as_deref(), self.path.field(), &self.record);
        ValidationOutcome {
            path: self.path,
            token: self.token,
            value: self.value,
            verdict,
        }
    }

    /// Package the job as dropped without running it.
    #[must_use]
    pub fn abandon(self) -> ValidationOutcome {
        ValidationOutcome {
            path: self.path,
            token: self.token,
            value: self.value,
            verdict: Verdict::Abandoned,
        }
    }

    /// Run and send the outcome. A closed channel means the store is gone,
    /// so the result is dropped.
    pub fn run_and_send(self, results: &Sender<ValidationOutcome>) {
        let _ = results.send(self.run());
    }
}

impl fmt::Debug for ValidationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationJob")
            .field("path", &self.path)
            .field("token", &self.token)
            .field("value", &self.value)
            .field("has_schema", &self.schema.is_some())
            .finish()
    }
}

/// A finished validation on its way back to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// Field that was validated.
    pub path: FieldPath,
    /// Token issued at dispatch.
    pub token: ValidationToken,
    /// The value that was validated.
    pub value: FieldValue,
    /// The schema's answer.
    pub verdict: Verdict,
}

/// Runs validation jobs.
pub trait ValidationExecutor {
    /// Run `job` and eventually send its outcome on `results`.
    fn execute(&self, job: ValidationJob, results: Sender<ValidationOutcome>);
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// One detached background thread per job.
///
/// Results only reach the store on [`tick`](crate::FormStore::tick). A host
/// that sleeps until woken can pass a waker, called on the worker thread
/// after each result is sent.
#[derive(Clone, Default)]
pub struct ThreadExecutor {
    waker: Option<Waker>,
}

impl ThreadExecutor {
    /// Executor without a waker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor that calls `waker` after every finished job.
    #[must_use]
    pub fn with_waker(waker: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            waker: Some(Arc::new(waker)),
        }
    }
}

impl ValidationExecutor for ThreadExecutor {
    fn execute(&self, job: ValidationJob, results: Sender<ValidationOutcome>) {
        tracing::trace!(path = %job.path, token = job.token.raw(), "spawning validation thread");
        let waker = self.waker.clone();
        thread::spawn(move || {
            job.run_and_send(&results);
            if let Some(wake) = waker {
                wake();
            }
        });
    }
}

impl fmt::Debug for ThreadExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadExecutor")
            .field("has_waker", &self.waker.is_some())
            .finish()
    }
}

/// Runs jobs immediately on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl ValidationExecutor for InlineExecutor {
    fn execute(&self, job: ValidationJob, results: Sender<ValidationOutcome>) {
        job.run_and_send(&results);
    }
}

type Queued = (ValidationJob, Sender<ValidationOutcome>);

/// Holds jobs until the host releases them, in any order.
///
/// Clones share one queue: hand one clone to the store and keep another to
/// drive it.
#[derive(Clone, Default)]
pub struct QueuedExecutor {
    queue: Rc<RefCell<VecDeque<Queued>>>,
}

impl QueuedExecutor {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Paths of waiting jobs, oldest first.
    #[must_use]
    pub fn pending_paths(&self) -> Vec<FieldPath> {
        self.queue
            .borrow()
            .iter()
            .map(|(job, _)| job.path.clone())
            .collect()
    }

    /// Run the oldest job. Returns `false` if none was waiting.
    pub fn release_next(&self) -> bool {
        let next = self.queue.borrow_mut().pop_front();
        Self::release(next)
    }

    /// Run the newest job. Returns `false` if none was waiting.
    pub fn release_last(&self) -> bool {
        let last = self.queue.borrow_mut().pop_back();
        Self::release(last)
    }

    /// Run every waiting job, oldest first. Returns how many ran.
    pub fn release_all(&self) -> usize {
        let jobs: Vec<Queued> = self.queue.borrow_mut().drain(..).collect();
        let count = jobs.len();
        for (job, results) in jobs {
            job.run_and_send(&results);
        }
        count
    }

    /// Drop every waiting job without running it. Returns how many.
    ///
    /// Each dropped job reports [`Verdict::Abandoned`] so the store stops
    /// counting it as in flight on its next tick.
    pub fn discard_all(&self) -> usize {
        let jobs: Vec<Queued> = self.queue.borrow_mut().drain(..).collect();
        let count = jobs.len();
        for (job, results) in jobs {
            let _ = results.send(job.abandon());
        }
        count
    }

    fn release(entry: Option<Queued>) -> bool {
        match entry {
            Some((job, results)) => {
                job.run_and_send(&results);
                true
            }
            None => false,
        }
    }
}

impl ValidationExecutor for QueuedExecutor {
    fn execute(&self, job: ValidationJob, results: Sender<ValidationOutcome>) {
        self.queue.borrow_mut().push_back((job, results));
    }
}

impl fmt::Debug for QueuedExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedExecutor")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use formtable_validation::{FieldRules, ObjectSchema};

    use super::*;

    fn schema() -> Arc<dyn FormSchema> {
        Arc::new(ObjectSchema::new().field(
            "quantity",
            FieldRules::new().required("Required").min(1.0, "Min 1"),
        ))
    }

    fn job(value: FieldValue, token: u64) -> ValidationJob {
        let mut record = Record::new();
        record.insert("quantity".into(), value.clone());
        ValidationJob {
            path: FieldPath::new("buy", "quantity").unwrap(),
            token: ValidationToken::from_raw(token),
            value,
            record,
            schema: Some(schema()),
        }
    }

    #[test]
    fn run_maps_schema_answers() {
        assert_eq!(job(FieldValue::from(5), 1).run().verdict, Verdict::Valid);
        assert_eq!(
            job(FieldValue::from(0), 1).run().verdict,
            Verdict::Invalid("Min 1".into())
        );
    }

    #[test]
    fn missing_schema_is_valid() {
        let mut j = job(FieldValue::Null, 1);
        j.schema = None;
        assert!(j.run().verdict.is_valid());
    }

    #[test]
    fn internal_error_and_panic_become_failed() {
        let internal = |_: &str, _: &Record| -> Result<(), SchemaError> {
            Err(SchemaError::Internal("db down".into()))
        };
        let verdict = run_schema(Some(&internal), "quantity", &Record::new());
        assert_eq!(verdict, Verdict::Failed("db down".into()));
        assert_eq!(
            verdict.error_message("Validation error").as_deref(),
            Some("Validation error")
        );

        let panicking = |_: &str, _: &Record| -> Result<(), SchemaError> { panic!("boom") };
        let verdict = run_schema(Some(&panicking), "quantity", &Record::new());
        assert_eq!(verdict, Verdict::Failed("panic: boom".into()));
    }

    #[test]
    fn inline_executor_sends_immediately() {
        let (tx, rx) = mpsc::channel();
        InlineExecutor.execute(job(FieldValue::from(2), 3), tx);
        let outcome = rx.try_recv().expect("outcome sent inline");
        assert_eq!(outcome.token, ValidationToken::from_raw(3));
        assert!(outcome.verdict.is_valid());
    }

    #[test]
    fn thread_executor_sends_from_background() {
        let (tx, rx) = mpsc::channel();
        ThreadExecutor::new().execute(job(FieldValue::from(0), 4), tx);
        let outcome = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker reports back");
        assert_eq!(outcome.verdict, Verdict::Invalid("Min 1".into()));
    }

    #[test]
    fn thread_executor_wakes_after_sending() {
        let (tx, rx) = mpsc::channel();
        let (wake_tx, wake_rx) = mpsc::channel();
        let wake_tx = std::sync::Mutex::new(wake_tx);
        let executor = ThreadExecutor::with_waker(move || {
            if let Ok(tx) = wake_tx.lock() {
                let _ = tx.send(());
            }
        });
        assert!(format!("{executor:?}").contains("has_waker: true"));

        executor.execute(job(FieldValue::from(2), 6), tx);
        wake_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("waker called");
        // The result is already in the channel when the waker runs.
        assert_eq!(rx.try_recv().map(|o| o.token.raw()), Ok(6));
    }

    #[test]
    fn thread_executor_tolerates_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        ThreadExecutor::new().execute(job(FieldValue::from(1), 5), tx);
    }

    #[test]
    fn queued_executor_releases_in_any_order() {
        let (tx, rx) = mpsc::channel();
        let queue = QueuedExecutor::new();
        let handle = queue.clone();
        queue.execute(job(FieldValue::from(1), 1), tx.clone());
        queue.execute(job(FieldValue::from(2), 2), tx);
        assert_eq!(handle.pending(), 2);
        assert!(rx.try_recv().is_err());

        assert!(handle.release_last());
        assert_eq!(rx.try_recv().map(|o| o.token.raw()), Ok(2));
        assert!(handle.release_next());
        assert_eq!(rx.try_recv().map(|o| o.token.raw()), Ok(1));
        assert!(!handle.release_next());
    }

    #[test]
    fn queued_executor_release_and_discard_all() {
        let (tx, rx) = mpsc::channel();
        let queue = QueuedExecutor::new();
        queue.execute(job(FieldValue::from(1), 1), tx.clone());
        queue.execute(job(FieldValue::from(1), 2), tx.clone());
        assert_eq!(queue.pending_paths().len(), 2);
        assert_eq!(queue.release_all(), 2);
        assert_eq!(rx.try_iter().count(), 2);

        queue.execute(job(FieldValue::from(1), 3), tx);
        assert_eq!(queue.discard_all(), 1);
        assert_eq!(queue.pending(), 0);
        let dropped = rx.try_recv().expect("discard reports back");
        assert_eq!(dropped.token.raw(), 3);
        assert_eq!(dropped.verdict, Verdict::Abandoned);
        assert_eq!(dropped.verdict.error_message("Validation error"), None);
    }
}
