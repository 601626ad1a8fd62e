#![forbid(unsafe_code)]

//! Listener registries, subscription guards, and selectors.
//!
//! # Design
//!
//! A [`ListenerSet<T>`] keeps callbacks in shared, reference-counted storage
//! (`Rc<RefCell<..>>`). [`Subscription`] guards hold only a `Weak` handle to
//! that storage, so unsubscribing after the owner is gone is a no-op.
//!
//! # Invariants
//!
//! 1. Listeners are notified in registration order.
//! 2. A listener removed during a notification round is not called for the
//!    rest of that round.
//! 3. `unsubscribe()` is idempotent; dropping the guard unsubscribes too.
//! 4. A [`Selector`] reports a change only when its projection differs
//!    (`PartialEq`) from the previous one.
//!
//! # Failure Modes
//!
//! - **Re-entrant notify**: a listener that triggers another notification on
//!   the same set is called again from inside itself and panics on the
//!   `RefCell` borrow. Listeners must not write to the store they observe.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = RefCell<Box<dyn FnMut(&T)>>;

struct Entry<T> {
    id: u64,
    active: Cell<bool>,
    callback: Callback<T>,
}

struct Registry<T> {
    next_id: u64,
    entries: Vec<Rc<Entry<T>>>,
}

impl<T> Registry<T> {
    fn remove(&mut self, id: u64) {
        if let Some(pos) = self.entries.iter().position(|e| e.id == id) {
            let entry = self.entries.remove(pos);
            entry.active.set(false);
        }
    }
}

/// An ordered set of callbacks receiving `&T`.
pub struct ListenerSet<T> {
    inner: Rc<RefCell<Registry<T>>>,
}

impl<T> Default for ListenerSet<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<T: 'static> fmt::Debug for ListenerSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<T: 'static> ListenerSet<T> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`; it stays registered until the guard says otherwise.
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let id = {
            let mut registry = self.inner.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push(Rc::new(Entry {
                id,
                active: Cell::new(true),
                callback: RefCell::new(Box::new(callback)),
            }));
            id
        };
        let weak: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    registry.borrow_mut().remove(id);
                }
            })),
        }
    }

    /// Call every live listener with `value`, in registration order.
    pub fn notify(&self, value: &T) {
        // Snapshot first so callbacks may (un)subscribe without a borrow conflict.
        let entries: Vec<Rc<Entry<T>>> = self.inner.borrow().entries.clone();
        for entry in entries {
            if entry.active.get() {
                let mut callback = entry.callback.borrow_mut();
                (*callback)(value);
            }
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// `true` when nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Guard for a registered listener.
///
/// Dropping the guard unsubscribes. Keep it alive for as long as the
/// listener should run.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Stop receiving notifications. Safe to call repeatedly, and after the
    /// store is gone.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// `true` until [`unsubscribe`](Self::unsubscribe) is called.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// A memoized projection of some state.
///
/// ```rust
/// use formtable_runtime::Selector;
///
/// let mut total = Selector::new(|v: &Vec<u32>| v.iter().sum::<u32>());
/// assert!(total.update(&vec![1, 2]));
/// assert!(!total.update(&vec![2, 1]));
/// assert_eq!(total.get(), Some(&3));
/// ```
pub struct Selector<S: ?Sized, T> {
    projection: Box<dyn Fn(&S) -> T>,
    current: Option<T>,
}

impl<S: ?Sized, T: PartialEq> Selector<S, T> {
    /// Create a selector that has not seen any state yet.
    pub fn new(projection: impl Fn(&S) -> T + 'static) -> Self {
        Self {
            projection: Box::new(projection),
            current: None,
        }
    }

    /// Create a selector already holding the projection of `state`.
    pub fn seeded(projection: impl Fn(&S) -> T + 'static, state: &S) -> Self {
        let current = Some(projection(state));
        Self {
            projection: Box::new(projection),
            current,
        }
    }

    /// Re-evaluate against `state`. Returns `true` if the value changed
    /// (always `true` the first time).
    pub fn update(&mut self, state: &S) -> bool {
        let next = (self.projection)(state);
        if self.current.as_ref() == Some(&next) {
            return false;
        }
        self.current = Some(next);
        true
    }

    /// The last projected value.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.current.as_ref()
    }
}

impl<S: ?Sized, T: fmt::Debug> fmt::Debug for Selector<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("current", &self.current)
            .finish()
    }
}
