#![forbid(unsafe_code)]

//! Sharing one store between the components of a table row.
//!
//! The owner converts the store with [`FormStore::into_shared`] and hands
//! out [`StoreContext`] handles. A handle does not keep the store alive;
//! once the owner drops it, every handle reports
//! [`StoreError::MissingContext`].

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::StoreError;
use crate::store::FormStore;

/// Owning handle to a store shared within one thread.
#[derive(Clone)]
pub struct SharedFormStore(Rc<RefCell<FormStore>>);

impl fmt::Debug for SharedFormStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedFormStore")
            .field(&Rc::strong_count(&self.0))
            .finish()
    }
}

impl FormStore {
    /// Move the store behind a shared handle.
    #[must_use]
    pub fn into_shared(self) -> SharedFormStore {
        SharedFormStore(Rc::new(RefCell::new(self)))
    }
}

impl SharedFormStore {
    /// A non-owning handle for a component.
    #[must_use]
    pub fn context(&self) -> StoreContext {
        StoreContext {
            store: Rc::downgrade(&self.0),
        }
    }

    /// Borrow the store.
    ///
    /// # Panics
    ///
    /// Panics if the store is mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, FormStore> {
        self.0.borrow()
    }

    /// Borrow the store mutably.
    ///
    /// # Panics
    ///
    /// Panics if the store is already borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, FormStore> {
        self.0.borrow_mut()
    }

    /// Run `f` with mutable access, failing instead of panicking when the
    /// store is busy.
    pub fn try_with<R>(&self, f: impl FnOnce(&mut FormStore) -> R) -> Result<R, StoreError> {
        let mut store = self.0.try_borrow_mut().map_err(|_| StoreError::ContextBusy)?;
        Ok(f(&mut store))
    }
}

/// Weak handle to a [`SharedFormStore`].
///
/// [`StoreContext::detached`] (also the `Default`) models a component
/// rendered with no store above it.
#[derive(Clone, Default)]
pub struct StoreContext {
    store: Weak<RefCell<FormStore>>,
}

impl fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl StoreContext {
    /// A handle bound to no store.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// `true` while the store is alive.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.store.strong_count() > 0
    }

    /// Run `f` against the store.
    ///
    /// # Errors
    ///
    /// [`StoreError::MissingContext`] if there is no store, and
    /// [`StoreError::ContextBusy`] if it is already borrowed (for example
    /// from inside one of its own listeners).
    pub fn try_with<R>(&self, f: impl FnOnce(&mut FormStore) -> R) -> Result<R, StoreError> {
        let store = self.store.upgrade().ok_or(StoreError::MissingContext)?;
        let mut guard = store.try_borrow_mut().map_err(|_| StoreError::ContextBusy)?;
        Ok(f(&mut guard))
    }

    /// Like [`try_with`](Self::try_with), for components that cannot work
    /// without a store.
    ///
    /// # Panics
    ///
    /// Panics if the store is missing or busy.
    pub fn with<R>(&self, f: impl FnOnce(&mut FormStore) -> R) -> R {
        match self.try_with(f) {
            Ok(value) => value,
            Err(err) => panic!("StoreContext::with: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use formtable_core::{Column, FieldValue};

    use super::*;
    use crate::executor::InlineExecutor;

    fn shared() -> SharedFormStore {
        FormStore::builder()
            .column(Column::new("buy", "quantity"))
            .executor(InlineExecutor)
            .build()
            .unwrap()
            .into_shared()
    }

    #[test]
    fn contexts_reach_the_same_store() {
        let shared = shared();
        let a = shared.context();
        let b = a.clone();
        a.try_with(|s| s.set_value("buy", "quantity", 3))
            .unwrap()
            .unwrap();
        let value = b.with(|s| s.field("buy", "quantity").map(|f| f.value));
        assert_eq!(value, Some(FieldValue::from(3)));
        assert_eq!(shared.borrow().field("buy", "quantity").unwrap().value, FieldValue::from(3));
    }

    #[test]
    fn detached_and_dropped_contexts_fail() {
        let detached = StoreContext::detached();
        assert!(!detached.is_attached());
        assert_eq!(detached.try_with(|_| ()), Err(StoreError::MissingContext));

        let shared = shared();
        let ctx = shared.context();
        assert!(ctx.is_attached());
        drop(shared);
        assert_eq!(ctx.try_with(|_| ()), Err(StoreError::MissingContext));
    }

    #[test]
    fn reentrant_access_is_busy() {
        let shared = shared();
        let ctx = shared.context();
        let _guard = shared.borrow_mut();
        assert_eq!(ctx.try_with(|_| ()), Err(StoreError::ContextBusy));
    }

    #[test]
    #[should_panic(expected = "outside of its provider")]
    fn with_panics_without_store() {
        StoreContext::detached().with(|_| ());
    }

    #[test]
    fn shared_try_with_and_debug() {
        let shared = shared();
        assert_eq!(shared.try_with(|s| s.get_state().len()), Ok(1));
        assert!(format!("{:?}", shared.context()).contains("attached: true"));
    }
}
