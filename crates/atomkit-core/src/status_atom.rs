#![forbid(unsafe_code)]

//! Atoms that carry a lifecycle [`StatusRecord`] next to their value.
//!
//! # Design
//!
//! [`StatusAtom<T>`] pairs a [`StateContainer<T>`] with a separately stored
//! status record. The record has no registry of its own: every status change
//! is announced through the container's listeners, so one subscription
//! observes both value and status.
//!
//! Value updates merge or transform as usual. Status updates never carry
//! anything over from the previous record; see [`StatusUpdate::resolve`].
//!
//! # Invariants
//!
//! 1. Each `set_status*` or `reset*` call produces exactly one notify pass.
//! 2. The status is written before that pass starts, so listeners always
//!    observe the new `(value, status)` pair.
//! 3. `reset()` restores `(default value, StatusRecord::default())`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::container::StateContainer;
use crate::error::Result;
use crate::listeners::Unsubscribe;
#[cfg(feature = "tracing")]
use crate::logging::ANON_LABEL;
use crate::logging::debug;
use crate::options::AtomOptions;
use crate::status::{StatusPatch, StatusRecord, StatusUpdate};
use crate::update::{Mergeable, Update};

/// Create a status atom holding `default` with the default (`init`) status.
///
/// # Example
///
/// ```
/// use atomkit_core::status::{StatusFlag, StatusRecord};
/// use atomkit_core::status_atom;
///
/// let user = status_atom(String::new());
/// user.set_status(StatusFlag::Loading);
/// user.set_status_to(StatusFlag::Loaded, "Stad".to_string());
///
/// let (name, status) = user.get_state();
/// assert_eq!(name, "Stad");
/// assert_eq!(status, StatusRecord::only(StatusFlag::Loaded));
/// ```
pub fn status_atom<T: Clone + 'static>(default: T) -> StatusAtom<T> {
    StatusAtom::new(default)
}

/// An atom whose value is paired with a lifecycle status record.
///
/// Cloning a `StatusAtom` creates a new handle to the **same** value and
/// status.
pub struct StatusAtom<T> {
    core: StateContainer<T>,
    status: Rc<RefCell<StatusRecord>>,
}

impl<T> Clone for StatusAtom<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            status: Rc::clone(&self.status),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StatusAtom<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusAtom")
            .field("core", &self.core)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

impl<T> StatusAtom<T> {
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.core.label()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.core.listener_count()
    }

    #[must_use]
    pub fn get_status(&self) -> StatusRecord {
        self.status.borrow().clone()
    }

    fn write_status(&self, update: StatusUpdate) {
        let current = self.get_status();
        let next = update.resolve(&current);
        debug!(
            atom = self.label().unwrap_or(ANON_LABEL),
            init = next.init,
            loading = next.loading,
            loaded = next.loaded,
            error = next.error,
            error_message = next.error_message.as_deref(),
            "status"
        );
        *self.status.borrow_mut() = next;
    }
}

impl<T: Clone + 'static> StatusAtom<T> {
    pub fn new(default: T) -> Self {
        Self::with_options(default, AtomOptions::default())
    }

    pub fn with_options(default: T, options: AtomOptions) -> Self {
        Self {
            core: StateContainer::with_options(default, options),
            status: Rc::new(RefCell::new(StatusRecord::default())),
        }
    }

    /// Register a listener for both value and status changes.
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Unsubscribe {
        self.core.subscribe(listener)
    }

    #[must_use]
    pub fn get_core_value(&self) -> T {
        self.core.get_state()
    }

    /// Current `(value, status)` pair.
    #[must_use]
    pub fn get_state(&self) -> (T, StatusRecord) {
        (self.core.get_state(), self.get_status())
    }

    /// Replace the value, leaving the status untouched.
    pub fn set_value_to(&self, value: T) {
        self.core.set(value);
    }

    /// Compute the next value, leaving the status untouched.
    pub fn update_value(&self, f: impl FnOnce(&T) -> T) {
        self.core.update(f);
    }

    /// Change only the status. Listeners are notified once; the value is
    /// not touched.
    pub fn set_status(&self, next: impl Into<StatusUpdate>) {
        self.write_status(next.into());
        self.core.notify();
    }

    /// Change the status by flag name.
    ///
    /// # Errors
    ///
    /// Returns [`AtomError::InvalidArgument`](crate::AtomError::InvalidArgument)
    /// if `name` is not one of `init`, `loading`, `loaded`, `error`. The atom
    /// is left unchanged and nobody is notified.
    pub fn set_status_named(&self, name: &str) -> Result<()> {
        let update = StatusUpdate::try_from(name)?;
        self.set_status(update);
        Ok(())
    }

    /// Change the status and replace the value, with a single notification.
    pub fn set_status_to(&self, next: impl Into<StatusUpdate>, value: T) {
        self.write_status(next.into());
        self.core.set(value);
    }

    /// Restore the default value and the default (`init`) status.
    pub fn reset(&self) {
        *self.status.borrow_mut() = StatusRecord::default();
        self.core.reset();
    }

    /// Restore the default value and set the status to `status` over the
    /// cleared base. Unlike [`reset`](Self::reset), `init` ends up false
    /// unless `status` sets it.
    pub fn reset_with(&self, status: impl Into<StatusPatch>) {
        *self.status.borrow_mut() = status.into().resolve();
        self.core.reset();
    }
}

impl<T: Clone + Mergeable + 'static> StatusAtom<T> {
    /// Apply a tagged value update, leaving the status untouched.
    pub fn set_value(&self, update: Update<T>) {
        self.core.set_state(update);
    }

    /// Change the status and apply a value update, with a single
    /// notification.
    pub fn set_status_with(&self, next: impl Into<StatusUpdate>, value: Update<T>) {
        self.write_status(next.into());
        self.core.set_state(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusFlag;
    use std::cell::Cell;
    use std::collections::BTreeMap;

    fn counting(atom: &StatusAtom<impl Clone + 'static>) -> Rc<Cell<u32>> {
        let calls = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&calls);
        atom.subscribe(move || c.set(c.get() + 1));
        calls
    }

    #[test]
    fn starts_with_default_status() {
        let a = status_atom(0);
        assert_eq!(a.get_state(), (0, StatusRecord::default()));
        assert_eq!(a.get_core_value(), 0);
    }

    #[test]
    fn loading_then_loaded_with_value() {
        let a = status_atom(BTreeMap::<String, i32>::new());
        a.set_status(StatusFlag::Loading);
        assert_eq!(a.get_status(), StatusRecord::only(StatusFlag::Loading));

        a.set_status_with(
            StatusFlag::Loaded,
            Update::Replace(BTreeMap::from([("x".to_string(), 1)])),
        );
        let (value, status) = a.get_state();
        assert_eq!(value, BTreeMap::from([("x".to_string(), 1)]));
        assert_eq!(
            status,
            StatusRecord {
                loaded: true,
                ..StatusRecord::cleared()
            }
        );
    }

    #[test]
    fn status_only_change_notifies_once_without_value_change() {
        let a = status_atom(5);
        let calls = counting(&a);
        a.set_status(StatusFlag::Loading);
        assert_eq!(calls.get(), 1);
        assert_eq!(a.get_core_value(), 5);
    }

    #[test]
    fn status_with_value_notifies_once() {
        let a = status_atom(5);
        let calls = counting(&a);
        a.set_status_with(StatusFlag::Loaded, Update::transform(|v| v * 2));
        assert_eq!(calls.get(), 1);
        assert_eq!(a.get_state(), (10, StatusRecord::only(StatusFlag::Loaded)));
    }

    #[test]
    fn listener_observes_new_status_and_value() {
        let a = status_atom(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let handle = a.clone();
        let s = Rc::clone(&seen);
        a.subscribe(move || s.borrow_mut().push(handle.get_state()));

        a.set_status_to(StatusFlag::Loaded, 7);
        assert_eq!(
            *seen.borrow(),
            vec![(7, StatusRecord::only(StatusFlag::Loaded))]
        );
    }

    #[test]
    fn flags_snap_back_to_cleared_base() {
        let a = status_atom(());
        a.set_status(StatusPatch::failed("404"));
        a.set_status(StatusPatch::new().loaded(true));
        assert_eq!(a.get_status(), StatusRecord::only(StatusFlag::Loaded));
    }

    #[test]
    fn transform_receives_current_status() {
        let a = status_atom("Stad");
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        a.set_status(StatusUpdate::transform(move |prev| {
            *s.borrow_mut() = Some(prev.clone());
            StatusPatch::new().loading(true)
        }));
        assert_eq!(*seen.borrow(), Some(StatusRecord::default()));
        assert_eq!(a.get_status(), StatusRecord::only(StatusFlag::Loading));
    }

    #[test]
    fn transform_may_read_the_same_atom() {
        let a = status_atom(1);
        let handle = a.clone();
        a.set_status(StatusUpdate::transform(move |_| {
            assert!(handle.get_status().init);
            StatusPatch::from(StatusFlag::Loaded)
        }));
        assert!(a.get_status().loaded);
    }

    #[test]
    fn named_status() {
        let a = status_atom(0u8);
        let calls = counting(&a);
        a.set_status_named("loading").unwrap();
        assert!(a.get_status().loading);

        let err = a.set_status_named("pending").unwrap_err();
        assert!(err.to_string().contains("pending"));
        assert!(a.get_status().loading, "failed call leaves status alone");
        assert_eq!(calls.get(), 1, "failed call does not notify");
    }

    #[test]
    fn bare_reset_restores_init() {
        let a = status_atom(1);
        a.set_status_to(StatusFlag::Error, 9);
        let calls = counting(&a);
        a.reset();
        assert_eq!(a.get_state(), (1, StatusRecord::default()));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn reset_with_override_clears_init() {
        let a = status_atom(1);
        a.set_value(Update::Replace(3));
        a.reset_with(StatusPatch::new().loaded(true));
        assert_eq!(a.get_state(), (1, StatusRecord::only(StatusFlag::Loaded)));

        a.reset_with(StatusPatch::new());
        assert_eq!(a.get_status(), StatusRecord::cleared());

        a.reset_with(StatusFlag::Init);
        assert_eq!(a.get_status(), StatusRecord::default());
    }

    #[test]
    fn value_updates_keep_status() {
        let a = status_atom(BTreeMap::from([("a", 1)]));
        a.set_status(StatusFlag::Loaded);
        a.set_value(Update::Merge(BTreeMap::from([("b", 2)])));
        a.update_value(|m| {
            let mut m = m.clone();
            m.insert("c", 3);
            m
        });
        a.set_value_to(BTreeMap::from([("z", 0)]));
        assert_eq!(a.get_core_value(), BTreeMap::from([("z", 0)]));
        assert!(a.get_status().loaded);
    }

    #[test]
    fn clones_share_value_and_status() {
        let a = status_atom(0);
        let b = a.clone();
        a.set_status_to(StatusFlag::Loading, 4);
        assert_eq!(b.get_state(), (4, StatusRecord::only(StatusFlag::Loading)));
    }

    #[test]
    fn debug_shows_status() {
        let a = StatusAtom::with_options(0, AtomOptions::new().with_label("user"));
        let dbg = format!("{a:?}");
        assert!(dbg.contains("StatusAtom"));
        assert!(dbg.contains("user"));
        assert!(dbg.contains("init: true"));
    }
}
