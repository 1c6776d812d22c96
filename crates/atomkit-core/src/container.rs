#![forbid(unsafe_code)]

//! The state container backing every atom kind.
//!
//! # Design
//!
//! [`StateContainer<T>`] keeps its value, its captured default, and its
//! [`ListenerRegistry`] behind one `Rc`, so clones are cheap handles onto the
//! same state. All interior mutability is scoped: no `RefCell` borrow is
//! held while a listener or a user-supplied transform runs. That is what
//! lets listeners read, mutate, subscribe to, or unsubscribe from the very
//! container that is notifying them.
//!
//! # Invariants
//!
//! 1. Every committed value change is followed by exactly one notify pass.
//! 2. A pass invokes each listener registered when it started exactly once,
//!    in registration order.
//! 3. Registry changes made during a pass apply from the next pass on.
//! 4. `reset()` always restores the value captured at construction.
//!
//! # Failure Modes
//!
//! - **Listener panics**: the panic unwinds out of the notify pass and the
//!   listeners ordered after it are skipped for that pass. The value has
//!   already been committed and the registry stays usable.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::listeners::{ListenerRegistry, Unsubscribe};
use crate::logging::{ANON_LABEL, debug, trace};
use crate::options::AtomOptions;
use crate::update::{Mergeable, Update};

struct ContainerInner<T> {
    value: RefCell<T>,
    /// Owned copy of the construction value; never mutated.
    default: T,
    listeners: RefCell<ListenerRegistry>,
    label: Option<String>,
}

/// A mutable value with a listener registry and a notify protocol.
///
/// Cloning a `StateContainer` creates a new handle to the **same** state.
pub struct StateContainer<T> {
    inner: Rc<ContainerInner<T>>,
}

impl<T> Clone for StateContainer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StateContainer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateContainer")
            .field("label", &self.label().unwrap_or(ANON_LABEL))
            .field("value", &*self.inner.value.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl<T> StateContainer<T> {
    /// Label given at construction, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.inner.label.as_deref()
    }

    /// Number of registrations the next notify pass will invoke.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Invoke every listener once, in registration order, without touching
    /// the value.
    pub(crate) fn notify(&self) {
        let snapshot = self.inner.listeners.borrow_mut().publish();
        trace!(
            atom = self.label().unwrap_or(ANON_LABEL),
            listeners = snapshot.len(),
            "notify"
        );
        for (_, listener) in snapshot.iter() {
            listener();
        }
    }

    fn commit(&self, value: T) {
        let previous = self.inner.value.replace(value);
        drop(previous);
        self.notify();
    }
}

impl<T: Clone + 'static> StateContainer<T> {
    /// Create a container holding `default`.
    pub fn new(default: T) -> Self {
        Self::with_options(default, AtomOptions::default())
    }

    pub fn with_options(default: T, options: AtomOptions) -> Self {
        Self {
            inner: Rc::new(ContainerInner {
                value: RefCell::new(default.clone()),
                default,
                listeners: RefCell::new(ListenerRegistry::new()),
                label: options.label,
            }),
        }
    }

    /// Register `listener` for every future notify pass.
    ///
    /// The returned handle removes exactly this registration; it is a no-op
    /// once the container has been dropped.
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Unsubscribe {
        let id = self.inner.listeners.borrow_mut().insert(Rc::new(listener));
        trace!(
            atom = self.label().unwrap_or(ANON_LABEL),
            listener = id.raw(),
            listeners = self.listener_count(),
            "subscribe"
        );

        let weak = Rc::downgrade(&self.inner);
        Unsubscribe::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
            let removed = inner.listeners.borrow_mut().remove(id);
            trace!(
                atom = inner.label.as_deref().unwrap_or(ANON_LABEL),
                listener = id.raw(),
                removed,
                "unsubscribe"
            );
        })
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get_state(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if the closure mutates this container (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and notify.
    pub fn set(&self, value: T) {
        self.commit(value);
    }

    /// Compute the next value from the current one and notify.
    ///
    /// `f` runs against a clone with no borrow held, so it may read this
    /// container.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let current = self.get_state();
        self.commit(f(&current));
    }

    /// Restore the construction value and notify.
    pub fn reset(&self) {
        debug!(atom = self.label().unwrap_or(ANON_LABEL), "reset");
        self.commit(self.inner.default.clone());
    }
}

impl<T: Clone + Mergeable + 'static> StateContainer<T> {
    /// Apply a tagged update and notify.
    pub fn set_state(&self, update: Update<T>) {
        trace!(
            atom = self.label().unwrap_or(ANON_LABEL),
            kind = update.kind(),
            "set_state"
        );
        let next = match update {
            Update::Replace(value) => value,
            other => other.apply(self.get_state()),
        };
        self.commit(next);
    }

    /// Shallow-merge `patch` onto the current value and notify.
    pub fn merge(&self, patch: T::Patch) {
        self.set_state(Update::Merge(patch));
    }
}
