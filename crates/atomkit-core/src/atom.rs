#![forbid(unsafe_code)]

//! The public atom handle.
//!
//! [`Atom<T>`] is a [`StateContainer<T>`] minus `notify`: consumers can only
//! trigger listeners by actually changing state.

use std::fmt;

use crate::container::StateContainer;
use crate::listeners::Unsubscribe;
use crate::options::AtomOptions;
use crate::update::{Mergeable, Update};

/// Create an atom holding `default`.
///
/// # Example
///
/// ```
/// use atomkit_core::atom;
///
/// let count = atom(0);
/// count.update(|n| n + 1);
/// assert_eq!(count.get_state(), 1);
/// count.reset();
/// assert_eq!(count.get_state(), 0);
/// ```
pub fn atom<T: Clone + 'static>(default: T) -> Atom<T> {
    Atom::new(default)
}

/// An observable, resettable unit of state.
///
/// Cloning an `Atom` creates a new handle to the **same** state.
pub struct Atom<T> {
    core: StateContainer<T>,
}

impl<T> Clone for Atom<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Atom<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Atom").field(&self.core).finish()
    }
}

impl<T> Atom<T> {
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.core.label()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.core.listener_count()
    }
}

impl<T: Clone + 'static> Atom<T> {
    pub fn new(default: T) -> Self {
        Self {
            core: StateContainer::new(default),
        }
    }

    pub fn with_options(default: T, options: AtomOptions) -> Self {
        Self {
            core: StateContainer::with_options(default, options),
        }
    }

    /// Register a listener; see [`StateContainer::subscribe`].
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Unsubscribe {
        self.core.subscribe(listener)
    }

    #[must_use]
    pub fn get_state(&self) -> T {
        self.core.get_state()
    }

    /// Borrow the current value; see [`StateContainer::with`].
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.core.with(f)
    }

    pub fn set(&self, value: T) {
        self.core.set(value);
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.core.update(f);
    }

    pub fn reset(&self) {
        self.core.reset();
    }
}

impl<T: Clone + Mergeable + 'static> Atom<T> {
    pub fn set_state(&self, update: Update<T>) {
        self.core.set_state(update);
    }

    pub fn merge(&self, patch: T::Patch) {
        self.core.merge(patch);
    }
}
