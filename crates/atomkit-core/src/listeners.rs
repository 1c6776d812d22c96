#![forbid(unsafe_code)]

//! Listener registry with copy-on-write buffers, and the unsubscribe handle.
//!
//! # Design
//!
//! The registry holds two buffer handles, `committed` and `staging`. They
//! start out pointing at the same allocation. Every mutation first checks
//! whether they still alias and, if so, clones `committed` into a fresh
//! `staging` buffer. A notify pass publishes `staging` as the new
//! `committed` buffer and iterates a snapshot of it, so subscribe and
//! unsubscribe calls made from inside a listener only take effect on the
//! next pass.
//!
//! # Invariants
//!
//! 1. Listeners are invoked in registration order.
//! 2. The listener count only changes through [`ListenerRegistry::insert`]
//!    and [`ListenerRegistry::remove`]; publishing never changes it.
//! 3. An [`Unsubscribe`] handle runs its removal at most once.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A registered zero-argument callback.
pub(crate) type Listener = Rc<dyn Fn()>;

type Buffer = Rc<Vec<(ListenerId, Listener)>>;

/// Identity of one registration. Subscribing the same closure twice yields
/// two distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Raw numeric id, unique within one atom.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

pub(crate) struct ListenerRegistry {
    committed: Buffer,
    staging: Buffer,
    next_id: u64,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        let buffer: Buffer = Rc::new(Vec::new());
        Self {
            committed: Rc::clone(&buffer),
            staging: buffer,
            next_id: 0,
        }
    }

    fn ensure_can_mutate_staging(&mut self) {
        if Rc::ptr_eq(&self.staging, &self.committed) {
            self.staging = Rc::new(self.committed.as_ref().clone());
        }
    }

    pub(crate) fn insert(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.ensure_can_mutate_staging();
        Rc::make_mut(&mut self.staging).push((id, listener));
        id
    }

    /// Remove one registration. Returns `false` if it was already gone.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let Some(index) = self.staging.iter().position(|(lid, _)| *lid == id) else {
            return false;
        };
        self.ensure_can_mutate_staging();
        Rc::make_mut(&mut self.staging).remove(index);
        true
    }

    /// Publish the staging buffer and return a snapshot to iterate.
    ///
    /// The caller must release its borrow of the registry before invoking
    /// any listener in the snapshot.
    pub(crate) fn publish(&mut self) -> Buffer {
        self.committed = Rc::clone(&self.staging);
        Rc::clone(&self.committed)
    }

    pub(crate) fn len(&self) -> usize {
        self.staging.len()
    }

    #[cfg(test)]
    fn aliased(&self) -> bool {
        Rc::ptr_eq(&self.staging, &self.committed)
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("committed", &self.committed.len())
            .field("staging", &self.staging.len())
            .finish()
    }
}

type Action = Box<dyn FnOnce()>;

/// Handle returned by `subscribe`; calling [`unsubscribe`](Self::unsubscribe)
/// removes the registration.
///
/// Dropping the handle does **not** unsubscribe. Use
/// [`into_guard`](Self::into_guard) for scope-bound subscriptions.
/// Cloning shares the same one-shot removal.
#[derive(Clone)]
pub struct Unsubscribe {
    action: Rc<RefCell<Option<Action>>>,
}

impl Unsubscribe {
    /// Wrap an arbitrary removal action.
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self {
            action: Rc::new(RefCell::new(Some(Box::new(action)))),
        }
    }

    /// A handle that is already inactive.
    #[must_use]
    pub fn noop() -> Self {
        Self {
            action: Rc::new(RefCell::new(None)),
        }
    }

    /// Combine several handles into one that removes all of them, in order.
    pub fn all(handles: impl IntoIterator<Item = Unsubscribe>) -> Self {
        let handles: Vec<Unsubscribe> = handles.into_iter().collect();
        Self::new(move || {
            for handle in &handles {
                handle.unsubscribe();
            }
        })
    }

    /// Remove the registration. Later calls are no-ops.
    pub fn unsubscribe(&self) {
        let action = self.action.borrow_mut().take();
        if let Some(action) = action {
            action();
        }
    }

    /// Whether [`unsubscribe`](Self::unsubscribe) has not run yet.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.action.borrow().is_some()
    }

    /// Convert into a guard that unsubscribes when dropped.
    #[must_use]
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard { handle: self }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("active", &self.is_active())
            .finish()
    }
}

/// RAII guard that unsubscribes on drop.
#[must_use = "dropping the guard unsubscribes immediately"]
#[derive(Debug)]
pub struct SubscriptionGuard {
    handle: Unsubscribe,
}

impl SubscriptionGuard {
    /// Give up scope-bound removal and return the plain handle.
    pub fn detach(mut self) -> Unsubscribe {
        std::mem::replace(&mut self.handle, Unsubscribe::noop())
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}
