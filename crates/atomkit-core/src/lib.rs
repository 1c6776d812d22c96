#![forbid(unsafe_code)]

//! Observable atoms for single-threaded state.
//!
//! This crate provides a small set of state primitives:
//!
//! - [`Atom`]: a value with subscribe/notify semantics and a resettable
//!   default.
//! - [`StatusAtom`]: an atom paired with a lifecycle [`StatusRecord`]
//!   (`init` / `loading` / `loaded` / `error`), observed through the same
//!   listeners as the value.
//! - [`wait_for_atom`] / [`wait_for_atoms`]: futures that settle the first
//!   time a predicate over one or several observables holds.
//!
//! # Architecture
//!
//! Every atom is backed by a [`StateContainer`], which owns the value, the
//! captured default, and a copy-on-write listener registry behind one `Rc`.
//! Notifications are synchronous and reentrant: listeners may mutate,
//! subscribe to, or unsubscribe from the atom that is notifying them, and
//! registry changes made mid-pass apply from the next pass on.
//!
//! Updates are explicit about how they combine with the current value; see
//! [`Update`].
//!
//! # Invariants
//!
//! 1. Listeners are notified in registration order, once per pass.
//! 2. Every state change produces exactly one notify pass; nested passes
//!    are neither deduplicated nor coalesced.
//! 3. `reset()` always restores the value captured at construction.
//! 4. A status update never inherits flags from the previous status.

pub mod atom;
pub mod container;
pub mod error;
mod logging;
pub mod listeners;
pub mod observable;
pub mod options;
pub mod status;
pub mod status_atom;
pub mod update;
pub mod wait;

pub use atom::{Atom, atom};
pub use container::StateContainer;
pub use error::{AtomError, Result};
pub use listeners::{ListenerId, SubscriptionGuard, Unsubscribe};
pub use observable::{Observable, ObservableSet};
pub use options::AtomOptions;
pub use status::{StatusFlag, StatusPatch, StatusRecord, StatusUpdate};
pub use status_atom::{StatusAtom, status_atom};
pub use update::{Mergeable, Update};
pub use wait::{Wait, wait_for_atom, wait_for_atoms};
