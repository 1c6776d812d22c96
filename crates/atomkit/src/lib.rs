#![forbid(unsafe_code)]

//! atomkit public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.
//!
//! ```
//! use atomkit::prelude::*;
//!
//! let count = atom(0);
//! let user = status_atom(String::new());
//! let ready = wait_for_atoms((count.clone(), user.clone()), |(count, (_, status))| {
//!     *count > 0 && status.loaded
//! });
//!
//! count.set(1);
//! user.set_status_to(StatusFlag::Loaded, "Stad".to_string());
//! assert!(ready.is_settled());
//! ```

pub mod prelude {
    pub use atomkit_core as core;

    pub use atomkit_core::{
        Atom, AtomError, AtomOptions, Mergeable, Observable, ObservableSet, StatusAtom,
        StatusFlag, StatusPatch, StatusRecord, StatusUpdate, SubscriptionGuard, Unsubscribe,
        Update, Wait, atom, status_atom, wait_for_atom, wait_for_atoms,
    };
}
