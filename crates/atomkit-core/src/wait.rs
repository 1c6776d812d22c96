#![forbid(unsafe_code)]

//! Predicate-gated waits over one or several observables.
//!
//! [`wait_for_atom`] and [`wait_for_atoms`] turn "tell me when this becomes
//! true" into a [`Wait`] future. The future settles from inside whichever
//! notify pass first makes the predicate hold; nothing here owns a timer, a
//! thread, or a task queue.
//!
//! # Invariants
//!
//! 1. If the predicate holds at call time the returned `Wait` is already
//!    settled and no listener is registered.
//! 2. Otherwise one listener is registered per source. On every
//!    notification of **any** source, **all** sources are re-read and the
//!    predicate is evaluated against the joint state.
//! 3. The first `true` settles the wait and removes every registration. The
//!    predicate is never evaluated after that.
//!
//! # Failure Modes
//!
//! - **Predicate never holds**: the wait stays pending and its listeners stay
//!   registered. There is no cancellation; race the `Wait` against a timer
//!   and drop it. A dropped `Wait` detaches its listeners on the next
//!   notification it receives.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};

use crate::listeners::Unsubscribe;
use crate::logging::trace;
use crate::observable::{Observable, ObservableSet, Single};

#[derive(Default)]
struct WaitShared {
    settled: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

impl WaitShared {
    fn settle(&self) {
        self.settled.set(true);
        let waker = self.waker.borrow_mut().take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// A one-shot deferred result that settles when a predicate first holds.
///
/// Resolves to `()`. `Wait` is `!Send`; poll it on the thread that owns the
/// atoms.
#[must_use = "futures do nothing unless polled; a dropped Wait detaches on the next notification"]
pub struct Wait {
    shared: Rc<WaitShared>,
}

impl Wait {
    fn ready() -> Self {
        let shared = WaitShared::default();
        shared.settled.set(true);
        Self {
            shared: Rc::new(shared),
        }
    }

    /// Whether the predicate has held.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.shared.settled.get()
    }
}

impl Future for Wait {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.shared.settled.get() {
            return Poll::Ready(());
        }
        *self.shared.waker.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl fmt::Debug for Wait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wait")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// Wait until `predicate` holds for `observable`'s state.
///
/// # Example
///
/// ```
/// use atomkit_core::{atom, wait_for_atom};
///
/// let count = atom(0);
/// let reached = wait_for_atom(count.clone(), |n| *n >= 2);
/// count.set(1);
/// assert!(!reached.is_settled());
/// count.set(2);
/// assert!(reached.is_settled());
/// assert_eq!(count.listener_count(), 0);
/// ```
pub fn wait_for_atom<O, P>(observable: O, predicate: P) -> Wait
where
    O: Observable + 'static,
    P: Fn(&O::State) -> bool + 'static,
{
    wait_on(Single(observable), predicate)
}

/// Wait until `predicate` holds for the joint state of `observables`.
///
/// `observables` is a tuple (heterogeneous), an array, or a `Vec`. The
/// predicate receives every member's current state in the same shape.
pub fn wait_for_atoms<S, P>(observables: S, predicate: P) -> Wait
where
    S: ObservableSet + 'static,
    P: Fn(&S::States) -> bool + 'static,
{
    wait_on(observables, predicate)
}

fn wait_on<S, P>(sources: S, predicate: P) -> Wait
where
    S: ObservableSet + 'static,
    P: Fn(&S::States) -> bool + 'static,
{
    if predicate(&sources.get_states()) {
        trace!(sources = sources.source_count(), "wait settled immediately");
        return Wait::ready();
    }

    let shared = Rc::new(WaitShared::default());
    let watch = Rc::new(Watch {
        pending: RefCell::new(Some(Pending { sources, predicate })),
        handle: RefCell::new(None),
        evaluations: Cell::new(0),
    });

    let listener: Rc<dyn Fn()> = {
        let watch = Rc::clone(&watch);
        let target = Rc::downgrade(&shared);
        Rc::new(move || watch.on_notify(&target))
    };
    let handle = match watch.pending.borrow().as_ref() {
        Some(pending) => pending.sources.subscribe_all(listener),
        None => Unsubscribe::noop(),
    };
    *watch.handle.borrow_mut() = Some(handle);

    // A source that notifies while subscribing can settle us before the
    // handle was stored.
    if shared.settled.get() {
        watch.finish();
    }

    Wait { shared }
}

struct Pending<S, P> {
    sources: S,
    predicate: P,
}

/// Listener-side state. Holds the sources until the wait is done, then
/// releases them so no reference cycle outlives the wait.
struct Watch<S, P> {
    pending: RefCell<Option<Pending<S, P>>>,
    handle: RefCell<Option<Unsubscribe>>,
    evaluations: Cell<u64>,
}

impl<S, P> Watch<S, P>
where
    S: ObservableSet,
    P: Fn(&S::States) -> bool,
{
    fn on_notify(&self, target: &Weak<WaitShared>) {
        let Some(shared) = target.upgrade() else {
            trace!(
                evaluations = self.evaluations.get(),
                "wait dropped before settling; detaching"
            );
            self.finish();
            return;
        };
        if shared.settled.get() {
            self.finish();
            return;
        }

        let holds = match self.pending.borrow().as_ref() {
            Some(pending) => {
                self.evaluations.set(self.evaluations.get() + 1);
                (pending.predicate)(&pending.sources.get_states())
            }
            None => return,
        };
        if holds && !shared.settled.get() {
            trace!(evaluations = self.evaluations.get(), "wait settled");
            shared.settle();
        }
        // A nested pass may have settled us while the predicate ran; its
        // `finish` could not release the sources then.
        if shared.settled.get() {
            self.finish();
        }
    }

    fn finish(&self) {
        // Skipped while an outer frame of this listener is still evaluating;
        // that frame finishes the job once it unwinds back here.
        let released = match self.pending.try_borrow_mut() {
            Ok(mut pending) => pending.take(),
            Err(_) => None,
        };
        drop(released);

        let handle = self.handle.borrow_mut().take();
        if let Some(handle) = handle {
            handle.unsubscribe();
        }
    }
}
