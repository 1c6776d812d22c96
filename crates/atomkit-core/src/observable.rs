#![forbid(unsafe_code)]

//! The read-and-subscribe capability consumed by the wait utilities.
//!
//! [`Observable`] is the minimum an atom-like source has to offer: a pure
//! `get_state` and a `subscribe` returning an [`Unsubscribe`] handle.
//! [`ObservableSet`] lifts that to an ordered group of sources, which may be
//! heterogeneous (tuples) or homogeneous (arrays, `Vec`).

use std::rc::Rc;

use crate::atom::Atom;
use crate::container::StateContainer;
use crate::listeners::Unsubscribe;
use crate::status::StatusRecord;
use crate::status_atom::StatusAtom;

/// A readable source that announces changes.
pub trait Observable {
    type State;

    /// Current state. Must not have side effects.
    fn get_state(&self) -> Self::State;

    /// Register `listener` for future changes.
    fn subscribe<F: Fn() + 'static>(&self, listener: F) -> Unsubscribe;
}

impl<T: Clone + 'static> Observable for StateContainer<T> {
    type State = T;

    fn get_state(&self) -> T {
        StateContainer::get_state(self)
    }

    fn subscribe<F: Fn() + 'static>(&self, listener: F) -> Unsubscribe {
        StateContainer::subscribe(self, listener)
    }
}

impl<T: Clone + 'static> Observable for Atom<T> {
    type State = T;

    fn get_state(&self) -> T {
        Atom::get_state(self)
    }

    fn subscribe<F: Fn() + 'static>(&self, listener: F) -> Unsubscribe {
        Atom::subscribe(self, listener)
    }
}

impl<T: Clone + 'static> Observable for StatusAtom<T> {
    type State = (T, StatusRecord);

    fn get_state(&self) -> (T, StatusRecord) {
        StatusAtom::get_state(self)
    }

    fn subscribe<F: Fn() + 'static>(&self, listener: F) -> Unsubscribe {
        StatusAtom::subscribe(self, listener)
    }
}

impl<O: Observable + ?Sized> Observable for &O {
    type State = O::State;

    fn get_state(&self) -> Self::State {
        (**self).get_state()
    }

    fn subscribe<F: Fn() + 'static>(&self, listener: F) -> Unsubscribe {
        (**self).subscribe(listener)
    }
}

impl<O: Observable + ?Sized> Observable for Rc<O> {
    type State = O::State;

    fn get_state(&self) -> Self::State {
        (**self).get_state()
    }

    fn subscribe<F: Fn() + 'static>(&self, listener: F) -> Unsubscribe {
        (**self).subscribe(listener)
    }
}

/// An ordered group of observables read and subscribed as one.
pub trait ObservableSet {
    /// Every member's state, in member order.
    type States;

    fn get_states(&self) -> Self::States;

    /// Register `listener` once per member. The returned handle removes all
    /// of those registrations.
    fn subscribe_all(&self, listener: Rc<dyn Fn()>) -> Unsubscribe;

    /// Number of members.
    fn source_count(&self) -> usize;
}

fn forward(listener: &Rc<dyn Fn()>) -> impl Fn() + 'static {
    let listener = Rc::clone(listener);
    move || listener()
}

macro_rules! impl_tuple_set {
    ($count:expr; $($name:ident $idx:tt),+) => {
        impl<$($name: Observable),+> ObservableSet for ($($name,)+) {
            type States = ($(<$name as Observable>::State,)+);

            fn get_states(&self) -> Self::States {
                ($(self.$idx.get_state(),)+)
            }

            fn subscribe_all(&self, listener: Rc<dyn Fn()>) -> Unsubscribe {
                Unsubscribe::all([$(self.$idx.subscribe(forward(&listener))),+])
            }

            fn source_count(&self) -> usize {
                $count
            }
        }
    };
}

impl_tuple_set!(1; A 0);
impl_tuple_set!(2; A 0, B 1);
impl_tuple_set!(3; A 0, B 1, C 2);
impl_tuple_set!(4; A 0, B 1, C 2, D 3);
impl_tuple_set!(5; A 0, B 1, C 2, D 3, E 4);
impl_tuple_set!(6; A 0, B 1, C 2, D 3, E 4, F 5);
impl_tuple_set!(7; A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_tuple_set!(8; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

impl<O: Observable, const N: usize> ObservableSet for [O; N] {
    type States = [O::State; N];

    fn get_states(&self) -> Self::States {
        std::array::from_fn(|i| self[i].get_state())
    }

    fn subscribe_all(&self, listener: Rc<dyn Fn()>) -> Unsubscribe {
        Unsubscribe::all(self.iter().map(|o| o.subscribe(forward(&listener))))
    }

    fn source_count(&self) -> usize {
        N
    }
}

impl<O: Observable> ObservableSet for Vec<O> {
    type States = Vec<O::State>;

    fn get_states(&self) -> Self::States {
        self.iter().map(Observable::get_state).collect()
    }

    fn subscribe_all(&self, listener: Rc<dyn Fn()>) -> Unsubscribe {
        Unsubscribe::all(self.iter().map(|o| o.subscribe(forward(&listener))))
    }

    fn source_count(&self) -> usize {
        self.len()
    }
}

/// A single observable viewed as a set whose state is the member's own.
pub(crate) struct Single<O>(pub(crate) O);

impl<O: Observable> ObservableSet for Single<O> {
    type States = O::State;

    fn get_states(&self) -> Self::States {
        self.0.get_state()
    }

    fn subscribe_all(&self, listener: Rc<dyn Fn()>) -> Unsubscribe {
        self.0.subscribe(forward(&listener))
    }

    fn source_count(&self) -> usize {
        1
    }
}
