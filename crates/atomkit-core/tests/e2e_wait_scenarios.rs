#![forbid(unsafe_code)]

//! End-to-end scenarios for predicate-gated waits driven by real executors.
//!
//! Validates:
//! 1. A task awaiting a wait is woken by a later synchronous mutation.
//! 2. Joint waits settle on whichever source makes the predicate hold.
//! 3. A wait raced against an external timeout is abandoned cleanly and
//!    detaches from its sources.
//! 4. Already-true predicates resolve without ever registering a listener.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use atomkit_core::{StatusFlag, StatusPatch, atom, status_atom, wait_for_atom, wait_for_atoms};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::{Either, select};
use futures::task::LocalSpawnExt;
use futures::FutureExt;

#[derive(Debug, Clone, Default, PartialEq)]
struct User {
    name: Option<String>,
}

atomkit_core::replace_only!(User);

#[test]
fn spawned_task_resumes_after_mutation() {
    let mut pool = LocalPool::new();
    let user = atom(User::default());
    let resumed = Rc::new(Cell::new(false));

    let wait = wait_for_atom(user.clone(), |u| u.name.as_deref() == Some("Stad"));
    let r = Rc::clone(&resumed);
    pool.spawner()
        .spawn_local(async move {
            wait.await;
            r.set(true);
        })
        .unwrap();

    pool.run_until_stalled();
    assert!(!resumed.get());

    user.set(User {
        name: Some("Stad".into()),
    });
    pool.run_until_stalled();
    assert!(resumed.get());
    assert_eq!(user.listener_count(), 0);
}

#[test]
fn status_wait_resolves_with_loaded_value() {
    let mut pool = LocalPool::new();
    let user = status_atom(User::default());
    let observed = Rc::new(RefCell::new(None));

    let wait = wait_for_atom(user.clone(), |(_, status)| status.loaded);
    let handle = user.clone();
    let o = Rc::clone(&observed);
    pool.spawner()
        .spawn_local(async move {
            wait.await;
            *o.borrow_mut() = Some(handle.get_state());
        })
        .unwrap();

    user.set_status(StatusFlag::Loading);
    pool.run_until_stalled();
    assert!(observed.borrow().is_none());

    user.set_status_to(
        StatusPatch::new().loaded(true),
        User {
            name: Some("Stad".into()),
        },
    );
    pool.run_until_stalled();

    let (value, status) = observed.borrow().clone().unwrap();
    assert_eq!(value.name.as_deref(), Some("Stad"));
    assert!(status.loaded && !status.init && !status.loading && !status.error);
    assert_eq!(status.error_message, None);
}

#[test]
fn joint_wait_settles_on_the_other_source() {
    let count = atom(0);
    let user = status_atom(User::default());

    let wait = wait_for_atoms((count.clone(), user.clone()), |(count, (_, status))| {
        status.loaded || *count == 3
    });

    user.set_status_to(
        StatusFlag::Loaded,
        User {
            name: Some("Stad".into()),
        },
    );
    count.set(2);

    assert_eq!(wait.now_or_never(), Some(()));
    assert_eq!(count.get_state(), 2);
    assert_eq!(count.listener_count(), 0);
    assert_eq!(user.listener_count(), 0);
}

#[test]
fn raced_against_timeout_and_abandoned() {
    let count = atom(0);
    let user = status_atom(User::default());
    user.set_status_to(
        StatusFlag::Loaded,
        User {
            name: Some("Stad".into()),
        },
    );

    let wait = wait_for_atoms((count.clone(), user.clone()), |(count, (user, status))| {
        status.loaded && user.name.as_deref() == Some("Stad") && *count == 3
    });
    let (fire, timeout) = oneshot::channel::<()>();
    let race = select(wait, timeout);

    fire.send(()).unwrap();
    match race.now_or_never() {
        Some(Either::Right(_)) => {}
        Some(Either::Left(_)) => panic!("wait should not have settled"),
        None => panic!("timeout should have fired"),
    }

    // The race (and the wait inside it) is gone; the listeners are still
    // registered until a source notifies.
    assert_eq!(count.listener_count(), 1);
    assert_eq!(user.listener_count(), 1);

    count.set(1);
    assert_eq!(count.listener_count(), 0);
    assert_eq!(user.listener_count(), 0);
    assert_eq!(user.get_state().0.name.as_deref(), Some("Stad"));
}

#[test]
fn already_true_blocks_for_nothing() {
    let count = atom(3);
    let user = atom(User {
        name: Some("Stad".into()),
    });

    pollster::block_on(wait_for_atom(count.clone(), |n| *n == 3));
    pollster::block_on(wait_for_atoms(
        (user.clone(), count.clone()),
        |(user, count)| user.name.is_some() && *count == 3,
    ));

    assert_eq!(count.listener_count(), 0);
    assert_eq!(user.listener_count(), 0);
}

#[test]
fn block_on_after_settling() {
    let flag = atom(false);
    let wait = wait_for_atom(flag.clone(), |f| *f);
    flag.set(true);
    futures::executor::block_on(wait);
    assert_eq!(flag.listener_count(), 0);
}

#[test]
fn many_waiters_on_one_atom() {
    let count = atom(0u32);
    let waits: Vec<_> = (1..=5)
        .map(|target| wait_for_atom(count.clone(), move |n| *n >= target))
        .collect();
    assert_eq!(count.listener_count(), 5);

    for step in 1..=5 {
        count.set(step);
        let settled = waits.iter().filter(|w| w.is_settled()).count();
        assert_eq!(settled, step as usize);
        assert_eq!(count.listener_count(), 5 - step as usize);
    }
}
