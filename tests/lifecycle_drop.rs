use spark_logic::{Binder, Logic, LogicScope, cloned, logic_state};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Default)]
struct Counter {
    value: i32,
}
logic_state!(Counter => "counter");

#[derive(Debug, Default)]
struct Theme {
    dark: bool,
}
logic_state!(Theme => "theme");

#[test]
fn test_binder_drop_unsubscribes() {
    let counter = Logic::new(Counter::default());
    let scope = LogicScope::builder().provide(&counter).build().unwrap();

    {
        let binder = Binder::new(|_: &LogicScope, l: &Logic<Counter>| l.read(|c| c.value));
        binder.resolve_dependencies(scope).unwrap();
        assert_eq!(counter.listener_count(), 1);
        // binder drops here without teardown
    }

    assert_eq!(
        counter.listener_count(),
        0,
        "Binder drop should release its listener"
    );
    assert_eq!(counter.mutate(|c| c.value += 1), Some(()));
}

#[test]
fn test_binder_clone_keeps_subscription_alive() {
    let counter = Logic::new(Counter::default());
    let scope = LogicScope::builder().provide(&counter).build().unwrap();

    let binder = Binder::new(|_: &LogicScope, l: &Logic<Counter>| l.read(|c| c.value));
    binder.resolve_dependencies(scope).unwrap();
    let kept = binder.clone();
    drop(binder);

    assert_eq!(counter.listener_count(), 1);
    counter.mutate(|c| c.value = 4);
    assert_eq!(kept.build(), Some(4));

    drop(kept);
    assert_eq!(counter.listener_count(), 0);
}

#[test]
fn test_dispose_holders_silences_the_whole_scope() {
    let counter = Logic::new(Counter::default());
    let theme = Logic::new(Theme::default());
    let calls = Rc::new(Cell::new(0));

    let scope = LogicScope::builder()
        .provide(&counter)
        .provide(&theme)
        .build()
        .unwrap();
    counter.subscribe(cloned!(calls => move || calls.set(calls.get() + 1)));
    theme.subscribe(cloned!(calls => move || calls.set(calls.get() + 1)));
    counter.emit();
    theme.emit();

    scope.dispose_holders();
    scope.dispose_holders();
    counter.mutate(|c| c.value += 1);
    theme.mutate(|t| t.dark = true);

    assert!(counter.is_disposed());
    assert!(theme.is_disposed());
    assert_eq!(calls.get(), 2);
    // Versions survive disposal
    assert_eq!(counter.version(), 1);
    assert_eq!(theme.version(), 1);
    assert!(!theme.read(|t| t.dark));
}

#[test]
fn test_dispose_is_idempotent() {
    let counter = Logic::new(Counter::default());
    let calls = Rc::new(Cell::new(0));
    counter.subscribe(cloned!(calls => move || calls.set(calls.get() + 1)));

    counter.mutate(|c| c.value += 1);
    counter.dispose();
    counter.dispose();

    counter.emit();
    assert_eq!(counter.mutate(|c| c.value += 1), None);
    let id = counter.subscribe(cloned!(calls => move || calls.set(calls.get() + 100)));
    counter.emit();

    assert_eq!(calls.get(), 1);
    assert_eq!(counter.version(), 1);
    assert_eq!(counter.listener_count(), 0);
    assert!(!counter.unsubscribe(id));
}

#[test]
fn test_listener_disposing_holder_stops_the_cycle() {
    let counter = Logic::new(Counter::default());
    let calls = Rc::new(RefCell::new(Vec::new()));

    counter.subscribe(cloned!(calls, counter => move || {
        calls.borrow_mut().push("first");
        counter.dispose();
    }));
    counter.subscribe(cloned!(calls => move || calls.borrow_mut().push("second")));

    counter.emit();

    assert_eq!(*calls.borrow(), vec!["first"]);
    assert_eq!(counter.version(), 1);
}

#[test]
fn test_unknown_unsubscribe_leaves_others_alone() {
    let counter = Logic::new(Counter::default());
    let other = Logic::new(Counter::default());
    let calls = Rc::new(Cell::new(0));

    counter.subscribe(cloned!(calls => move || calls.set(calls.get() + 1)));
    let foreign = other.subscribe(|| {});
    other.unsubscribe(foreign);

    assert!(!counter.unsubscribe(foreign));
    assert!(!other.unsubscribe(foreign));
    counter.emit();
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_unsubscribe_releasing_last_binder_handle() {
    let counter = Logic::new(Counter::default());
    let scope = LogicScope::builder().provide(&counter).build().unwrap();

    let binder = Binder::new(|_: &LogicScope, l: &Logic<Counter>| l.read(|c| c.value));
    binder.resolve_dependencies(scope).unwrap();
    let id = counter.subscribe(cloned!(binder => move || {
        binder.build();
    }));
    drop(binder);
    assert_eq!(counter.listener_count(), 2);

    // The removed closure owns the last binder, whose drop unsubscribes too
    assert!(counter.unsubscribe(id));
    assert_eq!(counter.listener_count(), 0);
    assert_eq!(counter.mutate(|c| c.value += 1), Some(()));
}

#[test]
fn test_dispose_releasing_last_binder_handle() {
    let counter = Logic::new(Counter::default());
    let scope = LogicScope::builder().provide(&counter).build().unwrap();

    let binder = Binder::new(|_: &LogicScope, l: &Logic<Counter>| l.read(|c| c.value));
    binder.resolve_dependencies(scope).unwrap();
    counter.subscribe(cloned!(binder => move || {
        binder.build();
    }));
    drop(binder);

    counter.dispose();
    assert_eq!(counter.listener_count(), 0);
}
