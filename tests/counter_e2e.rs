use spark_logic::{Binder, BinderState, Logic, LogicScope, cloned, logic_state};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
struct Counter {
    value: i32,
}
logic_state!(Counter => "counter");

fn counter_scope(counter: &Logic<Counter>) -> LogicScope {
    LogicScope::builder().provide(counter).build().unwrap()
}

fn count_label(_cx: &LogicScope, logic: &Logic<Counter>) -> String {
    logic.read(|c| format!("Count: {}", c.value))
}

#[test]
fn counter_renders_initial_and_incremented_value() {
    let counter = Logic::new(Counter::default());
    let scope = counter_scope(&counter);

    let binder = Binder::new(count_label);
    binder.resolve_dependencies(scope).unwrap();

    assert_eq!(binder.build().as_deref(), Some("Count: 0"));

    counter.mutate(|c| c.value += 1);

    assert_eq!(binder.build().as_deref(), Some("Count: 1"));
    assert_eq!(counter.version(), 1);
    assert_eq!(binder.last_seen_version(), Some(1));
}

#[test]
fn no_predicate_rerenders_on_every_notification() {
    let counter = Logic::new(Counter::default());
    let binder = Binder::new(count_label);
    binder
        .resolve_dependencies(counter_scope(&counter))
        .unwrap();
    binder.build();

    for _ in 0..5 {
        counter.mutate(|c| c.value += 1);
        assert!(binder.needs_build());
        binder.build();
    }

    assert_eq!(binder.render_count(), 6);
    assert_eq!(binder.build().as_deref(), Some("Count: 5"));
}

#[test]
fn false_predicate_renders_exactly_once() {
    let counter = Logic::new(Counter::default());
    let binder = Binder::builder(count_label).build_when(|_| false).build();
    binder
        .resolve_dependencies(counter_scope(&counter))
        .unwrap();

    assert_eq!(binder.build().as_deref(), Some("Count: 0"));

    for _ in 0..10 {
        counter.mutate(|c| c.value += 1);
        binder.build();
    }

    assert_eq!(binder.render_count(), 1);
    assert_eq!(binder.notification_count(), 10);
    assert_eq!(binder.build().as_deref(), Some("Count: 0"));
}

#[test]
fn side_effect_runs_for_every_notification() {
    let counter = Logic::new(Counter::default());
    let effects = Rc::new(Cell::new(0));

    let binder = Binder::builder(count_label)
        .listen(cloned!(effects => move |_, _| effects.set(effects.get() + 1)))
        .build_when(|c| c.value % 2 == 0)
        .build();
    binder
        .resolve_dependencies(counter_scope(&counter))
        .unwrap();
    binder.build();

    for _ in 0..7 {
        counter.mutate(|c| c.value += 1);
        binder.build();
    }

    assert_eq!(effects.get(), 7);
    assert_eq!(binder.notification_count(), 7);
    // Initial render plus values 2, 4, 6
    assert_eq!(binder.render_count(), 4);
}

#[test]
fn host_is_asked_to_rebuild_only_when_predicate_passes() {
    let counter = Logic::new(Counter::default());
    let requests = Rc::new(Cell::new(0));

    let binder = Binder::builder(count_label)
        .build_when(|c| c.value >= 3)
        .on_rebuild_requested(cloned!(requests => move || requests.set(requests.get() + 1)))
        .build();
    binder
        .resolve_dependencies(counter_scope(&counter))
        .unwrap();
    binder.build();

    for _ in 0..4 {
        counter.mutate(|c| c.value += 1);
    }

    assert_eq!(requests.get(), 2);
    assert_eq!(binder.build().as_deref(), Some("Count: 4"));
}

#[test]
fn teardown_stops_rendering_and_listening() {
    let counter = Logic::new(Counter::default());
    let binder = Binder::new(count_label);
    binder
        .resolve_dependencies(counter_scope(&counter))
        .unwrap();
    binder.build();
    assert_eq!(counter.listener_count(), 1);

    binder.teardown();
    binder.teardown();
    counter.mutate(|c| c.value += 1);

    assert_eq!(binder.state(), BinderState::Detached);
    assert_eq!(counter.listener_count(), 0);
    assert_eq!(binder.notification_count(), 0);
    assert_eq!(binder.build(), None);

    // Terminal: resolving again is ignored
    binder
        .resolve_dependencies(counter_scope(&counter))
        .unwrap();
    assert_eq!(binder.state(), BinderState::Detached);
}
