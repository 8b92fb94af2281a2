use super::*;
use std::sync::Arc;

use crate::runtime::{DefaultScheduler, Runtime};

fn runtime() -> Runtime {
    Runtime::new(Arc::new(DefaultScheduler))
}

#[test]
fn first_build_seeds_cells_from_initial_values() {
    let runtime = runtime();
    let mut scope = Scope::new(&[], runtime.handle());

    let (count, _) = scope.use_state(3);
    let (label, _) = scope.use_state_with(|| String::from("x"));

    assert_eq!(count, 3);
    assert_eq!(label, "x");
    assert_eq!(scope.cursor(), 2);
}

#[test]
fn rebuild_folds_pending_updates_in_enqueue_order() {
    let runtime = runtime();
    let mut first = Scope::new(&[], runtime.handle());
    let (_, set_count) = first.use_state(1);
    let cells = first.into_cells();

    set_count.update(|n| n + 1);
    set_count.update(|n| n * 10);
    set_count.update(|n| n - 3);
    assert!(runtime.has_render_request());

    let mut second = Scope::new(&cells, runtime.handle());
    let (count, _) = second.use_state(1);

    assert_eq!(count, 17);
}

#[test]
fn folding_leaves_the_previous_queue_for_a_restarted_build() {
    let runtime = runtime();
    let mut first = Scope::new(&[], runtime.handle());
    let (_, set_count) = first.use_state(0);
    let cells = first.into_cells();
    set_count.set(5);

    let (discarded, _) = Scope::new(&cells, runtime.handle()).use_state(0);
    let (restarted, _) = Scope::new(&cells, runtime.handle()).use_state(0);

    assert_eq!(discarded, 5);
    assert_eq!(restarted, 5);
}

#[test]
fn initial_value_is_ignored_once_the_cell_exists() {
    let runtime = runtime();
    let mut first = Scope::new(&[], runtime.handle());
    first.use_state(1);
    let cells = first.into_cells();

    let mut second = Scope::new(&cells, runtime.handle());
    let (value, _) = second.use_state_with(|| -> i32 { panic!("initializer must not run") });

    assert_eq!(value, 1);
}

#[test]
fn new_cells_start_with_empty_queues() {
    let runtime = runtime();
    let mut first = Scope::new(&[], runtime.handle());
    let (_, set_first) = first.use_state(1);
    let first_cells = first.into_cells();
    set_first.update(|n| n + 1);

    let mut second = Scope::new(&first_cells, runtime.handle());
    let (value, _) = second.use_state(1);
    let second_cells = second.into_cells();

    let mut third = Scope::new(&second_cells, runtime.handle());
    let (again, _) = third.use_state(1);

    assert_eq!(value, 2);
    assert_eq!(again, 2);
}

#[test]
#[should_panic(expected = "state cell 0 changed type between builds")]
fn reordering_cells_with_different_types_panics() {
    let runtime = runtime();
    let mut first = Scope::new(&[], runtime.handle());
    first.use_state(1i32);
    first.use_state(String::from("a"));
    let cells = first.into_cells();

    let mut second = Scope::new(&cells, runtime.handle());
    second.use_state(String::from("a"));
}

#[test]
fn setter_of_a_retired_cell_is_inert() {
    let runtime = runtime();
    let mut scope = Scope::new(&[], runtime.handle());
    let (_, setter) = scope.use_state(0);
    assert!(setter.is_live());

    drop(scope.into_cells());
    setter.set(1);

    assert!(!setter.is_live());
    assert!(!runtime.has_render_request());
}
