//! Integration tests for the todo facade
//!
//! Drives the facade the way a UI would and checks what its selections,
//! history and binding report back.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use reactive_store_runtime::HistoryConfig;
use reactive_store_testing::helpers::{TEST_TIMEOUT, init_test_tracing, wait_for_state};
use reactive_store_testing::mocks::SequentialIds;
use std::sync::Arc;
use std::time::Duration;
use todo::{TodoConfig, TodoId, TodoState, TodosBinding, TodosFacade, TodosView, VisibilityFilter};

// ============================================================================
// Test Fixtures
// ============================================================================

fn facade_with(config: TodoConfig) -> TodosFacade {
    init_test_tracing();
    TodosFacade::with_ids(config, Arc::new(SequentialIds::default()))
}

fn facade() -> TodosFacade {
    facade_with(TodoConfig::default())
}

fn texts(facade: &TodosFacade) -> Vec<String> {
    facade.todos().get().into_iter().map(|t| t.text).collect()
}

/// Pull views from the binding until one satisfies `predicate`
async fn view_until<F>(binding: &mut TodosBinding, predicate: F) -> TodosView
where
    F: Fn(&TodosView) -> bool,
{
    if predicate(binding.current()) {
        return binding.current().clone();
    }
    tokio::time::timeout(TEST_TIMEOUT, async {
        loop {
            let view = binding.next().await.expect("facade dropped");
            if predicate(&view) {
                return view;
            }
        }
    })
    .await
    .expect("binding never produced the expected view")
}

// ============================================================================
// Commands and selections
// ============================================================================

#[tokio::test]
async fn adds_two_todos_in_order() {
    let facade = facade();

    facade.add_todo("Wash car").await.unwrap();
    facade.add_todo("Clean room").await.unwrap();

    let todos = facade.todos().get();
    assert_eq!(texts(&facade), ["Wash car", "Clean room"]);
    assert!(todos.iter().all(|t| !t.completed));
}

#[tokio::test]
async fn empty_text_is_ignored() {
    let facade = facade();
    facade.add_todo("Wash car").await.unwrap();

    let before = facade.store().snapshot();
    facade.add_todo("").await.unwrap();

    assert!(Arc::ptr_eq(&before, &facade.store().snapshot()));
}

#[tokio::test]
async fn toggling_task_twice_round_trips() {
    let facade = facade();
    facade.add_todo("Task 1").await.unwrap();
    let id = facade.todos().get()[0].id.clone();

    facade.toggle_complete(&id).await.unwrap();
    assert!(facade.todos().get()[0].completed);

    facade.toggle_complete(&id).await.unwrap();
    assert!(!facade.todos().get()[0].completed);
}

#[tokio::test]
async fn unknown_ids_leave_todos_alone() {
    let facade = facade();
    facade.add_todo("Wash car").await.unwrap();
    let before = facade.todos().get();

    facade.delete_todo(&TodoId::new("missing")).await.unwrap();
    facade.toggle_complete(&TodoId::new("missing")).await.unwrap();
    facade.delete_todo(&TodoId::default()).await.unwrap();

    assert_eq!(facade.todos().get(), before);
}

#[tokio::test]
async fn delete_removes_only_that_todo() {
    let facade = facade();
    facade.add_todo("Wash car").await.unwrap();
    facade.add_todo("Clean room").await.unwrap();

    facade.delete_todo(&TodoId::new("todo-1")).await.unwrap();

    assert_eq!(texts(&facade), ["Clean room"]);
}

#[tokio::test]
async fn filter_hides_and_restores_todos() {
    let facade = facade();
    facade.add_todo("Wash car").await.unwrap();
    facade.add_todo("Clean room").await.unwrap();

    facade.update_filter(VisibilityFilter::ShowCompleted).await.unwrap();
    assert_eq!(facade.filter().get(), VisibilityFilter::ShowCompleted);
    assert!(facade.visible_todos().get().is_empty());

    facade.update_filter(VisibilityFilter::ShowAll).await.unwrap();
    assert_eq!(facade.visible_todos().get().len(), 2);
}

#[tokio::test]
async fn todos_selection_sees_the_next_add() {
    let facade = facade();
    let mut todos = facade.todos();
    assert!(todos.current().is_empty());

    facade.add_todo("Wash car").await.unwrap();

    let next = tokio::time::timeout(TEST_TIMEOUT, todos.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next.len(), 1);
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn undoing_every_mutation_returns_to_empty() {
    let facade = facade();
    let history = facade.history();
    let initial = facade.store().snapshot();

    facade.add_todo("Wash car").await.unwrap();
    facade.add_todo("Clean room").await.unwrap();
    facade.toggle_complete(&TodoId::new("todo-1")).await.unwrap();
    facade.update_filter(VisibilityFilter::ShowActive).await.unwrap();

    for _ in 0..4 {
        assert!(history.undo().await);
    }

    assert!(!history.has_past());
    assert!(history.has_future());
    assert_eq!(*facade.store().snapshot(), *initial);
}

#[tokio::test]
async fn reselecting_the_active_filter_records_nothing() {
    let facade = facade();
    facade.update_filter(VisibilityFilter::ShowAll).await.unwrap();

    assert_eq!(facade.filter().get(), VisibilityFilter::ShowAll);
    assert!(!facade.history().has_past());
}

#[tokio::test]
async fn redo_past_the_end_is_a_no_op() {
    let facade = facade();
    let history = facade.history();

    facade.add_todo("Wash car").await.unwrap();
    history.undo().await;
    assert!(history.redo().await);
    assert!(!history.has_future());

    let before = facade.store().snapshot();
    assert!(!history.redo().await);
    assert!(Arc::ptr_eq(&before, &facade.store().snapshot()));
    assert_eq!(texts(&facade), ["Wash car"]);
}

#[tokio::test]
async fn new_mutation_after_undo_clears_future() {
    let facade = facade();
    let history = facade.history();

    facade.add_todo("Wash car").await.unwrap();
    facade.add_todo("Clean room").await.unwrap();
    history.undo().await;
    assert!(history.has_future());

    facade.add_todo("Buy milk").await.unwrap();

    assert!(!history.has_future());
    assert_eq!(texts(&facade), ["Wash car", "Buy milk"]);
}

#[tokio::test]
async fn max_age_bounds_undo_depth() {
    let facade = facade_with(TodoConfig::default().with_history(HistoryConfig::default().with_max_age(2)));
    let history = facade.history();

    for text in ["a", "b", "c", "d"] {
        facade.add_todo(text).await.unwrap();
    }

    assert_eq!(history.status().past, 2);
    assert!(history.undo().await);
    assert!(history.undo().await);
    assert!(!history.undo().await);
    assert_eq!(texts(&facade), ["a", "b"]);
}

#[tokio::test]
async fn jump_to_past_restores_that_snapshot() {
    let facade = facade();
    let history = facade.history();

    for text in ["a", "b", "c"] {
        facade.add_todo(text).await.unwrap();
    }

    // past[0] is the empty list, past[1] holds "a"
    assert!(history.jump_to_past(1).await);
    assert_eq!(texts(&facade), ["a"]);
    assert_eq!(history.status().future, 2);

    assert!(history.jump_to_future(1).await);
    assert_eq!(texts(&facade), ["a", "b", "c"]);
}

#[tokio::test]
async fn reset_restores_empty_list_and_clears_history() {
    let facade = facade();
    facade.add_todo("Wash car").await.unwrap();
    facade.update_filter(VisibilityFilter::ShowCompleted).await.unwrap();

    facade.reset().await;

    assert_eq!(*facade.store().snapshot(), TodoState::default());
    assert!(!facade.history().has_past());
    assert!(!facade.history().has_future());
}

// ============================================================================
// Delayed adds
// ============================================================================

#[tokio::test]
async fn delayed_add_lands_after_latency() {
    let facade = facade_with(TodoConfig::default().with_add_latency(Duration::from_millis(30)));

    let mut handle = facade.add_todo("Wash car").await.unwrap();
    assert!(facade.is_loading());
    assert!(facade.todos().get().is_empty());

    handle.wait_with_timeout(TEST_TIMEOUT).await.unwrap();

    assert!(!facade.is_loading());
    assert_eq!(texts(&facade), ["Wash car"]);
}

#[tokio::test]
async fn undoing_a_delayed_add_takes_one_step() {
    let facade = facade_with(TodoConfig::default().with_add_latency(Duration::from_millis(20)));
    let history = facade.history();

    let mut handle = facade.add_todo("Wash car").await.unwrap();
    assert!(!history.has_past());

    handle.wait_with_timeout(TEST_TIMEOUT).await.unwrap();
    assert_eq!(history.status().past, 1);

    assert!(history.undo().await);
    assert!(facade.todos().get().is_empty());
    assert!(!history.has_past());
}

#[tokio::test]
async fn undo_walks_back_mixed_delayed_and_immediate_changes() {
    let facade = facade_with(TodoConfig::default().with_add_latency(Duration::from_millis(5)));
    let history = facade.history();

    for text in ["Wash car", "Clean room"] {
        let mut handle = facade.add_todo(text).await.unwrap();
        handle.wait_with_timeout(TEST_TIMEOUT).await.unwrap();
    }
    facade.toggle_complete(&TodoId::new("todo-1")).await.unwrap();
    facade.update_filter(VisibilityFilter::ShowActive).await.unwrap();

    for _ in 0..4 {
        assert!(history.undo().await);
    }
    assert!(!history.has_past());
    assert_eq!(*facade.store().snapshot(), TodoState::default());
}

#[tokio::test]
async fn shutdown_keeps_a_scheduled_add() {
    let facade = facade_with(TodoConfig::default().with_add_latency(Duration::from_millis(20)));

    facade.add_todo("Wash car").await.unwrap();
    facade.store().runtime().shutdown(TEST_TIMEOUT).await.unwrap();

    assert_eq!(texts(&facade), ["Wash car"]);
    assert!(!facade.is_loading());
}

#[tokio::test]
async fn delayed_adds_keep_request_order() {
    let facade = facade_with(TodoConfig::default().with_add_latency(Duration::from_millis(10)));

    facade.add_todo("Wash car").await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    facade.add_todo("Clean room").await.unwrap();

    let state = wait_for_state(facade.store().subscribe(), |s| s.count() == 2, TEST_TIMEOUT)
        .await
        .expect("both adds should land");
    let landed: Vec<_> = state.todos.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(landed, ["Wash car", "Clean room"]);
}

// ============================================================================
// Binding
// ============================================================================

#[tokio::test]
async fn binding_rerenders_on_commits_and_history() {
    let facade = facade();
    let mut binding = TodosBinding::subscribe(&facade);
    assert_eq!(binding.current(), &TodosView::default());

    facade.add_todo("Wash car").await.unwrap();
    let view = view_until(&mut binding, |v| v.total == 1 && v.has_past).await;
    assert_eq!(view.todos[0].text, "Wash car");

    facade.update_filter(VisibilityFilter::ShowCompleted).await.unwrap();
    let view = view_until(&mut binding, |v| v.filter == VisibilityFilter::ShowCompleted).await;
    assert!(view.todos.is_empty());
    assert_eq!(view.total, 1);

    facade.history().undo().await;
    let view = view_until(&mut binding, |v| v.filter == VisibilityFilter::ShowAll).await;
    assert!(view.has_future);
}

#[tokio::test]
async fn binding_reports_loading_during_delayed_add() {
    let facade = facade_with(TodoConfig::default().with_add_latency(Duration::from_millis(30)));
    let mut binding = TodosBinding::subscribe(&facade);

    facade.add_todo("Wash car").await.unwrap();
    view_until(&mut binding, |v| v.is_loading).await;

    let view = view_until(&mut binding, |v| !v.is_loading && v.total == 1).await;
    assert_eq!(view.todos[0].text, "Wash car");
}

#[tokio::test]
async fn binding_ends_when_facade_is_dropped() {
    let facade = facade();
    let mut binding = TodosBinding::subscribe(&facade);

    drop(facade);

    assert_eq!(binding.next().await, None);
}
