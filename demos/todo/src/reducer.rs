//! Reducer logic for the todo store.
//!
//! Commands that name nothing (empty text, unknown ids) leave the draft as it
//! was. Adding draws an id from the environment; with an add latency the new
//! todo is handed back as a delayed [`TodoAction::TodoAdded`] event instead of
//! being inserted right away.

use crate::model::{create_todo, toggle_completed};
use crate::types::{TodoAction, TodoState};
use reactive_store_core::{
    delay, effect::Effect, environment::IdGenerator, reducer::Reducer, smallvec, SmallVec,
};
use std::sync::Arc;
use std::time::Duration;

/// Environment dependencies for the todo reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Source of fresh todo ids
    pub ids: Arc<dyn IdGenerator>,
    /// Delay before an added todo is inserted
    pub add_latency: Option<Duration>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment` that adds immediately
    #[must_use]
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            ids,
            add_latency: None,
        }
    }

    /// Delay every add by `latency`
    #[must_use]
    pub fn with_add_latency(mut self, latency: Option<Duration>) -> Self {
        self.add_latency = latency;
        self
    }
}

impl std::fmt::Debug for TodoEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoEnvironment")
            .field("add_latency", &self.add_latency)
            .finish_non_exhaustive()
    }
}

/// Reducer for the todo store
#[derive(Clone, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        tracing::trace!(action = action.name(), "Reducing todo action");

        match action {
            TodoAction::AddTodo { text } => {
                let Some(todo) = create_todo(&text, env.ids.as_ref()) else {
                    tracing::debug!("Ignoring add with empty text");
                    return SmallVec::new();
                };

                if let Some(latency) = env.add_latency {
                    tracing::debug!(id = %todo.id, ?latency, "Scheduling delayed add");
                    return smallvec![delay! {
                        duration: latency,
                        action: TodoAction::TodoAdded { todo }
                    }];
                }

                state.add(todo);
                SmallVec::new()
            },

            TodoAction::TodoAdded { todo } => {
                if !state.add(todo) {
                    tracing::debug!("Ignoring delayed add of a duplicate id");
                }
                SmallVec::new()
            },

            TodoAction::DeleteTodo { id } => {
                if !state.remove(&id) {
                    tracing::debug!(%id, "Ignoring delete of unknown todo");
                }
                SmallVec::new()
            },

            TodoAction::ToggleTodo { id } => {
                if !state.update(&id, toggle_completed) {
                    tracing::debug!(%id, "Ignoring toggle of unknown todo");
                }
                SmallVec::new()
            },

            TodoAction::SetFilter { filter } => {
                state.filter = filter;
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Todo, TodoId, VisibilityFilter};
    use reactive_store_testing::{assertions, mocks::SequentialIds, ReducerTest};

    fn create_test_env() -> TodoEnvironment {
        TodoEnvironment::new(Arc::new(SequentialIds::default()))
    }

    fn add(text: &str) -> TodoAction {
        TodoAction::AddTodo {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_add_todos_in_order() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_actions([add("Wash car"), add("Clean room")])
            .then_state(|state| {
                let texts: Vec<_> = state.todos.iter().map(|t| t.text.as_str()).collect();
                assert_eq!(texts, ["Wash car", "Clean room"]);
                assert!(state.todos.iter().all(|t| !t.completed));
                assert_eq!(state.todos[0].id, TodoId::new("todo-1"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_add_empty_text_is_ignored() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(add(""))
            .then_state(|state| assert_eq!(state.count(), 0))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_delayed_add_schedules_event() {
        let env = create_test_env().with_add_latency(Some(Duration::from_millis(100)));

        ReducerTest::new(TodoReducer::new())
            .with_env(env)
            .given_state(TodoState::new())
            .when_action(add("Wash car"))
            .then_state(|state| assert_eq!(state.count(), 0))
            .then_effects(|effects| {
                let (delay, action) = assertions::expect_delayed_action(effects);
                assert_eq!(delay, Duration::from_millis(100));
                assert!(matches!(
                    action,
                    TodoAction::TodoAdded { ref todo } if todo.text == "Wash car"
                ));
            })
            .run();
    }

    #[test]
    fn test_todo_added_inserts() {
        let todo = Todo {
            id: TodoId::new("late"),
            text: "Wash car".to_string(),
            completed: false,
        };

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::TodoAdded { todo: todo.clone() })
            .when_action(TodoAction::TodoAdded { todo })
            .then_state(|state| assert_eq!(state.count(), 1))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_toggle_twice_round_trips() {
        let id = TodoId::new("todo-1");

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(add("Task 1"))
            .when_action(TodoAction::ToggleTodo { id: id.clone() })
            .then_state(|state| {
                assert!(state.todos[0].completed);
            })
            .run();

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_actions([
                add("Task 1"),
                TodoAction::ToggleTodo { id: id.clone() },
                TodoAction::ToggleTodo { id },
            ])
            .then_state(|state| {
                assert!(!state.todos[0].completed);
            })
            .run();
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_actions([
                add("Wash car"),
                TodoAction::DeleteTodo {
                    id: TodoId::new("zzz"),
                },
                TodoAction::ToggleTodo {
                    id: TodoId::default(),
                },
            ])
            .then_state(|state| {
                assert_eq!(state.count(), 1);
                assert!(!state.todos[0].completed);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_delete_and_filter() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_actions([
                add("Wash car"),
                add("Clean room"),
                TodoAction::DeleteTodo {
                    id: TodoId::new("todo-1"),
                },
                TodoAction::SetFilter {
                    filter: VisibilityFilter::ShowCompleted,
                },
            ])
            .then_state(|state| {
                assert_eq!(state.count(), 1);
                assert_eq!(state.todos[0].text, "Clean room");
                assert_eq!(state.filter, VisibilityFilter::ShowCompleted);
            })
            .run();
    }
}
