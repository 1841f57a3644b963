//! Read side of the todo store.

use crate::model::{Todo, VisibilityFilter};
use crate::store::TodosStore;
use crate::types::TodoState;
use reactive_store_runtime::Selection;

/// Todos visible under the state's current filter, in list order
#[must_use]
pub fn visible_todos(state: &TodoState) -> Vec<Todo> {
    state
        .todos
        .iter()
        .filter(|todo| state.filter.matches(todo))
        .cloned()
        .collect()
}

/// Observable selections over a [`TodosStore`]
///
/// Each selection starts with the current value and reports a change only
/// when the selected slice differs from what it last reported.
#[derive(Clone, Debug)]
pub struct TodosQuery {
    store: TodosStore,
}

impl TodosQuery {
    /// Build queries over `store`
    #[must_use]
    pub const fn new(store: TodosStore) -> Self {
        Self { store }
    }

    /// The full todo list, ignoring the filter
    #[must_use]
    pub fn todos(&self) -> Selection<TodoState, Vec<Todo>> {
        self.store.runtime().select(|s: &TodoState| s.todos.clone())
    }

    /// The active visibility filter
    #[must_use]
    pub fn filter(&self) -> Selection<TodoState, VisibilityFilter> {
        self.store.runtime().select(|s: &TodoState| s.filter)
    }

    /// The todos the current filter lets through
    #[must_use]
    pub fn visible_todos(&self) -> Selection<TodoState, Vec<Todo>> {
        self.store.runtime().select(visible_todos)
    }
}
