//! State and actions of the todo store.

use crate::model::{Todo, TodoId, TodoPatch, VisibilityFilter};
use reactive_store_macros::Action;
use serde::{Deserialize, Serialize};

/// Snapshot of the todo store
///
/// Todos keep insertion order and ids are unique within the list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoState {
    /// All todos, oldest first
    pub todos: Vec<Todo>,
    /// Active visibility filter
    pub filter: VisibilityFilter,
}

impl TodoState {
    /// Creates an empty state showing all todos
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of todos
    #[must_use]
    pub fn count(&self) -> usize {
        self.todos.len()
    }

    /// Returns the number of completed todos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.completed).count()
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| &t.id == id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn exists(&self, id: &TodoId) -> bool {
        !id.is_empty() && self.get(id).is_some()
    }

    /// Appends a todo; a duplicate id leaves the list alone
    pub fn add(&mut self, todo: Todo) -> bool {
        if todo.id.is_empty() || self.get(&todo.id).is_some() {
            return false;
        }
        self.todos.push(todo);
        true
    }

    /// Removes the todo with `id`, if any
    pub fn remove(&mut self, id: &TodoId) -> bool {
        let before = self.todos.len();
        self.todos.retain(|t| &t.id != id);
        self.todos.len() != before
    }

    /// Merges the patch produced by `mutator` into the todo with `id`
    pub fn update<F>(&mut self, id: &TodoId, mutator: F) -> bool
    where
        F: FnOnce(&Todo) -> TodoPatch,
    {
        if id.is_empty() {
            return false;
        }
        let Some(todo) = self.todos.iter_mut().find(|t| &t.id == id) else {
            return false;
        };
        let patch = mutator(todo);
        todo.merge(patch);
        true
    }
}

/// Actions the todo reducer understands
#[derive(Action, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoAction {
    /// Command: Add a todo with the given text
    #[command]
    AddTodo {
        /// Text of the new todo
        text: String,
    },

    /// Command: Delete a todo
    #[command]
    DeleteTodo {
        /// Todo to delete
        id: TodoId,
    },

    /// Command: Flip a todo's completion flag
    #[command]
    ToggleTodo {
        /// Todo to toggle
        id: TodoId,
    },

    /// Command: Change the visibility filter
    #[command]
    SetFilter {
        /// New filter
        filter: VisibilityFilter,
    },

    /// Event: A scheduled todo is ready to be inserted
    #[event]
    TodoAdded {
        /// The todo created when the add was requested
        todo: Todo,
    },
}
