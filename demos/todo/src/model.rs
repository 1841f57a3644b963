//! Todo entity model.
//!
//! A todo list is an ordered collection of [`Todo`] entries plus the
//! [`VisibilityFilter`] the UI uses to decide which of them to show.

use reactive_store_core::environment::IdGenerator;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Unique identifier for a todo
///
/// An empty id never matches anything: commands given one are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Wraps an existing id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Draws a fresh id from a generator
    #[must_use]
    pub fn generate(ids: &dyn IdGenerator) -> Self {
        Self(ids.next_id())
    }

    /// Returns true for the empty id
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A single todo
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier, fixed at creation
    pub id: TodoId,
    /// What needs doing; never empty
    pub text: String,
    /// Whether the todo is done
    #[serde(default)]
    pub completed: bool,
}

impl Todo {
    /// Returns the patch that flips `completed`
    #[must_use]
    pub const fn toggled(&self) -> TodoPatch {
        TodoPatch {
            text: None,
            completed: Some(!self.completed),
        }
    }

    /// Merges a patch into this todo
    ///
    /// An empty `text` in the patch is ignored.
    pub fn merge(&mut self, patch: TodoPatch) {
        if let Some(text) = patch.text.filter(|t| !t.is_empty()) {
            self.text = text;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

/// Partial update of a [`Todo`]; `None` fields are left alone
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    /// Replacement text
    pub text: Option<String>,
    /// Replacement completion flag
    pub completed: Option<bool>,
}

/// Mutator that flips a todo's completion flag
#[must_use]
pub const fn toggle_completed(todo: &Todo) -> TodoPatch {
    todo.toggled()
}

/// Create a new, incomplete todo with a fresh id
///
/// Returns `None` for empty text.
#[must_use]
pub fn create_todo(text: &str, ids: &dyn IdGenerator) -> Option<Todo> {
    if text.is_empty() {
        return None;
    }

    Some(Todo {
        id: TodoId::generate(ids),
        text: text.to_string(),
        completed: false,
    })
}

/// Which todos the UI shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisibilityFilter {
    /// Every todo
    #[default]
    ShowAll,
    /// Only todos that are not completed
    ShowActive,
    /// Only completed todos
    ShowCompleted,
}

impl VisibilityFilter {
    /// All filters, in display order
    pub const ALL: [Self; 3] = [Self::ShowAll, Self::ShowActive, Self::ShowCompleted];

    /// Wire name of the filter
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShowAll => "SHOW_ALL",
            Self::ShowActive => "SHOW_ACTIVE",
            Self::ShowCompleted => "SHOW_COMPLETED",
        }
    }

    /// Whether `todo` is visible under this filter
    #[must_use]
    pub const fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::ShowAll => true,
            Self::ShowActive => !todo.completed,
            Self::ShowCompleted => todo.completed,
        }
    }
}

impl std::fmt::Display for VisibilityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown filter name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown visibility filter: {0}")]
pub struct ParseFilterError(String);

impl FromStr for VisibilityFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == s)
            .ok_or_else(|| ParseFilterError(s.to_string()))
    }
}
