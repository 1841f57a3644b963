//! The todo facade: the one object a UI talks to.
//!
//! The facade owns the store, its queries and its history. Commands that name
//! nothing (empty text, empty or unknown ids) return without touching the
//! store; only a store that is shutting down yields an error.

use crate::config::TodoConfig;
use crate::model::{Todo, TodoId, VisibilityFilter};
use crate::query::TodosQuery;
use crate::store::TodosStore;
use crate::types::{TodoAction, TodoState};
use reactive_store_core::environment::{IdGenerator, UuidIds};
use reactive_store_runtime::{EffectHandle, Selection, StateHistory, StoreError};
use std::sync::Arc;
use tokio::sync::watch;

/// Build a facade with default settings and random ids
#[must_use]
pub fn make_facade() -> TodosFacade {
    TodosFacade::new(TodoConfig::default())
}

/// Commands, selections and history for one todo list
#[derive(Clone)]
pub struct TodosFacade {
    store: TodosStore,
    query: TodosQuery,
    history: StateHistory<TodoState>,
}

impl TodosFacade {
    /// Build a facade drawing ids from UUID v4
    #[must_use]
    pub fn new(config: TodoConfig) -> Self {
        Self::with_ids(config, Arc::new(UuidIds))
    }

    /// Build a facade drawing ids from `ids`
    #[must_use]
    pub fn with_ids(config: TodoConfig, ids: Arc<dyn IdGenerator>) -> Self {
        let store = TodosStore::new(&config, ids);
        let history = StateHistory::attach(store.runtime().cell(), config.history);
        tracing::debug!(add_latency = ?config.add_latency, "Todo facade created");

        Self {
            query: TodosQuery::new(store.clone()),
            store,
            history,
        }
    }

    /// Add a todo with `text`; empty text is ignored
    ///
    /// With an add latency configured the todo lands later; wait on the
    /// returned handle to observe it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once the store is shutting down.
    #[tracing::instrument(skip(self))]
    pub async fn add_todo(&self, text: &str) -> Result<EffectHandle, StoreError> {
        if text.is_empty() {
            return Ok(EffectHandle::completed());
        }
        self.store
            .send(TodoAction::AddTodo {
                text: text.to_string(),
            })
            .await
    }

    /// Delete the todo with `id`; empty or unknown ids are ignored
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once the store is shutting down.
    #[tracing::instrument(skip(self, id), fields(id = %id))]
    pub async fn delete_todo(&self, id: &TodoId) -> Result<EffectHandle, StoreError> {
        if !self.knows(id) {
            return Ok(EffectHandle::completed());
        }
        self.store.send(TodoAction::DeleteTodo { id: id.clone() }).await
    }

    /// Flip the completion flag of the todo with `id`; empty or unknown ids are ignored
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once the store is shutting down.
    #[tracing::instrument(skip(self, id), fields(id = %id))]
    pub async fn toggle_complete(&self, id: &TodoId) -> Result<EffectHandle, StoreError> {
        if !self.knows(id) {
            return Ok(EffectHandle::completed());
        }
        self.store.send(TodoAction::ToggleTodo { id: id.clone() }).await
    }

    /// Replace the visibility filter
    ///
    /// Re-selecting the active filter leaves the snapshot equal, so nothing
    /// is committed or recorded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once the store is shutting down.
    #[tracing::instrument(skip(self))]
    pub async fn update_filter(
        &self,
        filter: VisibilityFilter,
    ) -> Result<EffectHandle, StoreError> {
        self.store.send(TodoAction::SetFilter { filter }).await
    }

    /// The full todo list
    #[must_use]
    pub fn todos(&self) -> Selection<TodoState, Vec<Todo>> {
        self.query.todos()
    }

    /// The active filter
    #[must_use]
    pub fn filter(&self) -> Selection<TodoState, VisibilityFilter> {
        self.query.filter()
    }

    /// Todos the active filter lets through
    #[must_use]
    pub fn visible_todos(&self) -> Selection<TodoState, Vec<Todo>> {
        self.query.visible_todos()
    }

    /// Undo/redo for this list
    #[must_use]
    pub const fn history(&self) -> &StateHistory<TodoState> {
        &self.history
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &TodosStore {
        &self.store
    }

    /// Queries over the underlying store
    #[must_use]
    pub const fn query(&self) -> &TodosQuery {
        &self.query
    }

    /// True while a delayed add is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.store.runtime().pending_effects() > 0
    }

    /// Observe the number of in-flight effects
    #[must_use]
    pub fn subscribe_loading(&self) -> watch::Receiver<usize> {
        self.store.runtime().subscribe_pending()
    }

    /// Back to an empty list with no history
    pub async fn reset(&self) {
        self.store.reset().await;
    }

    fn knows(&self, id: &TodoId) -> bool {
        self.store.snapshot().exists(id)
    }
}

impl std::fmt::Debug for TodosFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodosFacade")
            .field("store", &self.store)
            .field("history", &self.history)
            .finish()
    }
}
