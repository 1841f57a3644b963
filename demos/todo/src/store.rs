//! The todo store: entity operations over the runtime [`Store`].
//!
//! Every operation runs on a draft of the current snapshot and commits it
//! exactly once, even when nothing changed, so observers and the history
//! plugin see one commit per call.

use crate::config::TodoConfig;
use crate::model::{Todo, TodoId, TodoPatch, VisibilityFilter};
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::types::{TodoAction, TodoState};
use reactive_store_core::environment::IdGenerator;
use reactive_store_runtime::{EffectHandle, Store, StoreError};
use std::sync::Arc;
use tokio::sync::watch;

/// Runtime store specialised to todos
pub type TodoRuntime = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// Todo store with entity-style operations
#[derive(Clone)]
pub struct TodosStore {
    inner: TodoRuntime,
}

impl TodosStore {
    /// Create an empty store
    #[must_use]
    pub fn new(config: &TodoConfig, ids: Arc<dyn IdGenerator>) -> Self {
        Self::with_state(TodoState::default(), config, ids)
    }

    /// Create a store starting from `initial`
    #[must_use]
    pub fn with_state(initial: TodoState, config: &TodoConfig, ids: Arc<dyn IdGenerator>) -> Self {
        let environment = TodoEnvironment::new(ids).with_add_latency(config.add_latency);
        Self {
            inner: Store::with_config(initial, TodoReducer::new(), environment, config.store.clone()),
        }
    }

    /// The runtime store underneath
    #[must_use]
    pub const fn runtime(&self) -> &TodoRuntime {
        &self.inner
    }

    /// Latest committed snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<TodoState> {
        self.inner.snapshot()
    }

    /// Subscribe to committed snapshots
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<TodoState>> {
        self.inner.subscribe()
    }

    /// Append a todo, keeping order; a duplicate id leaves the list alone
    pub async fn add(&self, todo: Todo) -> Arc<TodoState> {
        self.inner
            .apply(move |draft| {
                draft.add(todo);
            })
            .await
    }

    /// Remove the todo with `id`; no-op if absent
    pub async fn remove(&self, id: &TodoId) -> Arc<TodoState> {
        self.inner
            .apply(|draft| {
                draft.remove(id);
            })
            .await
    }

    /// Merge the patch produced by `mutator` into the todo with `id`
    ///
    /// No-op if `id` is empty or unknown; `mutator` is then never called.
    pub async fn update<F>(&self, id: &TodoId, mutator: F) -> Arc<TodoState>
    where
        F: FnOnce(&Todo) -> TodoPatch,
    {
        self.inner
            .apply(|draft| {
                draft.update(id, mutator);
            })
            .await
    }

    /// Replace the visibility filter
    pub async fn set_filter(&self, filter: VisibilityFilter) -> Arc<TodoState> {
        self.inner.apply(|draft| draft.filter = filter).await
    }

    /// Run an arbitrary recipe on a draft and commit it
    pub async fn apply<F>(&self, recipe: F) -> Arc<TodoState>
    where
        F: FnOnce(&mut TodoState),
    {
        self.inner.apply(recipe).await
    }

    /// Send an action through the todo reducer
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once the store is shutting down.
    pub async fn send(&self, action: TodoAction) -> Result<EffectHandle, StoreError> {
        self.inner.send(action).await
    }

    /// Restore the state the store was created with
    pub async fn reset(&self) {
        self.inner.reset().await;
    }
}

impl std::fmt::Debug for TodosStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodosStore")
            .field("todos", &self.snapshot().count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::toggle_completed;
    use reactive_store_testing::mocks::SequentialIds;

    fn store() -> TodosStore {
        TodosStore::new(&TodoConfig::default(), Arc::new(SequentialIds::default()))
    }

    fn todo(id: &str, text: &str) -> Todo {
        Todo {
            id: TodoId::new(id),
            text: text.to_string(),
            completed: false,
        }
    }

    #[tokio::test]
    async fn entity_operations_commit() {
        let store = store();

        store.add(todo("a", "Wash car")).await;
        store.add(todo("b", "Clean room")).await;
        let state = store.update(&TodoId::new("a"), toggle_completed).await;
        assert!(state.todos[0].completed);

        let state = store.remove(&TodoId::new("b")).await;
        assert_eq!(state.count(), 1);

        let state = store.set_filter(VisibilityFilter::ShowActive).await;
        assert_eq!(state.filter, VisibilityFilter::ShowActive);
    }

    #[tokio::test]
    async fn no_op_still_commits_an_equal_snapshot() {
        let store = store();
        store.add(todo("a", "Wash car")).await;

        let mut receiver = store.subscribe();
        let before = store.snapshot();
        let after = store.remove(&TodoId::new("zzz")).await;

        assert!(receiver.has_changed().unwrap());
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);
    }

    #[tokio::test]
    async fn update_skips_mutator_for_unknown_id() {
        let store = store();
        store
            .update(&TodoId::new("missing"), |_| unreachable!("no todo to patch"))
            .await;
        assert_eq!(store.snapshot().count(), 0);
    }

    #[tokio::test]
    async fn reset_restores_initial_state() {
        let mut initial = TodoState::new();
        initial.add(todo("seed", "Seed"));
        let store = TodosStore::with_state(
            initial.clone(),
            &TodoConfig::default(),
            Arc::new(SequentialIds::default()),
        );

        store.add(todo("a", "Wash car")).await;
        store.reset().await;

        assert_eq!(*store.snapshot(), initial);
    }
}
