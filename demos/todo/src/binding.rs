//! UI binding: a render-ready view of a [`TodosFacade`].
//!
//! A binding pairs the latest snapshot with the history and loading status,
//! so a view layer re-renders from one value instead of three subscriptions.
//! Dropping the binding unsubscribes it.

use crate::facade::TodosFacade;
use crate::model::{Todo, VisibilityFilter};
use crate::query::visible_todos;
use crate::types::TodoState;
use futures::Stream;
use reactive_store_runtime::HistoryStatus;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Everything a todo list view needs to render
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TodosView {
    /// Active filter
    pub filter: VisibilityFilter,
    /// Todos the filter lets through
    pub todos: Vec<Todo>,
    /// Number of todos regardless of the filter
    pub total: usize,
    /// Whether undo is available
    pub has_past: bool,
    /// Whether redo is available
    pub has_future: bool,
    /// Whether a delayed add is still in flight
    pub is_loading: bool,
}

impl TodosView {
    fn render(state: &TodoState, history: HistoryStatus, pending: usize) -> Self {
        Self {
            filter: state.filter,
            todos: visible_todos(state),
            total: state.count(),
            has_past: history.has_past(),
            has_future: history.has_future(),
            is_loading: pending > 0,
        }
    }
}

/// Live [`TodosView`] of a facade
#[derive(Debug)]
pub struct TodosBinding {
    state: watch::Receiver<Arc<TodoState>>,
    history: watch::Receiver<HistoryStatus>,
    loading: watch::Receiver<usize>,
    view: TodosView,
}

impl TodosBinding {
    /// Bind to `facade`; the first view is available immediately
    #[must_use]
    pub fn subscribe(facade: &TodosFacade) -> Self {
        let mut binding = Self {
            state: facade.store().subscribe(),
            history: facade.history().subscribe(),
            loading: facade.subscribe_loading(),
            view: TodosView::default(),
        };
        binding.view = binding.render();
        binding
    }

    /// The view as of the last render
    #[must_use]
    pub const fn current(&self) -> &TodosView {
        &self.view
    }

    /// Re-render from the latest values without waiting
    pub fn refresh(&mut self) -> &TodosView {
        self.view = self.render();
        &self.view
    }

    /// Wait for the next change that alters the view and return it
    ///
    /// Returns `None` once the facade is gone.
    pub async fn next(&mut self) -> Option<TodosView> {
        loop {
            tokio::select! {
                changed = self.state.changed() => changed.ok()?,
                changed = self.history.changed() => changed.ok()?,
                changed = self.loading.changed() => changed.ok()?,
            }

            let view = self.render();
            if view != self.view {
                self.view = view.clone();
                return Some(view);
            }
        }
    }

    /// Current view followed by every re-render
    pub fn into_stream(mut self) -> impl Stream<Item = TodosView> + Send {
        async_stream::stream! {
            yield self.view.clone();
            while let Some(view) = self.next().await {
                yield view;
            }
        }
    }

    fn render(&mut self) -> TodosView {
        let state = Arc::clone(&self.state.borrow_and_update());
        let history = *self.history.borrow_and_update();
        let pending = *self.loading.borrow_and_update();
        TodosView::render(&state, history, pending)
    }
}
