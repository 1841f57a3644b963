//! Snapshot cell - the single source of truth behind a [`Store`](crate::Store)
//!
//! A [`StateCell`] owns the live snapshot (`Arc<S>`) and is the only place
//! where a new snapshot is ever committed. Every commit:
//!
//! 1. Replaces the live snapshot under the write lock
//! 2. Notifies registered [`StorePlugin`]s with the previous and next snapshot
//! 3. Publishes the next snapshot to every subscriber
//!
//! Mutation is draft-based: the current snapshot is cloned into a mutable
//! draft, a recipe runs against the draft, and the draft is frozen into a new
//! `Arc`. Snapshots handed out earlier are never touched again.

use std::sync::{Arc, PoisonError, RwLock as SyncRwLock};
use tokio::sync::{watch, RwLock};

/// Why a snapshot was committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// A draft recipe or reducer produced the snapshot
    Mutation,
    /// An earlier snapshot was put back (undo, redo, history jumps)
    Restore,
    /// The cell went back to its initial snapshot
    Reset,
}

impl CommitKind {
    /// Stable label used for logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mutation => "mutation",
            Self::Restore => "restore",
            Self::Reset => "reset",
        }
    }
}

/// Hook invoked synchronously on every commit
///
/// Plugins run while the cell's write lock is held, so they observe commits
/// strictly in order and must not call back into the cell.
pub trait StorePlugin<S>: Send + Sync {
    /// Called after `next` replaced `previous` as the live snapshot
    fn on_commit(&self, previous: &Arc<S>, next: &Arc<S>, kind: CommitKind);
}

type Plugins<S> = Arc<SyncRwLock<Vec<Arc<dyn StorePlugin<S>>>>>;

/// Shared, observable holder of immutable state snapshots
///
/// Cloning a `StateCell` yields another handle to the same state.
pub struct StateCell<S> {
    live: Arc<RwLock<Arc<S>>>,
    initial: Arc<S>,
    snapshots: Arc<watch::Sender<Arc<S>>>,
    plugins: Plugins<S>,
}

impl<S> Clone for StateCell<S> {
    fn clone(&self) -> Self {
        Self {
            live: Arc::clone(&self.live),
            initial: Arc::clone(&self.initial),
            snapshots: Arc::clone(&self.snapshots),
            plugins: Arc::clone(&self.plugins),
        }
    }
}

impl<S> StateCell<S>
where
    S: Send + Sync + 'static,
{
    /// Create a cell whose live and initial snapshot is `initial`
    #[must_use]
    pub fn new(initial: S) -> Self {
        let initial = Arc::new(initial);
        let (snapshots, _) = watch::channel(Arc::clone(&initial));

        Self {
            live: Arc::new(RwLock::new(Arc::clone(&initial))),
            initial,
            snapshots: Arc::new(snapshots),
            plugins: Arc::new(SyncRwLock::new(Vec::new())),
        }
    }

    /// The most recently committed snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<S> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// The snapshot the cell was created with
    #[must_use]
    pub fn initial(&self) -> Arc<S> {
        Arc::clone(&self.initial)
    }

    /// Read the live state through a closure
    pub async fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let live = self.live.read().await;
        f(&live)
    }

    /// Subscribe to snapshots
    ///
    /// The receiver holds the latest snapshot immediately and is notified on
    /// every later commit. Several commits between two reads may coalesce
    /// into the newest one.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<S>> {
        self.snapshots.subscribe()
    }

    /// Number of live snapshot subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.snapshots.receiver_count()
    }

    /// Register a plugin that observes every later commit
    pub fn add_plugin(&self, plugin: Arc<dyn StorePlugin<S>>) {
        self.plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(plugin);
    }

    /// Run `recipe` against a draft of the live snapshot and commit the draft
    ///
    /// Commits exactly once, even when the recipe leaves the draft untouched.
    pub async fn apply<F>(&self, recipe: F) -> Arc<S>
    where
        F: FnOnce(&mut S),
        S: Clone,
    {
        self.mutate(|draft| recipe(draft)).await.0
    }

    /// Like [`apply`](Self::apply), but hands back a value computed by the recipe
    pub async fn mutate<F, T>(&self, recipe: F) -> (Arc<S>, T)
    where
        F: FnOnce(&mut S) -> T,
        S: Clone,
    {
        let mut live = self.live.write().await;
        let mut draft = S::clone(&live);
        let output = recipe(&mut draft);
        let next = Arc::new(draft);
        self.commit(&mut live, Arc::clone(&next), CommitKind::Mutation);
        (next, output)
    }

    /// Run `recipe` against a draft and commit it only if it differs from the live snapshot
    ///
    /// Returns the committed snapshot, or `None` when the draft came back
    /// equal and nothing was published.
    pub async fn mutate_if_changed<F, T>(&self, recipe: F) -> (Option<Arc<S>>, T)
    where
        F: FnOnce(&mut S) -> T,
        S: Clone + PartialEq,
    {
        let mut live = self.live.write().await;
        let mut draft = S::clone(&live);
        let output = recipe(&mut draft);
        if draft == **live {
            tracing::trace!("Draft unchanged, nothing committed");
            return (None, output);
        }
        let next = Arc::new(draft);
        self.commit(&mut live, Arc::clone(&next), CommitKind::Mutation);
        (Some(next), output)
    }

    /// Replace the live snapshot with one chosen by `choose`
    ///
    /// `choose` sees the live snapshot and returns the snapshot to restore, or
    /// `None` to leave the cell untouched. Returns whether a commit happened.
    pub async fn restore_with<F>(&self, choose: F) -> bool
    where
        F: FnOnce(&Arc<S>) -> Option<Arc<S>>,
    {
        let mut live = self.live.write().await;
        match choose(&live) {
            Some(next) => {
                self.commit(&mut live, next, CommitKind::Restore);
                true
            },
            None => false,
        }
    }

    /// Go back to the initial snapshot
    pub async fn reset(&self) {
        let mut live = self.live.write().await;
        self.commit(&mut live, Arc::clone(&self.initial), CommitKind::Reset);
    }

    fn commit(&self, live: &mut Arc<S>, next: Arc<S>, kind: CommitKind) {
        let previous = std::mem::replace(live, Arc::clone(&next));

        let plugins = self
            .plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for plugin in &plugins {
            plugin.on_commit(&previous, &next, kind);
        }

        self.snapshots.send_replace(next);

        tracing::trace!(kind = kind.as_str(), "Snapshot committed");
        metrics::counter!("store.commits.total", "kind" => kind.as_str()).increment(1);
    }
}

impl<S> std::fmt::Debug for StateCell<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCell")
            .field("snapshot", &*self.snapshots.borrow())
            .field("subscribers", &self.snapshots.receiver_count())
            .finish_non_exhaustive()
    }
}
