//! Undo/redo history over committed snapshots
//!
//! [`StateHistory`] attaches to a [`StateCell`] as a [`StorePlugin`] and keeps
//! two stacks of snapshots:
//!
//! - `past`: snapshots that were live before each recorded mutation
//! - `future`: snapshots that were undone and can be redone
//!
//! The present is always the cell's live snapshot, so the history tracks the
//! store live rather than owning a copy of it.
//!
//! ```ignore
//! let history = StateHistory::attach(store.cell(), HistoryConfig::default());
//!
//! store.apply(|s| s.count += 1).await;
//! assert!(history.has_past());
//!
//! history.undo().await;
//! assert!(history.has_future());
//! ```

use crate::state::{CommitKind, StateCell, StorePlugin};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Configuration for [`StateHistory`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of past snapshots kept; `None` keeps all of them
    pub max_age: Option<usize>,
}

impl HistoryConfig {
    /// Keep at most `max_age` past snapshots
    #[must_use]
    pub const fn with_max_age(mut self, max_age: usize) -> Self {
        self.max_age = Some(max_age);
        self
    }
}

/// Observable summary of the history stacks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStatus {
    /// Number of snapshots that can be undone
    pub past: usize,
    /// Number of snapshots that can be redone
    pub future: usize,
}

impl HistoryStatus {
    /// True iff `undo` would change the state
    #[must_use]
    pub const fn has_past(&self) -> bool {
        self.past > 0
    }

    /// True iff `redo` would change the state
    #[must_use]
    pub const fn has_future(&self) -> bool {
        self.future > 0
    }
}

struct Record<S> {
    past: VecDeque<Arc<S>>,
    future: Vec<Arc<S>>,
    skip_next: bool,
    paused: bool,
}

impl<S> Record<S> {
    fn status(&self) -> HistoryStatus {
        HistoryStatus {
            past: self.past.len(),
            future: self.future.len(),
        }
    }

    fn trim(&mut self, max_age: Option<usize>) {
        if let Some(max_age) = max_age {
            while self.past.len() > max_age {
                self.past.pop_front();
            }
        }
    }
}

struct HistoryCore<S> {
    record: Mutex<Record<S>>,
    status: watch::Sender<HistoryStatus>,
    config: HistoryConfig,
}

impl<S> HistoryCore<S> {
    fn lock(&self) -> MutexGuard<'_, Record<S>> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, record: &Record<S>) {
        self.status.send_if_modified(|status| {
            let next = record.status();
            let changed = *status != next;
            *status = next;
            changed
        });
    }

    /// Pop the newest past snapshot, pushing `current` onto the future
    fn step_back(&self, current: &Arc<S>) -> Option<Arc<S>> {
        let mut record = self.lock();
        let previous = record.past.pop_back()?;
        record.future.push(Arc::clone(current));
        self.publish(&record);
        Some(previous)
    }

    /// Pop the next future snapshot, pushing `current` onto the past
    fn step_forward(&self, current: &Arc<S>) -> Option<Arc<S>> {
        let mut record = self.lock();
        let next = record.future.pop()?;
        record.past.push_back(Arc::clone(current));
        record.trim(self.config.max_age);
        self.publish(&record);
        Some(next)
    }

    /// Make `past[index]` the present; everything newer moves to the future
    fn jump_back(&self, current: &Arc<S>, index: usize) -> Option<Arc<S>> {
        let mut record = self.lock();
        if index >= record.past.len() {
            return None;
        }

        let newer = record.past.split_off(index);
        let mut newer = newer.into_iter();
        let target = newer.next()?;

        record.future.push(Arc::clone(current));
        for snapshot in newer.rev() {
            record.future.push(snapshot);
        }
        self.publish(&record);
        Some(target)
    }

    /// Make the `index`-th redo (0 = next) the present
    fn jump_forward(&self, current: &Arc<S>, index: usize) -> Option<Arc<S>> {
        let mut record = self.lock();
        let len = record.future.len();
        if index >= len {
            return None;
        }

        let redone = record.future.split_off(len - 1 - index);
        let mut redone = redone.into_iter();
        let target = redone.next()?;

        record.past.push_back(Arc::clone(current));
        for snapshot in redone.rev() {
            record.past.push_back(snapshot);
        }
        record.trim(self.config.max_age);
        self.publish(&record);
        Some(target)
    }
}

impl<S> StorePlugin<S> for HistoryCore<S>
where
    S: Send + Sync,
{
    fn on_commit(&self, previous: &Arc<S>, _next: &Arc<S>, kind: CommitKind) {
        let mut record = self.lock();
        match kind {
            CommitKind::Mutation => {
                if record.paused {
                    return;
                }
                if record.skip_next {
                    record.skip_next = false;
                    tracing::trace!("History skipped one mutation");
                    return;
                }
                record.past.push_back(Arc::clone(previous));
                record.future.clear();
                record.trim(self.config.max_age);
            },
            CommitKind::Reset => {
                record.past.clear();
                record.future.clear();
                record.skip_next = false;
            },
            CommitKind::Restore => return,
        }
        self.publish(&record);
    }
}

/// Linear undo/redo history for a [`StateCell`]
///
/// Cheap to clone; clones share the same stacks.
pub struct StateHistory<S> {
    cell: StateCell<S>,
    core: Arc<HistoryCore<S>>,
}

impl<S> Clone for StateHistory<S> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            core: Arc::clone(&self.core),
        }
    }
}

impl<S> StateHistory<S>
where
    S: Send + Sync + 'static,
{
    /// Start recording every later mutation of `cell`
    ///
    /// Both stacks start empty; the present is the cell's live snapshot.
    #[must_use]
    pub fn attach(cell: &StateCell<S>, config: HistoryConfig) -> Self {
        let (status, _) = watch::channel(HistoryStatus::default());
        let core = Arc::new(HistoryCore {
            record: Mutex::new(Record {
                past: VecDeque::new(),
                future: Vec::new(),
                skip_next: false,
                paused: false,
            }),
            status,
            config,
        });
        cell.add_plugin(Arc::clone(&core) as Arc<dyn StorePlugin<S>>);

        Self {
            cell: cell.clone(),
            core,
        }
    }

    /// Current sizes of both stacks
    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        self.core.lock().status()
    }

    /// True iff there is a snapshot to undo to
    #[must_use]
    pub fn has_past(&self) -> bool {
        self.status().has_past()
    }

    /// True iff there is a snapshot to redo to
    #[must_use]
    pub fn has_future(&self) -> bool {
        self.status().has_future()
    }

    /// Observe [`HistoryStatus`] changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HistoryStatus> {
        self.core.status.subscribe()
    }

    /// Restore the previous snapshot
    ///
    /// Returns `false` without touching the store when there is no past.
    #[tracing::instrument(skip(self), name = "history_undo")]
    pub async fn undo(&self) -> bool {
        let core = &self.core;
        let undone = self
            .cell
            .restore_with(|current| core.step_back(current))
            .await;
        if undone {
            tracing::debug!("Undo applied");
            metrics::counter!("store.history.undo").increment(1);
        }
        undone
    }

    /// Re-apply the most recently undone snapshot
    ///
    /// Returns `false` without touching the store when there is no future.
    #[tracing::instrument(skip(self), name = "history_redo")]
    pub async fn redo(&self) -> bool {
        let core = &self.core;
        let redone = self
            .cell
            .restore_with(|current| core.step_forward(current))
            .await;
        if redone {
            tracing::debug!("Redo applied");
            metrics::counter!("store.history.redo").increment(1);
        }
        redone
    }

    /// Jump to `past[index]` (0 = oldest recorded snapshot)
    ///
    /// Out-of-range indexes are a no-op returning `false`.
    pub async fn jump_to_past(&self, index: usize) -> bool {
        let core = &self.core;
        self.cell
            .restore_with(|current| core.jump_back(current, index))
            .await
    }

    /// Jump forward over `index + 1` redos (0 behaves like [`redo`](Self::redo))
    ///
    /// Out-of-range indexes are a no-op returning `false`.
    pub async fn jump_to_future(&self, index: usize) -> bool {
        let core = &self.core;
        self.cell
            .restore_with(|current| core.jump_forward(current, index))
            .await
    }

    /// Forget both stacks; the live snapshot is kept
    pub fn clear(&self) {
        let mut record = self.core.lock();
        record.past.clear();
        record.future.clear();
        self.core.publish(&record);
    }

    /// Do not record the next mutation
    pub fn ignore_next(&self) {
        self.core.lock().skip_next = true;
    }

    /// Stop recording mutations until [`resume`](Self::resume)
    pub fn pause(&self) {
        self.core.lock().paused = true;
    }

    /// Record mutations again after [`pause`](Self::pause)
    pub fn resume(&self) {
        self.core.lock().paused = false;
    }

    /// Whether recording is paused
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.core.lock().paused
    }
}

impl<S> std::fmt::Debug for StateHistory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let record = self.core.lock();
        f.debug_struct("StateHistory")
            .field("status", &record.status())
            .field("paused", &record.paused)
            .field("config", &self.core.config)
            .finish_non_exhaustive()
    }
}
