//! # Reactive Store Runtime
//!
//! Runtime implementation for the reactive store architecture.
//!
//! This crate provides the Store runtime that owns the state snapshots,
//! coordinates reducer execution and effect handling, and publishes every
//! commit to observers.
//!
//! ## Core Components
//!
//! - **Store**: Commits snapshots (via reducers or draft recipes) and executes effects
//! - **[`StateCell`]**: The observable snapshot holder behind every store
//! - **[`Selection`]**: Derived, distinct-until-changed views of state
//! - **[`StateHistory`]**: Undo/redo plugin recording past and future snapshots
//!
//! ## Example
//!
//! ```ignore
//! use reactive_store_runtime::{Store, StateHistory, HistoryConfig};
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//! let history = StateHistory::attach(store.cell(), HistoryConfig::default());
//!
//! // Send an action through the reducer
//! store.send(Action::DoSomething).await?;
//!
//! // Or mutate a draft directly
//! store.apply(|draft| draft.some_field = 42).await;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//!
//! history.undo().await;
//! ```

use reactive_store_core::{effect::Effect, reducer::Reducer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Observable snapshot holder and commit plugins
pub mod state;

/// Undo/redo history plugin
pub mod history;

/// Derived views of store state
pub mod select;

/// Metrics descriptions and Prometheus recorder
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    ///
    /// Invalid commands are not errors: reducers and recipes treat them as
    /// no-ops. These variants only cover the runtime itself.
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for effects or a terminal action
        #[error("Timeout waiting for action")]
        Timeout,

        /// A broadcast or snapshot channel closed
        ///
        /// Typically because every handle to the store was dropped.
        #[error("Store channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;
pub use history::{HistoryConfig, HistoryStatus, StateHistory};
pub use select::Selection;
pub use state::{CommitKind, StateCell, StorePlugin};

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use reactive_store_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of effect-produced actions buffered for observers
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects of one
/// action to complete. Callers that treat commands as fire-and-forget can
/// simply drop it.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle and the tracking context effects report to
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    ///
    /// Returned for commands that were ignored before reaching the store.
    #[must_use]
    pub fn completed() -> Self {
        Self::new().0
    }

    /// Whether every tracked effect has finished
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.effects.load(Ordering::SeqCst) == 0
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            self.notifier.send_replace(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Internal: RAII guard counting a store-wide in-flight effect
struct PendingGuard(Arc<watch::Sender<usize>>);

impl PendingGuard {
    fn start(pending: &Arc<watch::Sender<usize>>) -> Self {
        pending.send_modify(|n| *n += 1);
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!("store.effects.pending").set(*pending.borrow() as f64);
        Self(Arc::clone(pending))
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!("store.effects.pending").set(*self.0.borrow() as f64);
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, DecrementGuard, Duration, Effect, EffectHandle, EffectTracking,
        Ordering, PendingGuard, Reducer, StoreConfig, StoreError,
    };
    use crate::select::Selection;
    use crate::state::StateCell;
    use tokio::sync::{broadcast, watch};

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (immutable snapshots behind a [`StateCell`])
    /// 2. Reducer (business logic, run against a draft)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = Store::new(
    ///     TodoState::default(),
    ///     TodoReducer::new(),
    ///     TodoEnvironment::production(),
    /// );
    ///
    /// store.send(TodoAction::UpdateFilter {
    ///     filter: VisibilityFilter::ShowActive,
    /// }).await?;
    /// ```
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        cell: StateCell<S>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<watch::Sender<usize>>,
        /// Action broadcast channel for observing actions produced by effects.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default()`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));
            let (pending_effects, _) = watch::channel(0);

            Self {
                cell: StateCell::new(initial_state),
                reducer,
                environment,
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(pending_effects),
                action_broadcast,
            }
        }

        /// The snapshot cell behind this store (for plugins such as history)
        #[must_use]
        pub const fn cell(&self) -> &StateCell<S> {
            &self.cell
        }

        /// The configuration this store was built with
        #[must_use]
        pub const fn config(&self) -> &StoreConfig {
            &self.config
        }

        /// The injected environment
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// The latest committed snapshot
        #[must_use]
        pub fn snapshot(&self) -> Arc<S> {
            self.cell.snapshot()
        }

        /// Subscribe to committed snapshots
        ///
        /// The receiver holds the current snapshot right away and sees every
        /// later commit, in commit order.
        #[must_use]
        pub fn subscribe(&self) -> watch::Receiver<Arc<S>> {
            self.cell.subscribe()
        }

        /// Derive an observable view of the state
        ///
        /// ```ignore
        /// let filter = store.select(|s: &TodoState| s.filter);
        /// ```
        #[must_use]
        pub fn select<T, F>(&self, selector: F) -> Selection<S, T>
        where
            T: Clone + PartialEq + Send + 'static,
            F: Fn(&S) -> T + Send + Sync + 'static,
        {
            Selection::new(self.cell.subscribe(), selector)
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.todos.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            self.cell.read(f).await
        }

        /// Mutate a draft of the current state and commit it
        ///
        /// Bypasses the reducer. Subscribers and plugins are notified exactly
        /// once, even if the recipe changes nothing.
        #[tracing::instrument(skip(self, recipe), name = "store_apply")]
        pub async fn apply<F>(&self, recipe: F) -> Arc<S>
        where
            F: FnOnce(&mut S),
            S: Clone,
        {
            tracing::debug!("Applying draft recipe");
            self.cell.apply(recipe).await
        }

        /// Restore the initial state
        ///
        /// Plugins see a [`CommitKind::Reset`](crate::CommitKind::Reset) commit.
        pub async fn reset(&self) {
            tracing::debug!("Resetting store to its initial state");
            self.cell.reset().await;
        }

        /// Number of effects currently in flight
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            *self.pending_effects.borrow()
        }

        /// Observe the number of effects in flight
        #[must_use]
        pub fn subscribe_pending(&self) -> watch::Receiver<usize> {
            self.pending_effects.subscribe()
        }

        /// Whether [`shutdown`](Self::shutdown) was initiated
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.shutdown.load(Ordering::Acquire)
        }

        /// Initiate graceful shutdown
        ///
        /// New actions are rejected and in-flight effects get `timeout` to
        /// finish. Scheduled effects are never cancelled.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still
        /// running when the timeout elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!(
                pending_effects = self.pending_effects(),
                "Initiating graceful shutdown"
            );

            // Set shutdown flag to reject new actions
            self.shutdown.store(true, Ordering::Release);

            let mut pending = self.pending_effects.subscribe();
            let drained = tokio::time::timeout(timeout, async {
                pending.wait_for(|n| *n == 0).await.map(|_| ())
            })
            .await;

            if drained.is_ok() {
                tracing::info!("All effects completed, shutdown successful");
                metrics::counter!("store.shutdown.completed").increment(1);
                Ok(())
            } else {
                let remaining = self.pending_effects();
                tracing::error!(
                    pending_effects = remaining,
                    "Shutdown timeout: {} effects still running", remaining
                );
                metrics::counter!("store.shutdown.timeout").increment(1);
                Err(StoreError::ShutdownTimeout(remaining))
            }
        }

        /// Send an action to the store
        ///
        /// 1. Clones the current snapshot into a draft
        /// 2. Calls reducer with (draft, action, environment)
        /// 3. Commits the draft and notifies observers, unless the reducer left
        ///    it equal to the current snapshot
        /// 4. Executes returned effects asynchronously (feedback loop)
        ///
        /// An action that only schedules effects therefore publishes nothing
        /// and leaves no trace in history.
        ///
        /// # Returns
        ///
        /// An [`EffectHandle`] that can be used to wait for effect completion.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic will propagate and no snapshot is
        /// committed. Reducers should be pure functions that do not panic.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
            S: Clone + PartialEq,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            Ok(self.dispatch(action).await)
        }

        /// Reduce an action and start its effects, without the shutdown gate
        ///
        /// Actions fed back by effects come through here: an effect scheduled
        /// before shutdown still lands while shutdown waits for it.
        async fn dispatch(&self, action: A) -> EffectHandle
        where
            R: Clone,
            E: Clone,
            S: Clone + PartialEq,
        {
            tracing::debug!("Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let (committed, effects) = self
                .cell
                .mutate_if_changed(|draft| {
                    let span = tracing::debug_span!("reducer_execution");
                    let _enter = span.enter();

                    let start = std::time::Instant::now();
                    let effects = self.reducer.reduce(draft, action, &self.environment);
                    metrics::histogram!("store.reducer.duration_seconds")
                        .record(start.elapsed().as_secs_f64());

                    tracing::trace!("Reducer completed, returned {} effects", effects.len());
                    #[allow(clippy::cast_precision_loss)]
                    metrics::histogram!("store.effects.count").record(effects.len() as f64);

                    effects
                })
                .await;

            if committed.is_none() {
                metrics::counter!("store.commands.unchanged").increment(1);
            }

            for effect in effects {
                self.execute_effect_internal(effect, &tracking);
            }
            tracing::debug!(committed = committed.is_some(), "Action processing completed");

            handle
        }

        /// Send an action and wait for a matching action produced by its effects
        ///
        /// Subscribes to the action broadcast before sending, so the matching
        /// action cannot be missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`]: store is shutting down
        /// - [`StoreError::Timeout`]: no matching action within `timeout`
        /// - [`StoreError::ChannelClosed`]: action broadcast closed
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            S: Clone + PartialEq,
            F: Fn(&A) -> bool,
        {
            // Subscribe BEFORE sending to avoid race condition
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged, {} actions skipped", skipped);
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Actions sent directly via [`send`](Self::send) are not broadcast.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Execute an effect with tracking
        ///
        /// - `None`: No-op
        /// - `Delay`: Waits for duration, then feeds the action back
        ///
        /// The feedback action bypasses the shutdown gate. A delay task that
        /// panics is isolated in its spawned task; the guards still release
        /// their counters.
        fn execute_effect_internal(&self, effect: Effect<A>, tracking: &EffectTracking)
        where
            R: Clone,
            E: Clone,
            S: Clone + PartialEq,
        {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    tracking.increment();
                    let guard = DecrementGuard(tracking.clone());
                    let pending = PendingGuard::start(&self.pending_effects);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _pending = pending;

                        tokio::time::sleep(duration).await;
                        tracing::trace!("Effect::Delay completed, sending action");

                        let _ = store.action_broadcast.send((*action).clone());
                        store.dispatch(*action).await;
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                cell: self.cell.clone(),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
