//! # Reactive Store Testing
//!
//! Testing utilities and helpers for reactive stores.
//!
//! This crate provides:
//! - Deterministic implementations of environment traits
//! - Helpers for waiting on snapshots and selections
//! - Property-based testing strategies
//! - A Given-When-Then harness for reducers
//!
//! ## Example
//!
//! ```ignore
//! use reactive_store_testing::{mocks::SequentialIds, helpers::wait_for_state};
//!
//! #[tokio::test]
//! async fn delayed_add_lands() {
//!     let facade = TodosFacade::with_ids(config, Arc::new(SequentialIds::new("todo")));
//!     facade.add_todo("Wash car").await?;
//!
//!     let state = wait_for_state(facade.store().subscribe(), |s| s.todos.len() == 1, TIMEOUT).await;
//!     assert!(state.is_some());
//! }
//! ```


pub use reducer_test::{ReducerTest, assertions};

/// Deterministic implementations of environment traits
pub mod mocks {
    use reactive_store_core::environment::IdGenerator;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Id generator producing `prefix-1`, `prefix-2`, ...
    ///
    /// # Example
    ///
    /// ```
    /// use reactive_store_testing::mocks::SequentialIds;
    /// use reactive_store_core::environment::IdGenerator;
    ///
    /// let ids = SequentialIds::new("todo");
    /// assert_eq!(ids.next_id(), "todo-1");
    /// assert_eq!(ids.next_id(), "todo-2");
    /// ```
    #[derive(Debug)]
    pub struct SequentialIds {
        prefix: String,
        counter: AtomicU64,
    }

    impl SequentialIds {
        /// Create a generator whose first id is `prefix-1`
        #[must_use]
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                counter: AtomicU64::new(0),
            }
        }

        /// Number of ids handed out so far
        #[must_use]
        pub fn issued(&self) -> u64 {
            self.counter.load(Ordering::SeqCst)
        }
    }

    impl Default for SequentialIds {
        fn default() -> Self {
            Self::new("todo")
        }
    }

    impl IdGenerator for SequentialIds {
        fn next_id(&self) -> String {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            format!("{}-{n}", self.prefix)
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use reactive_store_runtime::Selection;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;

    /// Default upper bound for waits in tests
    pub const TEST_TIMEOUT: Duration = Duration::from_secs(2);

    /// Install a fmt subscriber that writes through the test harness.
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }

    /// Wait until a committed snapshot satisfies `predicate`.
    ///
    /// Returns `None` on timeout or when the store goes away first.
    pub async fn wait_for_state<S, F>(
        mut receiver: watch::Receiver<Arc<S>>,
        predicate: F,
        timeout: Duration,
    ) -> Option<Arc<S>>
    where
        F: Fn(&S) -> bool,
    {
        let wait = async {
            receiver
                .wait_for(|snapshot| predicate(&**snapshot))
                .await
                .map(|snapshot| Arc::clone(&snapshot))
                .ok()
        };
        tokio::time::timeout(timeout, wait).await.ok().flatten()
    }

    /// Next distinct value of a selection, or `None` on timeout or close.
    pub async fn next_change<S, T>(selection: &mut Selection<S, T>, timeout: Duration) -> Option<T>
    where
        S: Send + Sync + 'static,
        T: Clone + PartialEq + Send + 'static,
    {
        tokio::time::timeout(timeout, selection.changed())
            .await
            .ok()
            .and_then(Result::ok)
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Non-blank todo text: starts and ends with a visible character
    pub fn todo_text() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ]{0,30}[A-Za-z0-9]|[A-Za-z0-9]"
    }

    /// Between `min` and `max` todo texts
    pub fn todo_texts(min: usize, max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(todo_text(), min..=max)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::helpers::{TEST_TIMEOUT, next_change, wait_for_state};
    use super::mocks::SequentialIds;
    use reactive_store_core::environment::IdGenerator;
    use reactive_store_runtime::{Selection, StateCell};
    use std::time::Duration;

    #[test]
    fn sequential_ids_count_up_from_one() {
        let ids = SequentialIds::new("n");
        assert_eq!(ids.next_id(), "n-1");
        assert_eq!(ids.next_id(), "n-2");
        assert_eq!(ids.issued(), 2);
    }

    #[tokio::test]
    async fn wait_for_state_sees_later_commit() {
        let cell = StateCell::new(0_u32);
        let receiver = cell.subscribe();

        let writer = cell.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.apply(|n| *n = 3).await;
        });

        let seen = wait_for_state(receiver, |n| *n == 3, TEST_TIMEOUT).await;
        assert_eq!(seen.as_deref(), Some(&3));
    }

    #[tokio::test]
    async fn wait_for_state_times_out() {
        let cell = StateCell::new(0_u32);
        let seen = wait_for_state(cell.subscribe(), |n| *n == 1, Duration::from_millis(20)).await;
        assert!(seen.is_none());
    }

    #[tokio::test]
    async fn next_change_returns_none_without_commits() {
        let cell = StateCell::new(0_u32);
        let mut selection = Selection::new(cell.subscribe(), |n: &u32| *n);
        assert_eq!(next_change(&mut selection, Duration::from_millis(20)).await, None);
    }
}
