//! Configuration for a todo facade.

use reactive_store_runtime::{HistoryConfig, StoreConfig};
use std::time::Duration;

/// Settings for [`TodosFacade`](crate::facade::TodosFacade)
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use todo::TodoConfig;
/// use reactive_store_runtime::HistoryConfig;
///
/// let config = TodoConfig::default()
///     .with_add_latency(Duration::from_millis(100))
///     .with_history(HistoryConfig::default().with_max_age(10));
/// assert_eq!(config.add_latency, Some(Duration::from_millis(100)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TodoConfig {
    /// Delay before an added todo lands in the list; `None` adds immediately
    pub add_latency: Option<Duration>,
    /// Undo/redo settings
    pub history: HistoryConfig,
    /// Store runtime settings
    pub store: StoreConfig,
}

impl TodoConfig {
    /// Simulate a slow backend: adds land after `latency`
    #[must_use]
    pub const fn with_add_latency(mut self, latency: Duration) -> Self {
        self.add_latency = Some(latency);
        self
    }

    /// Set the history configuration
    #[must_use]
    pub const fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    /// Set the store configuration
    #[must_use]
    pub const fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
}
