//! Metrics for store observability.
//!
//! Every component records through the [`metrics`] facade; nothing is
//! exported unless a recorder is installed. [`install_prometheus`] installs
//! the Prometheus recorder and returns a handle that renders the current
//! values in the text exposition format.
//!
//! # Example
//!
//! ```rust,no_run
//! use reactive_store_runtime::metrics::install_prometheus;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handle = install_prometheus()?;
//! // ... run the store ...
//! println!("{}", handle.render());
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Install the Prometheus recorder as the global metrics recorder.
///
/// # Errors
///
/// Returns [`MetricsError::Build`] if the bucket configuration is rejected
/// and [`MetricsError::Install`] if another recorder is already installed.
pub fn install_prometheus() -> Result<PrometheusHandle, MetricsError> {
    register_metrics();

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[0.000_001, 0.000_01, 0.000_1, 0.001, 0.01, 0.1],
        )
        .map_err(|e| MetricsError::Build(e.to_string()))?
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    tracing::info!("Prometheus metrics recorder installed");
    Ok(handle)
}

/// Register descriptions for every metric the runtime records.
pub fn register_metrics() {
    // Commits
    describe_counter!(
        "store.commits.total",
        "Snapshots committed, labelled by kind (mutation, restore, reset)"
    );

    // Actions and reducer
    describe_counter!("store.commands.total", "Actions sent to a store");
    describe_counter!(
        "store.commands.unchanged",
        "Actions whose reducer left the state equal, so nothing was committed"
    );
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time spent running the reducer on a draft"
    );
    describe_histogram!("store.effects.count", "Effects returned per reducer run");
    describe_counter!(
        "store.effects.executed",
        "Effects executed, labelled by type"
    );
    describe_gauge!("store.effects.pending", "Effects currently in flight");

    // History
    describe_counter!("store.history.undo", "Successful undo operations");
    describe_counter!("store.history.redo", "Successful redo operations");

    // Shutdown
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );
    describe_counter!("store.shutdown.completed", "Graceful shutdowns");
    describe_counter!("store.shutdown.timeout", "Shutdowns that timed out");
}
