//! Scripted demo session for the todo facade.
//!
//! Adds, toggles, filters, undoes and redoes, printing the bound view after
//! each step, then prints the final state as JSON and the metrics snapshot.
//! Set `RUST_LOG=debug` to see the store's tracing output.

use anyhow::Context;
use reactive_store_runtime::metrics::install_prometheus;
use std::time::Duration;
use todo::{TodoConfig, TodosBinding, TodosFacade, TodosView, VisibilityFilter};
use tracing_subscriber::EnvFilter;

fn print_view(step: &str, view: &TodosView) {
    println!("\n{step}");
    println!(
        "  filter={} total={} undo={} redo={} loading={}",
        view.filter, view.total, view.has_past, view.has_future, view.is_loading
    );
    for todo in &view.todos {
        let status = if todo.completed { "✓" } else { " " };
        println!("  [{status}] {}", todo.text);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let metrics = install_prometheus().context("installing metrics recorder")?;

    println!("=== Todo Demo ===");

    let config = TodoConfig::default().with_add_latency(Duration::from_millis(100));
    let facade = TodosFacade::new(config);
    let mut binding = TodosBinding::subscribe(&facade);
    print_view("Empty list", binding.current());

    let mut handle = facade.add_todo("Wash car").await?;
    print_view("Adding 'Wash car'", binding.refresh());
    handle
        .wait_with_timeout(Duration::from_secs(1))
        .await
        .context("waiting for delayed add")?;

    let mut handle = facade.add_todo("Clean room").await?;
    handle.wait_with_timeout(Duration::from_secs(1)).await?;
    facade.add_todo("").await?;
    print_view("Added two todos", binding.refresh());

    let first = facade.store().snapshot().todos.first().map(|todo| todo.id.clone());
    if let Some(id) = first {
        facade.toggle_complete(&id).await?;
    }
    print_view("Toggled the first", binding.refresh());

    facade.update_filter(VisibilityFilter::ShowCompleted).await?;
    print_view("Showing completed", binding.refresh());

    facade.history().undo().await;
    facade.history().undo().await;
    print_view("Undid twice", binding.refresh());

    facade.history().redo().await;
    print_view("Redid once", binding.refresh());

    let state = facade.store().snapshot();
    println!(
        "\nFinal state:\n{}",
        serde_json::to_string_pretty(state.as_ref()).context("serializing state")?
    );

    facade
        .store()
        .runtime()
        .shutdown(facade.store().runtime().config().default_shutdown_timeout)
        .await?;
    drop(binding);

    println!("\nMetrics:\n{}", metrics.render());
    println!("=== Demo Complete ===");
    Ok(())
}
