//! Todo list with undo/redo, built on the reactive store.
//!
//! This crate shows how an application sits on top of the store runtime:
//!
//! - An entity model (`Todo`, `VisibilityFilter`) and a reducer over it
//! - `TodosStore` with entity operations that commit drafts
//! - `TodosQuery` selections that only report real changes
//! - `TodosFacade`, the single entry point for a UI, with history attached
//! - `TodosBinding`, a render-ready view that follows the facade
//!
//! # Quick Start
//!
//! ```no_run
//! use todo::{TodoConfig, TodosBinding, TodosFacade, VisibilityFilter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let facade = TodosFacade::new(TodoConfig::default());
//! let mut binding = TodosBinding::subscribe(&facade);
//!
//! facade.add_todo("Wash car").await?;
//! facade.update_filter(VisibilityFilter::ShowActive).await?;
//!
//! if let Some(view) = binding.next().await {
//!     println!("{} of {} todos visible", view.todos.len(), view.total);
//! }
//!
//! facade.history().undo().await;
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod facade;
pub mod model;
pub mod query;
pub mod reducer;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use binding::{TodosBinding, TodosView};
pub use config::TodoConfig;
pub use facade::{make_facade, TodosFacade};
pub use model::{create_todo, toggle_completed, Todo, TodoId, TodoPatch, VisibilityFilter};
pub use query::{visible_todos, TodosQuery};
pub use reducer::{TodoEnvironment, TodoReducer};
pub use store::TodosStore;
pub use types::{TodoAction, TodoState};
