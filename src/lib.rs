// TodoStore - In-memory task CRUD with search, stats, and JSON export/import

pub mod error;
pub mod filter;
pub mod store;
pub mod task;

// Re-export main types for convenience
pub use error::StoreError;
pub use filter::{SearchFilter, SortKey, SortOrder, sort_tasks};
pub use store::{ExportPayload, ImportSummary, TaskStats, TaskStore};
pub use task::{CreateInput, Priority, Task, TaskPatch};
