// TodoStore - Local to-do list with due dates and pluggable persistence

pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod render;
pub mod storage;
pub mod store;
pub mod task;

// Re-export main types for convenience
pub use clock::{Clock, FixedClock, SystemClock, parse_due_date};
pub use config::{Backend, Config};
pub use error::ValidationError;
pub use filter::FilterMode;
pub use storage::{FileStorage, MemoryStorage, SqliteStorage, Storage};
pub use store::{EditSession, NewTaskDraft, TaskStore};
pub use task::{DueStatus, Task, due_status};
