//! Task bookkeeping.

mod task_store;

pub use task_store::{TaskEvent, TaskEventKind, TaskStore};
