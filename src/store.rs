//! The storage collaborator.
//!
//! Every call is one self-contained request that the implementation must
//! complete atomically; the service never holds a handle across calls.

use chrono::NaiveDate;

use crate::error::Result;
use crate::fields::Status;
use crate::task::{NewTask, Subtask, SubtaskChanges, Task, TaskChanges, TaskFilters, TaskStats};

pub trait TaskStore {
    /// Tasks matching `filters`. Order is unspecified; callers sort.
    fn list_tasks(&self, filters: &TaskFilters) -> Result<Vec<Task>>;

    fn get_task(&self, id: u64) -> Result<Option<Task>>;

    /// Persist a new task, assigning its id and timestamps. A missing
    /// `sort_order` is stored as 0.
    fn create_task(&mut self, new: NewTask) -> Result<Task>;

    /// Apply `changes` verbatim and bump `updated_at`. `None` if absent.
    fn update_task(&mut self, id: u64, changes: &TaskChanges) -> Result<Option<Task>>;

    /// Remove the task and its subtasks. Absent ids are a no-op.
    fn delete_task(&mut self, id: u64) -> Result<()>;

    /// Highest `sort_order` in the status bucket, `None` when it is empty.
    fn max_sort_order(&self, status: Status) -> Result<Option<i64>>;

    /// Set `sort_order` for each `(id, order)` pair in one write. Unknown ids are ignored.
    fn apply_sort_orders(&mut self, orders: &[(u64, i64)]) -> Result<()>;

    fn stats(&self, today: NaiveDate) -> Result<TaskStats>;

    /// Subtasks of `task_id`, by sort order then creation time.
    fn list_subtasks(&self, task_id: u64) -> Result<Vec<Subtask>>;

    /// Append a subtask at `sort_order`. `None` if the owning task is absent.
    fn create_subtask(&mut self, task_id: u64, title: &str, sort_order: i64) -> Result<Option<Subtask>>;

    fn update_subtask(&mut self, id: u64, changes: &SubtaskChanges) -> Result<Option<Subtask>>;

    fn delete_subtask(&mut self, id: u64) -> Result<()>;

    fn max_subtask_sort_order(&self, task_id: u64) -> Result<Option<i64>>;
}
