//! Task workflow: creation, status transitions, recurrence and ordering.
//!
//! `TaskService` owns a [`TaskStore`] and is the only place status side
//! effects and recurring-task spawning happen. Each public operation issues
//! self-contained store calls; absent records come back as `Ok(None)`.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Local, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::fields::Status;
use crate::filter;
use crate::recurrence;
use crate::store::TaskStore;
use crate::task::*;
use crate::transition::derive_side_effects;

/// Outcome of marking a task done.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// The task, now Done.
    pub task: Task,
    /// The next occurrence, when the task recurs and its series has not ended.
    pub next: Option<Task>,
}

pub struct TaskService<S> {
    store: S,
}

impl<S: TaskStore> TaskService<S> {
    pub fn new(store: S) -> Self {
        TaskService { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Tasks for a view, in display order.
    pub fn list_tasks(&self, filters: &TaskFilters) -> Result<Vec<Task>> {
        let tasks = self.store.list_tasks(filters)?;
        Ok(filter::select(tasks, filters))
    }

    pub fn get_task(&self, id: u64) -> Result<Option<Task>> {
        self.store.get_task(id)
    }

    /// Create a task. Without an explicit sort order it goes to the end of its bucket.
    pub fn create_task(&mut self, mut new: NewTask) -> Result<Task> {
        new.title = validate_title(&new.title)?;
        new.recurrence_interval = new.recurrence_interval.max(1);
        if new.sort_order.is_none() {
            new.sort_order = Some(self.next_sort_order(new.status)?);
        }
        let task = self.store.create_task(new)?;
        info!(id = task.id, status = %task.status, "created task");
        Ok(task)
    }

    /// Apply field changes, deriving completion/archival timestamps and the
    /// bucket position from any status change. Never spawns a recurrence.
    pub fn update_task(&mut self, id: u64, mut changes: TaskChanges) -> Result<Option<Task>> {
        let Some(current) = self.store.get_task(id)? else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            changes.title = Some(validate_title(title)?);
        }
        if let Some(n) = changes.recurrence_interval {
            changes.recurrence_interval = Some(n.max(1));
        }

        let effects = derive_side_effects(current.status, &changes, Utc::now());
        let target = changes.status.unwrap_or(current.status);
        effects.merge_into(&mut changes, || self.next_sort_order(target))?;

        let updated = self.store.update_task(id, &changes)?;
        if let Some(t) = &updated {
            debug!(id, from = %current.status, to = %t.status, "updated task");
        }
        Ok(updated)
    }

    /// Mark a task Done and, if it recurs and has a due date, create its next occurrence.
    pub fn mark_done(&mut self, id: u64) -> Result<Option<Completion>> {
        let Some(task) = self.update_task(id, TaskChanges::status(Status::Done))? else {
            return Ok(None);
        };
        let next = self.spawn_next_occurrence(&task)?;
        Ok(Some(Completion { task, next }))
    }

    pub fn archive_task(&mut self, id: u64) -> Result<Option<Task>> {
        self.update_task(id, TaskChanges::status(Status::Archived))
    }

    /// Delete a task and its subtasks. Unknown ids are ignored.
    pub fn delete_task(&mut self, id: u64) -> Result<()> {
        self.store.delete_task(id)?;
        info!(id, "deleted task");
        Ok(())
    }

    /// Give the listed tasks sort orders 1, 2, 3, ... in list order.
    pub fn reorder_tasks(&mut self, ids: &[u64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.store.apply_sort_orders(&reorder_assignments(ids))
    }

    pub fn stats(&self) -> Result<TaskStats> {
        self.store.stats(Local::now().date_naive())
    }

    /// Open tasks due today or earlier.
    pub fn reminders(&self) -> Result<Vec<Task>> {
        let tasks = self.store.list_tasks(&TaskFilters::default())?;
        Ok(filter::reminders(tasks, Local::now().date_naive()))
    }

    /// Tasks grouped into status columns.
    pub fn board(&self) -> Result<BTreeMap<Status, Vec<Task>>> {
        Ok(filter::board(self.store.list_tasks(&TaskFilters::default())?))
    }

    /// Created/completed counts for the last `weeks` weeks, oldest first.
    pub fn weekly_stats(&self, weeks: u32) -> Result<Vec<WeeklyStat>> {
        let tasks = self.store.list_tasks(&TaskFilters::default())?;
        Ok(weekly_stats(&tasks, Local::now().date_naive(), weeks))
    }

    pub fn list_subtasks(&self, task_id: u64) -> Result<Vec<Subtask>> {
        self.store.list_subtasks(task_id)
    }

    /// Append a checklist item to a task. `None` if the task does not exist.
    pub fn add_subtask(&mut self, task_id: u64, title: &str) -> Result<Option<Subtask>> {
        let title = validate_title(title)?;
        let order = self
            .store
            .max_subtask_sort_order(task_id)?
            .map_or(1, |m| m + 1);
        self.store.create_subtask(task_id, &title, order)
    }

    pub fn update_subtask(&mut self, id: u64, mut changes: SubtaskChanges) -> Result<Option<Subtask>> {
        if let Some(title) = &changes.title {
            changes.title = Some(validate_title(title)?);
        }
        self.store.update_subtask(id, &changes)
    }

    pub fn delete_subtask(&mut self, id: u64) -> Result<()> {
        self.store.delete_subtask(id)
    }

    fn next_sort_order(&self, status: Status) -> Result<i64> {
        Ok(self.store.max_sort_order(status)?.map_or(1, |m| m + 1))
    }

    fn spawn_next_occurrence(&mut self, task: &Task) -> Result<Option<Task>> {
        let (Some(rule), Some(due)) = (task.recurrence_rule, task.due_date) else {
            return Ok(None);
        };
        let Some(next_due) = recurrence::next_due_date(due, rule, task.recurrence_interval) else {
            warn!(id = task.id, due = %due, "next occurrence is out of the supported date range");
            return Ok(None);
        };
        if task.recurrence_end_date.is_some_and(|end| next_due > end) {
            info!(id = task.id, "recurrence ended, no further occurrence");
            return Ok(None);
        }
        let next = self.create_task(NewTask::next_occurrence(task, next_due))?;
        info!(id = task.id, next_id = next.id, due = %next_due, "spawned next occurrence");
        Ok(Some(next))
    }
}

/// Trimmed title, or a validation error when it is blank.
pub fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::Validation("title must not be empty".into()));
    }
    Ok(title.to_string())
}

/// `(id, order)` pairs numbering `ids` from 1. A repeated id keeps its last position.
pub fn reorder_assignments(ids: &[u64]) -> Vec<(u64, i64)> {
    ids.iter().zip(1..).map(|(&id, order)| (id, order)).collect()
}

/// Longest history the weekly report covers (ten years).
pub const MAX_REPORT_WEEKS: u32 = 520;

/// Bucket task creation and completion dates into Monday-start weeks ending
/// with the current one. `weeks` is capped at [`MAX_REPORT_WEEKS`].
pub fn weekly_stats(tasks: &[Task], today: NaiveDate, weeks: u32) -> Vec<WeeklyStat> {
    let weeks = weeks.min(MAX_REPORT_WEEKS);
    if weeks == 0 {
        return Vec::new();
    }
    let since_monday = u64::from(today.weekday().num_days_from_monday());
    let span = u64::from(weeks - 1) * 7 + since_monday;
    let Some(first_week) = today.checked_sub_days(Days::new(span)) else {
        return Vec::new();
    };
    let mut out: Vec<WeeklyStat> = (0..weeks)
        .map_while(|i| {
            let week_start = first_week.checked_add_days(Days::new(u64::from(i) * 7))?;
            Some(WeeklyStat {
                week_start,
                created: 0,
                completed: 0,
            })
        })
        .collect();

    let n = out.len();
    let slot = |date: NaiveDate| -> Option<usize> {
        let idx = usize::try_from((date - first_week).num_days().div_euclid(7)).ok()?;
        (idx < n).then_some(idx)
    };
    for t in tasks {
        if let Some(i) = slot(t.created_at.date_naive()) {
            out[i].created += 1;
        }
        if let Some(i) = t.completed_at.and_then(|c| slot(c.date_naive())) {
            out[i].completed += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reorder_assignments() {
        assert_eq!(reorder_assignments(&[3, 1, 2]), vec![(3, 1), (1, 2), (2, 3)]);
        assert!(reorder_assignments(&[]).is_empty());
    }

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Buy milk ").unwrap(), "Buy milk");
        assert!(matches!(validate_title("   "), Err(Error::Validation(_))));
    }

    #[test]
    fn test_weekly_stats_buckets() {
        let mut svc = TaskService::new(Database::in_memory());
        let t = svc.create_task(NewTask::new("a")).unwrap();
        let mut tasks = vec![t];
        tasks[0].created_at = Utc.with_ymd_and_hms(2026, 10, 13, 12, 0, 0).unwrap();
        tasks[0].completed_at = Some(Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap());
        let mut old = tasks[0].clone();
        old.created_at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        old.completed_at = None;
        tasks.push(old);

        let stats = weekly_stats(&tasks, day(2026, 10, 21), 2);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].week_start, day(2026, 10, 12));
        assert_eq!((stats[0].created, stats[0].completed), (1, 0));
        assert_eq!(stats[1].week_start, day(2026, 10, 19));
        assert_eq!((stats[1].created, stats[1].completed), (0, 1));
        assert!(weekly_stats(&tasks, day(2026, 10, 21), 0).is_empty());
    }

    #[test]
    fn test_weekly_stats_caps_weeks() {
        let stats = weekly_stats(&[], day(2026, 10, 21), u32::MAX);
        assert_eq!(stats.len(), MAX_REPORT_WEEKS as usize);
        assert_eq!(stats.last().map(|w| w.week_start), Some(day(2026, 10, 19)));

        let early = NaiveDate::MIN + chrono::Days::new(3);
        assert!(weekly_stats(&[], early, 2).is_empty());
    }
}
