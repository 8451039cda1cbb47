//! Task data structures and related functionality.
//!
//! This module defines the persisted `Task` and `Subtask` records, the field
//! sets used to create and change them, and the ephemeral `TaskFilters` query.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// A planning unit with status, priority, due date, tags and an optional recurrence rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    /// Free text, comma-separated by convention.
    #[serde(default)]
    pub tags: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
    pub recurrence_rule: Option<RecurrenceRule>,
    #[serde(default = "default_interval")]
    pub recurrence_interval: u32,
    pub recurrence_end_date: Option<NaiveDate>,
    /// Manual order within the task's status bucket.
    #[serde(default)]
    pub sort_order: i64,
}

fn default_interval() -> u32 {
    1
}

impl Task {
    /// Split the tag string on commas, dropping blanks.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some()
    }
}

/// A checklist item owned by exactly one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: u64,
    pub task_id: u64,
    pub title: String,
    #[serde(default)]
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub sort_order: i64,
}

/// Fields for creating a task. Identity and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: String,
    pub recurrence_rule: Option<RecurrenceRule>,
    pub recurrence_interval: u32,
    pub recurrence_end_date: Option<NaiveDate>,
    /// `None` lets the service place the task at the end of its bucket.
    pub sort_order: Option<i64>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            description: String::new(),
            status: Status::Inbox,
            priority: Priority::Medium,
            due_date: None,
            tags: String::new(),
            recurrence_rule: None,
            recurrence_interval: 1,
            recurrence_end_date: None,
            sort_order: None,
        }
    }

    /// The next occurrence of `task`: same content and rule, forced into the Inbox.
    pub fn next_occurrence(task: &Task, due_date: NaiveDate) -> Self {
        NewTask {
            title: task.title.clone(),
            description: task.description.clone(),
            status: Status::Inbox,
            priority: task.priority,
            due_date: Some(due_date),
            tags: task.tags.clone(),
            recurrence_rule: task.recurrence_rule,
            recurrence_interval: task.recurrence_interval.max(1),
            recurrence_end_date: task.recurrence_end_date,
            sort_order: None,
        }
    }
}

/// A partial update. `None` means "not supplied"; for nullable fields
/// `Some(None)` explicitly clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub tags: Option<String>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub archived_at: Option<Option<DateTime<Utc>>>,
    pub recurrence_rule: Option<Option<RecurrenceRule>>,
    pub recurrence_interval: Option<u32>,
    pub recurrence_end_date: Option<Option<NaiveDate>>,
    pub sort_order: Option<i64>,
}

impl TaskChanges {
    pub fn status(status: Status) -> Self {
        TaskChanges {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskChanges::default()
    }

    /// Write every supplied field onto `task`. Timestamps other than
    /// completion/archival are the store's business.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(v) = &self.title {
            task.title = v.clone();
        }
        if let Some(v) = &self.description {
            task.description = v.clone();
        }
        if let Some(v) = self.status {
            task.status = v;
        }
        if let Some(v) = self.priority {
            task.priority = v;
        }
        if let Some(v) = self.due_date {
            task.due_date = v;
        }
        if let Some(v) = &self.tags {
            task.tags = v.clone();
        }
        if let Some(v) = self.completed_at {
            task.completed_at = v;
        }
        if let Some(v) = self.archived_at {
            task.archived_at = v;
        }
        if let Some(v) = self.recurrence_rule {
            task.recurrence_rule = v;
        }
        if let Some(v) = self.recurrence_interval {
            task.recurrence_interval = v;
        }
        if let Some(v) = self.recurrence_end_date {
            task.recurrence_end_date = v;
        }
        if let Some(v) = self.sort_order {
            task.sort_order = v;
        }
    }
}

/// Partial update for a subtask.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtaskChanges {
    pub title: Option<String>,
    pub is_done: Option<bool>,
    pub sort_order: Option<i64>,
}

/// Ephemeral list query: a named view, optional free-text search and optional exact due date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilters {
    pub filter_key: FilterKey,
    pub search: Option<String>,
    pub due_on: Option<NaiveDate>,
}

impl TaskFilters {
    pub fn key(filter_key: FilterKey) -> Self {
        TaskFilters {
            filter_key,
            ..Default::default()
        }
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub in_progress: usize,
    pub done: usize,
    pub overdue: usize,
    pub due_today: usize,
}

/// Created/completed counts for one Monday-start week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyStat {
    pub week_start: NaiveDate,
    pub created: usize,
    pub completed: usize,
}
