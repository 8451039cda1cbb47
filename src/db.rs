//! File-backed task storage and utility functions.
//!
//! This module provides the `Database` struct, a JSON-file implementation of
//! [`TaskStore`], along with helpers for due-date parsing, relative date
//! formatting, table output and backups.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, Local, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::fields::*;
use crate::filter;
use crate::store::TaskStore;
use crate::task::*;

/// All tasks and subtasks of one user, persisted as a single JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Highest id ever handed out, so ids are not reused after deletes.
    #[serde(default)]
    last_task_id: u64,
    #[serde(default)]
    last_subtask_id: u64,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Database {
    /// A database that lives only in memory.
    pub fn in_memory() -> Self {
        Database::default()
    }

    /// Load database from a JSON file, starting empty if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no database file yet, starting empty");
            return Ok(Database {
                path: Some(path.to_path_buf()),
                ..Default::default()
            });
        }
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        let mut db: Database = serde_json::from_str(&buf)?;
        db.path = Some(path.to_path_buf());
        debug!(path = %path.display(), tasks = db.tasks.len(), "loaded database");
        Ok(db)
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    fn next_task_id(&mut self) -> u64 {
        let max = self.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        self.last_task_id = self.last_task_id.max(max) + 1;
        self.last_task_id
    }

    fn next_subtask_id(&mut self) -> u64 {
        let max = self.subtasks.iter().map(|s| s.id).max().unwrap_or(0);
        self.last_subtask_id = self.last_subtask_id.max(max) + 1;
        self.last_subtask_id
    }

    /// Run `op` against the in-memory state and persist it. If the write
    /// fails the in-memory state is rolled back so it matches the file.
    fn transact<T>(&mut self, op: impl FnOnce(&mut Self) -> T) -> Result<T> {
        let Some(path) = self.path.clone() else {
            return Ok(op(self));
        };
        let snapshot = self.clone();
        let out = op(self);
        if let Err(e) = self.save(&path) {
            warn!(path = %path.display(), error = %e, "save failed, rolling back");
            *self = snapshot;
            return Err(e);
        }
        Ok(out)
    }
}

impl TaskStore for Database {
    fn list_tasks(&self, filters: &TaskFilters) -> Result<Vec<Task>> {
        Ok(filter::select(self.tasks.iter().cloned(), filters))
    }

    fn get_task(&self, id: u64) -> Result<Option<Task>> {
        Ok(self.get(id).cloned())
    }

    fn create_task(&mut self, new: NewTask) -> Result<Task> {
        self.transact(|db| {
            let now = Utc::now();
            let task = Task {
                id: db.next_task_id(),
                title: new.title,
                description: new.description,
                status: new.status,
                priority: new.priority,
                due_date: new.due_date,
                tags: new.tags,
                created_at: now,
                updated_at: now,
                completed_at: None,
                archived_at: None,
                recurrence_rule: new.recurrence_rule,
                recurrence_interval: new.recurrence_interval,
                recurrence_end_date: new.recurrence_end_date,
                sort_order: new.sort_order.unwrap_or(0),
            };
            db.tasks.push(task.clone());
            task
        })
    }

    fn update_task(&mut self, id: u64, changes: &TaskChanges) -> Result<Option<Task>> {
        if self.get(id).is_none() {
            return Ok(None);
        }
        self.transact(|db| {
            db.get_mut(id).map(|t| {
                changes.apply_to(t);
                t.updated_at = Utc::now();
                t.clone()
            })
        })
    }

    fn delete_task(&mut self, id: u64) -> Result<()> {
        if self.get(id).is_none() {
            return Ok(());
        }
        self.transact(|db| {
            db.tasks.retain(|t| t.id != id);
            db.subtasks.retain(|s| s.task_id != id);
        })
    }

    fn max_sort_order(&self, status: Status) -> Result<Option<i64>> {
        Ok(self
            .tasks
            .iter()
            .filter(|t| t.status == status)
            .map(|t| t.sort_order)
            .max())
    }

    fn apply_sort_orders(&mut self, orders: &[(u64, i64)]) -> Result<()> {
        if orders.is_empty() {
            return Ok(());
        }
        self.transact(|db| {
            let now = Utc::now();
            for &(id, order) in orders {
                if let Some(t) = db.get_mut(id) {
                    t.sort_order = order;
                    t.updated_at = now;
                }
            }
        })
    }

    fn stats(&self, today: NaiveDate) -> Result<TaskStats> {
        let mut stats = TaskStats {
            total: self.tasks.len(),
            ..Default::default()
        };
        for t in &self.tasks {
            match t.status {
                Status::InProgress => stats.in_progress += 1,
                Status::Done => stats.done += 1,
                Status::Inbox | Status::Archived => {}
            }
            if filter::is_overdue(t, today) {
                stats.overdue += 1;
            }
            if t.due_date == Some(today) {
                stats.due_today += 1;
            }
        }
        Ok(stats)
    }

    fn list_subtasks(&self, task_id: u64) -> Result<Vec<Subtask>> {
        let mut subs: Vec<Subtask> = self
            .subtasks
            .iter()
            .filter(|s| s.task_id == task_id)
            .cloned()
            .collect();
        subs.sort_by_key(|s| (s.sort_order, s.created_at, s.id));
        Ok(subs)
    }

    fn create_subtask(&mut self, task_id: u64, title: &str, sort_order: i64) -> Result<Option<Subtask>> {
        if self.get(task_id).is_none() {
            return Ok(None);
        }
        self.transact(|db| {
            let now = Utc::now();
            let sub = Subtask {
                id: db.next_subtask_id(),
                task_id,
                title: title.to_string(),
                is_done: false,
                created_at: now,
                updated_at: now,
                sort_order,
            };
            db.subtasks.push(sub.clone());
            Some(sub)
        })
    }

    fn update_subtask(&mut self, id: u64, changes: &SubtaskChanges) -> Result<Option<Subtask>> {
        if !self.subtasks.iter().any(|s| s.id == id) {
            return Ok(None);
        }
        self.transact(|db| {
            db.subtasks.iter_mut().find(|s| s.id == id).map(|s| {
                if let Some(v) = &changes.title {
                    s.title = v.clone();
                }
                if let Some(v) = changes.is_done {
                    s.is_done = v;
                }
                if let Some(v) = changes.sort_order {
                    s.sort_order = v;
                }
                s.updated_at = Utc::now();
                s.clone()
            })
        })
    }

    fn delete_subtask(&mut self, id: u64) -> Result<()> {
        if !self.subtasks.iter().any(|s| s.id == id) {
            return Ok(());
        }
        self.transact(|db| db.subtasks.retain(|s| s.id != id))
    }

    fn max_subtask_sort_order(&self, task_id: u64) -> Result<Option<i64>> {
        Ok(self
            .subtasks
            .iter()
            .filter(|s| s.task_id == task_id)
            .map(|s| s.sort_order)
            .max())
    }
}

/// Create a timestamped copy of the database file in a `backup/` directory next to it.
pub fn create_backup(db_path: &Path) -> Result<PathBuf> {
    if !db_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Database file does not exist",
        )
        .into());
    }

    let parent_dir = db_path.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent_dir.join("backup");
    fs::create_dir_all(&backup_dir)?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let db_filename = db_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("tasks.json");
    let backup_path = backup_dir.join(format!("{timestamp}_{db_filename}"));
    fs::copy(db_path, &backup_path)?;
    Ok(backup_path)
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - weekday names ("fri", "next monday")
/// - "end of week", "end of month"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        "yesterday" => return today.pred_opt(),
        "end of week" | "eow" => return start_end_of_this_week(today).map(|(_, end)| end),
        "end of month" | "eom" => return crate::recurrence::end_of_month(today),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let (idx, unit) = rest.char_indices().last()?;
        let n: u32 = rest[..idx].trim().parse().ok()?;
        return match unit {
            'd' => today.checked_add_days(Days::new(u64::from(n))),
            'w' => today.checked_add_days(Days::new(u64::from(n) * 7)),
            'm' => today.checked_add_months(Months::new(n)),
            _ => None,
        };
    }

    let weekdays = [
        ("monday", 0),
        ("tuesday", 1),
        ("wednesday", 2),
        ("thursday", 3),
        ("friday", 4),
        ("saturday", 5),
        ("sunday", 6),
        ("mon", 0),
        ("tue", 1),
        ("wed", 2),
        ("thu", 3),
        ("fri", 4),
        ("sat", 5),
        ("sun", 6),
    ];
    let current_day = u64::from(today.weekday().num_days_from_monday());
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return today.checked_add_days(Days::new(days_ahead));
        }
        if s == format!("next {day_name}") {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return today.checked_add_days(Days::new(days_to_add));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let weekday = u64::from(today.weekday().num_days_from_monday());
    let start = today.checked_sub_days(Days::new(weekday))?;
    Some((start, start.checked_add_days(Days::new(6))?))
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            match delta {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {n}d"),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[Task]) {
    println!(
        "{:<5} {:<12} {:<9} {:<12} {:<5} {}",
        "ID", "Status", "Priority", "Due", "Order", "Title [tags]"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let tags = t.tag_list();
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(","))
        };
        let repeat = if t.is_recurring() { " ↻" } else { "" };
        println!(
            "{:<5} {:<12} {:<9} {:<12} {:<5} {}{}{}",
            t.id,
            t.status.label(),
            t.priority.label(),
            format_due_relative(t.due_date, today),
            t.sort_order,
            truncate(&t.title, 48),
            repeat,
            tags
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let mut db = Database::in_memory();
        let a = db.create_task(NewTask::new("a")).unwrap();
        let b = db.create_task(NewTask::new("b")).unwrap();
        db.delete_task(b.id).unwrap();
        let c = db.create_task(NewTask::new("c")).unwrap();
        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
    }

    #[test]
    fn test_delete_cascades_to_subtasks() {
        let mut db = Database::in_memory();
        let a = db.create_task(NewTask::new("a")).unwrap();
        let b = db.create_task(NewTask::new("b")).unwrap();
        db.create_subtask(a.id, "one", 1).unwrap();
        db.create_subtask(b.id, "two", 1).unwrap();
        db.delete_task(a.id).unwrap();
        assert!(db.list_subtasks(a.id).unwrap().is_empty());
        assert_eq!(db.list_subtasks(b.id).unwrap().len(), 1);
        db.delete_task(a.id).unwrap();
    }

    #[test]
    fn test_create_subtask_for_missing_task() {
        let mut db = Database::in_memory();
        assert!(db.create_subtask(42, "orphan", 1).unwrap().is_none());
    }

    #[test]
    fn test_max_sort_order_per_bucket() {
        let mut db = Database::in_memory();
        assert_eq!(db.max_sort_order(Status::Inbox).unwrap(), None);
        let mut n = NewTask::new("a");
        n.sort_order = Some(5);
        db.create_task(n).unwrap();
        let mut n = NewTask::new("b");
        n.status = Status::Done;
        n.sort_order = Some(9);
        db.create_task(n).unwrap();
        assert_eq!(db.max_sort_order(Status::Inbox).unwrap(), Some(5));
        assert_eq!(db.max_sort_order(Status::Done).unwrap(), Some(9));
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut db = Database::load(&path).unwrap();
        let t = db.create_task(NewTask::new("persist me")).unwrap();
        let loaded = Database::load(&path).unwrap();
        assert_eq!(loaded.get(t.id).map(|t| t.title.as_str()), Some("persist me"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Database::load(&path), Err(crate::error::Error::Json(_))));
    }

    #[test]
    fn test_stats_counts() {
        let today = day(2026, 5, 10);
        let mut db = Database::in_memory();
        let mut n = NewTask::new("late");
        n.due_date = Some(day(2026, 5, 1));
        db.create_task(n).unwrap();
        let mut n = NewTask::new("today, done");
        n.status = Status::Done;
        n.due_date = Some(today);
        db.create_task(n).unwrap();
        let mut n = NewTask::new("working");
        n.status = Status::InProgress;
        db.create_task(n).unwrap();
        let stats = db.stats(today).unwrap();
        assert_eq!(
            stats,
            TaskStats { total: 3, in_progress: 1, done: 1, overdue: 1, due_today: 1 }
        );
    }

    #[test]
    fn test_parse_due_input() {
        let today = day(2026, 10, 19); // Monday
        assert_eq!(parse_due_input("today", today), Some(today));
        assert_eq!(parse_due_input("in 3d", today), Some(day(2026, 10, 22)));
        assert_eq!(parse_due_input("in 2w", today), Some(day(2026, 11, 2)));
        assert_eq!(parse_due_input("in 1m", today), Some(day(2026, 11, 19)));
        assert_eq!(parse_due_input("eom", today), Some(day(2026, 10, 31)));
        assert_eq!(parse_due_input("fri", today), Some(day(2026, 10, 23)));
        assert_eq!(parse_due_input("next monday", today), Some(day(2026, 10, 26)));
        assert_eq!(parse_due_input("2026-12-01", today), Some(day(2026, 12, 1)));
        assert_eq!(parse_due_input("someday", today), None);
        assert_eq!(parse_due_input("eow", today), Some(day(2026, 10, 25)));
        assert_eq!(parse_due_input("in 3x", today), None);
    }

    #[test]
    fn test_parse_due_input_out_of_range_is_none() {
        let today = day(2026, 1, 1);
        assert_eq!(parse_due_input("in 200000000d", today), None);
        assert_eq!(parse_due_input("in 4000000000w", today), None);
        assert_eq!(parse_due_input("in 4000000000m", today), None);
        assert_eq!(parse_due_input("tomorrow", NaiveDate::MAX), None);
    }

    #[test]
    fn test_format_due_relative_and_truncate() {
        let today = day(2026, 1, 10);
        assert_eq!(format_due_relative(None, today), "-");
        assert_eq!(format_due_relative(Some(day(2026, 1, 11)), today), "tomorrow");
        assert_eq!(format_due_relative(Some(day(2026, 1, 8)), today), "2d late");
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
