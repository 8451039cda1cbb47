//! Enumerations and field types for task management.
//!
//! This module defines the closed sets used to categorise tasks: workflow status,
//! priority, recurrence cadence and the named list views (filter keys).

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Workflow status of a task. Each status is one kanban column ("bucket").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Status {
    Inbox,
    InProgress,
    Done,
    Archived,
}

impl Status {
    /// All statuses in board column order.
    pub const ALL: [Status; 4] = [Status::Inbox, Status::InProgress, Status::Done, Status::Archived];

    /// Stable machine name, as stored and exchanged in CSV.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Inbox => "inbox",
            Status::InProgress => "in_progress",
            Status::Done => "done",
            Status::Archived => "archived",
        }
    }

    /// Human label for tables and board headers.
    pub fn label(self) -> &'static str {
        match self {
            Status::Inbox => "Inbox",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
            Status::Archived => "Archived",
        }
    }

    /// Done and Archived tasks are closed; they never count as overdue or upcoming.
    pub fn is_closed(self) -> bool {
        matches!(self, Status::Done | Status::Archived)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority. Stored and exchanged as the integers 1 to 4.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    Low = 1,
    #[default]
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::High),
            4 => Ok(Priority::Critical),
            other => Err(format!("priority must be between 1 and 4, got {other}")),
        }
    }
}

/// Recurrence cadence; combined with an interval it means "every N days/weeks/months".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceRule {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrenceRule {
    pub fn as_str(self) -> &'static str {
        match self {
            RecurrenceRule::Daily => "daily",
            RecurrenceRule::Weekly => "weekly",
            RecurrenceRule::Monthly => "monthly",
        }
    }
}

/// Named list views for `tf list`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum FilterKey {
    #[default]
    All,
    Inbox,
    InProgress,
    Done,
    Archived,
    Overdue,
    Upcoming,
}

impl FilterKey {
    /// The status a plain status view restricts to, if any.
    pub fn status(self) -> Option<Status> {
        match self {
            FilterKey::Inbox => Some(Status::Inbox),
            FilterKey::InProgress => Some(Status::InProgress),
            FilterKey::Done => Some(Status::Done),
            FilterKey::Archived => Some(Status::Archived),
            FilterKey::All | FilterKey::Overdue | FilterKey::Upcoming => None,
        }
    }
}

/// Parse a status string from CSV format. Unknown values fall back to Inbox.
pub fn parse_status(s: &str) -> Status {
    match s.trim().to_lowercase().as_str() {
        "inbox" => Status::Inbox,
        "in_progress" => Status::InProgress,
        "done" => Status::Done,
        "archived" => Status::Archived,
        _ => Status::Inbox,
    }
}

/// Parse a priority from CSV format. Anything that is not an integer 1-4 becomes Medium.
pub fn parse_priority(s: &str) -> Priority {
    s.trim()
        .parse::<u8>()
        .ok()
        .and_then(|v| Priority::try_from(v).ok())
        .unwrap_or_default()
}

/// Parse a recurrence rule from CSV format. Blank or unknown means no recurrence.
pub fn parse_recurrence_rule(s: &str) -> Option<RecurrenceRule> {
    match s.trim().to_lowercase().as_str() {
        "daily" => Some(RecurrenceRule::Daily),
        "weekly" => Some(RecurrenceRule::Weekly),
        "monthly" => Some(RecurrenceRule::Monthly),
        _ => None,
    }
}

/// Parse a recurrence interval from CSV format. Unparseable or non-positive values become 1.
pub fn parse_interval(s: &str) -> u32 {
    match s.trim().parse::<u32>() {
        Ok(n) if n >= 1 => n,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_defaults_to_inbox() {
        assert_eq!(parse_status("in_progress"), Status::InProgress);
        assert_eq!(parse_status(" DONE "), Status::Done);
        assert_eq!(parse_status("waiting"), Status::Inbox);
        assert_eq!(parse_status(""), Status::Inbox);
    }

    #[test]
    fn test_parse_priority_and_interval_defaults() {
        assert_eq!(parse_priority("4"), Priority::Critical);
        assert_eq!(parse_priority("high"), Priority::Medium);
        assert_eq!(parse_priority("9"), Priority::Medium);
        assert_eq!(parse_interval("3"), 3);
        assert_eq!(parse_interval("0"), 1);
        assert_eq!(parse_interval("x"), 1);
    }

    #[test]
    fn test_priority_serialises_as_integer() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "3");
        let p: Priority = serde_json::from_str("1").unwrap();
        assert_eq!(p, Priority::Low);
        assert!(serde_json::from_str::<Priority>("5").is_err());
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"in_progress\"");
    }
}
