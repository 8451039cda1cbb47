//! CSV import/export and iCalendar export.
//!
//! CSV columns are fixed (see [`CSV_HEADERS`]); dates are `YYYY-MM-DD`.
//! Import is best effort: bad values fall back to defaults and rows without a
//! title are skipped.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::fields::*;
use crate::task::{NewTask, Task};

pub const CSV_HEADERS: [&str; 9] = [
    "title",
    "description",
    "status",
    "priority",
    "due_date",
    "tags",
    "recurrence_rule",
    "recurrence_interval",
    "recurrence_end_date",
];

/// Render tasks as CSV with a header row.
pub fn tasks_to_csv(tasks: &[Task]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADERS.join(","));
    out.push('\n');
    for t in tasks {
        let fmt_date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        let row = [
            escape_csv(&t.title),
            escape_csv(&t.description),
            t.status.as_str().to_string(),
            u8::from(t.priority).to_string(),
            fmt_date(t.due_date),
            escape_csv(&t.tags),
            t.recurrence_rule.map(|r| r.as_str()).unwrap_or_default().to_string(),
            t.recurrence_interval.to_string(),
            fmt_date(t.recurrence_end_date),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Quote a field if it contains a separator, quote or line break.
fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Parse CSV text into tasks to create. Columns are matched by header name;
/// the header must at least contain `title`.
pub fn tasks_from_csv(input: &str) -> Result<Vec<NewTask>> {
    let mut records = parse_csv(input).into_iter();
    let header = records
        .next()
        .ok_or_else(|| Error::InvalidArgument("CSV file is empty".into()))?;
    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().trim_start_matches('\u{feff}').to_lowercase(), i))
        .collect();
    if !columns.contains_key("title") {
        return Err(Error::InvalidArgument(format!(
            "CSV header must contain a title column, expected: {}",
            CSV_HEADERS.join(",")
        )));
    }

    let mut tasks = Vec::new();
    for (line, record) in records.enumerate() {
        let field = |name: &str| column(&columns, &record, name);
        let title = field("title");
        if title.is_empty() {
            debug!(row = line + 2, "skipping CSV row without title");
            continue;
        }
        tasks.push(NewTask {
            title: title.to_string(),
            description: field("description").to_string(),
            status: parse_status(field("status")),
            priority: parse_priority(field("priority")),
            due_date: parse_date(field("due_date")),
            tags: field("tags").to_string(),
            recurrence_rule: parse_recurrence_rule(field("recurrence_rule")),
            recurrence_interval: parse_interval(field("recurrence_interval")),
            recurrence_end_date: parse_date(field("recurrence_end_date")),
            sort_order: None,
        });
    }
    Ok(tasks)
}

fn column<'a>(columns: &HashMap<String, usize>, record: &'a [String], name: &str) -> &'a str {
    columns
        .get(name)
        .and_then(|&i| record.get(i))
        .map(|s| s.trim())
        .unwrap_or("")
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Split CSV text into records, honouring quoted fields (with `""` escapes
/// and embedded line breaks). Blank lines are dropped.
fn parse_csv(input: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => record.push(std::mem::take(&mut field)),
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => field.push(ch),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

/// Render tasks with a due date as all-day calendar events.
pub fn tasks_to_ics(tasks: &[Task], now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y%m%dT%H%M%SZ");
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//TaskForge//EN".to_string(),
        "CALSCALE:GREGORIAN".to_string(),
    ];
    for t in tasks {
        let Some(due) = t.due_date else { continue };
        lines.extend([
            "BEGIN:VEVENT".to_string(),
            format!("UID:task-{}@taskforge", t.id),
            format!("DTSTAMP:{stamp}"),
            format!("DTSTART;VALUE=DATE:{}", due.format("%Y%m%d")),
            format!("SUMMARY:{}", escape_ics(&t.title)),
            format!("DESCRIPTION:{}", escape_ics(&t.description)),
            "END:VEVENT".to_string(),
        ]);
    }
    lines.push("END:VCALENDAR".to_string());
    lines.join("\n")
}

/// Backslash-escape `\`, `;`, `,` and newlines for iCalendar text values.
pub fn escape_ics(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}
