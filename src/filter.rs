//! Task selection and ordering.
//!
//! `select` turns the full task collection plus a [`TaskFilters`] value into the
//! ordered list the views display. It never mutates tasks and keeps no state;
//! "today" is read once per call from the local calendar.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{Duration, Local, NaiveDate};

use crate::fields::*;
use crate::task::{Task, TaskFilters};

/// Days ahead (inclusive) covered by the upcoming view.
pub const UPCOMING_DAYS: i64 = 7;

/// Select and order the tasks matching `filters`, using today's local date.
pub fn select<I>(tasks: I, filters: &TaskFilters) -> Vec<Task>
where
    I: IntoIterator<Item = Task>,
{
    select_on(tasks, filters, Local::now().date_naive())
}

/// Same as [`select`] with an explicit "today".
pub fn select_on<I>(tasks: I, filters: &TaskFilters, today: NaiveDate) -> Vec<Task>
where
    I: IntoIterator<Item = Task>,
{
    let needle = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut selected: Vec<Task> = tasks
        .into_iter()
        .filter(|t| matches_key(t, filters.filter_key, today))
        .filter(|t| filters.due_on.map_or(true, |d| t.due_date == Some(d)))
        .filter(|t| needle.as_deref().map_or(true, |n| matches_search(t, n)))
        .collect();
    selected.sort_by(compare);
    selected
}

/// Whether `task` belongs to the named view.
pub fn matches_key(task: &Task, key: FilterKey, today: NaiveDate) -> bool {
    match key {
        FilterKey::All => true,
        FilterKey::Inbox | FilterKey::InProgress | FilterKey::Done | FilterKey::Archived => {
            key.status() == Some(task.status)
        }
        FilterKey::Overdue => is_overdue(task, today),
        FilterKey::Upcoming => match task.due_date {
            Some(d) if !task.status.is_closed() => {
                d >= today && d <= today + Duration::days(UPCOMING_DAYS)
            }
            _ => false,
        },
    }
}

/// Open task whose due date has passed.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.status.is_closed() && task.due_date.is_some_and(|d| d < today)
}

/// Case-insensitive substring match on title, description or tags.
/// `needle` must already be lowercased.
pub fn matches_search(task: &Task, needle: &str) -> bool {
    [&task.title, &task.description, &task.tags]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Display order: manual sort order, then dated before undated, earlier due
/// date, higher priority, newer creation. The id breaks any remaining tie so
/// the order is total.
pub fn compare(a: &Task, b: &Task) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// Group tasks into kanban columns, one per status, each in display order.
pub fn board<I>(tasks: I) -> BTreeMap<Status, Vec<Task>>
where
    I: IntoIterator<Item = Task>,
{
    let mut columns: BTreeMap<Status, Vec<Task>> =
        Status::ALL.iter().map(|s| (*s, Vec::new())).collect();
    for t in tasks {
        columns.entry(t.status).or_default().push(t);
    }
    for col in columns.values_mut() {
        col.sort_by(compare);
    }
    columns
}

/// Open tasks due today or earlier, soonest first.
pub fn reminders<I>(tasks: I, today: NaiveDate) -> Vec<Task>
where
    I: IntoIterator<Item = Task>,
{
    let mut due: Vec<Task> = tasks
        .into_iter()
        .filter(|t| !t.status.is_closed() && t.due_date.is_some_and(|d| d <= today))
        .collect();
    due.sort_by_key(|t| (t.due_date, t.id));
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: u64, status: Status, due: Option<NaiveDate>) -> Task {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        Task {
            id,
            title: format!("task {id}"),
            description: String::new(),
            status,
            priority: Priority::Medium,
            due_date: due,
            tags: String::new(),
            created_at: created,
            updated_at: created,
            completed_at: None,
            archived_at: None,
            recurrence_rule: None,
            recurrence_interval: 1,
            recurrence_end_date: None,
            sort_order: 0,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<u64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_overdue_excludes_closed_and_undated() {
        let today = day(2026, 3, 10);
        let tasks = vec![
            task(1, Status::Inbox, Some(day(2026, 3, 9))),
            task(2, Status::Done, Some(day(2026, 3, 1))),
            task(3, Status::Archived, Some(day(2026, 3, 1))),
            task(4, Status::InProgress, None),
            task(5, Status::InProgress, Some(day(2026, 3, 10))),
        ];
        let out = select_on(tasks, &TaskFilters::key(FilterKey::Overdue), today);
        assert_eq!(ids(&out), vec![1]);
    }

    #[test]
    fn test_upcoming_window_is_inclusive() {
        let today = day(2026, 3, 10);
        let tasks = vec![
            task(1, Status::Inbox, Some(day(2026, 3, 10))),
            task(2, Status::Inbox, Some(day(2026, 3, 17))),
            task(3, Status::Inbox, Some(day(2026, 3, 18))),
            task(4, Status::Inbox, Some(day(2026, 3, 9))),
            task(5, Status::Done, Some(day(2026, 3, 12))),
        ];
        let out = select_on(tasks, &TaskFilters::key(FilterKey::Upcoming), today);
        assert_eq!(ids(&out), vec![1, 2]);
    }

    #[test]
    fn test_status_keys_match_exactly() {
        let today = day(2026, 3, 10);
        let tasks = vec![
            task(1, Status::Inbox, None),
            task(2, Status::InProgress, None),
            task(3, Status::Done, None),
            task(4, Status::Archived, None),
        ];
        for (key, expected) in [
            (FilterKey::Inbox, 1),
            (FilterKey::InProgress, 2),
            (FilterKey::Done, 3),
            (FilterKey::Archived, 4),
        ] {
            let out = select_on(tasks.clone(), &TaskFilters::key(key), today);
            assert_eq!(ids(&out), vec![expected]);
        }
        assert_eq!(select_on(tasks, &TaskFilters::default(), today).len(), 4);
    }

    #[test]
    fn test_due_on_intersects_with_key() {
        let today = day(2026, 3, 10);
        let tasks = vec![
            task(1, Status::Inbox, Some(day(2026, 3, 5))),
            task(2, Status::Inbox, Some(day(2026, 3, 6))),
            task(3, Status::Done, Some(day(2026, 3, 5))),
        ];
        let filters = TaskFilters {
            filter_key: FilterKey::Overdue,
            due_on: Some(day(2026, 3, 5)),
            ..Default::default()
        };
        assert_eq!(ids(&select_on(tasks, &filters, today)), vec![1]);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let today = day(2026, 3, 10);
        let mut a = task(1, Status::Inbox, None);
        a.title = "Pay RENT".into();
        let mut b = task(2, Status::Inbox, None);
        b.description = "call landlord about rent".into();
        let mut c = task(3, Status::Inbox, None);
        c.tags = "home,Rent".into();
        let d = task(4, Status::Inbox, None);
        let filters = TaskFilters {
            search: Some("rent".into()),
            ..Default::default()
        };
        let mut got = ids(&select_on(vec![a, b, c, d], &filters, today));
        got.sort();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filters = TaskFilters {
            search: Some("   ".into()),
            ..Default::default()
        };
        let out = select_on(vec![task(1, Status::Inbox, None)], &filters, day(2026, 1, 1));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        for key in [FilterKey::All, FilterKey::Overdue, FilterKey::Upcoming] {
            assert!(select_on(Vec::new(), &TaskFilters::key(key), day(2026, 1, 1)).is_empty());
        }
    }

    #[test]
    fn test_dated_task_sorts_before_undated_at_same_sort_order() {
        let today = day(2026, 3, 10);
        let out = select_on(
            vec![task(1, Status::Inbox, None), task(2, Status::Inbox, Some(today))],
            &TaskFilters::default(),
            today,
        );
        assert_eq!(ids(&out), vec![2, 1]);
    }

    #[test]
    fn test_ordering_keys_in_precedence() {
        let today = day(2026, 3, 10);
        let mut manual = task(1, Status::Inbox, None);
        manual.sort_order = -1;
        let early = task(2, Status::Inbox, Some(day(2026, 3, 11)));
        let mut late_low = task(3, Status::Inbox, Some(day(2026, 3, 12)));
        late_low.priority = Priority::Low;
        let mut late_critical = task(4, Status::Inbox, Some(day(2026, 3, 12)));
        late_critical.priority = Priority::Critical;
        let mut newer = task(5, Status::Inbox, Some(day(2026, 3, 12)));
        newer.priority = Priority::Low;
        newer.created_at = newer.created_at + Duration::hours(1);

        let out = select_on(
            vec![late_low, newer, early, late_critical, manual],
            &TaskFilters::default(),
            today,
        );
        assert_eq!(ids(&out), vec![1, 2, 4, 5, 3]);
    }

    #[test]
    fn test_order_independent_of_input_order() {
        let today = day(2026, 3, 10);
        let tasks: Vec<Task> = (1..=6)
            .map(|i| task(i, Status::Inbox, if i % 2 == 0 { Some(today) } else { None }))
            .collect();
        let mut reversed = tasks.clone();
        reversed.reverse();
        assert_eq!(
            select_on(tasks, &TaskFilters::default(), today),
            select_on(reversed, &TaskFilters::default(), today)
        );
    }

    #[test]
    fn test_board_has_every_column() {
        let cols = board(vec![task(1, Status::Done, None)]);
        assert_eq!(cols.len(), 4);
        assert_eq!(ids(&cols[&Status::Done]), vec![1]);
        assert!(cols[&Status::Inbox].is_empty());
    }

    #[test]
    fn test_reminders_include_today_and_skip_closed() {
        let today = day(2026, 3, 10);
        let out = reminders(
            vec![
                task(1, Status::Inbox, Some(today)),
                task(2, Status::InProgress, Some(day(2026, 3, 1))),
                task(3, Status::Done, Some(day(2026, 3, 1))),
                task(4, Status::Inbox, Some(day(2026, 3, 11))),
            ],
            today,
        );
        assert_eq!(ids(&out), vec![2, 1]);
    }
}
