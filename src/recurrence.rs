//! Date arithmetic for recurring tasks.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::fields::RecurrenceRule;

/// Due date of the occurrence after one due on `current`.
///
/// Always advances from the task's own due date, never from today. Monthly
/// steps clamp the day to the end of the target month. `None` when the
/// result is past the last representable date.
pub fn next_due_date(current: NaiveDate, rule: RecurrenceRule, interval: u32) -> Option<NaiveDate> {
    let interval = interval.max(1);
    match rule {
        RecurrenceRule::Daily => current.checked_add_days(Days::new(u64::from(interval))),
        RecurrenceRule::Weekly => current.checked_add_days(Days::new(u64::from(interval) * 7)),
        RecurrenceRule::Monthly => current.checked_add_months(Months::new(interval)),
    }
}

/// Last day of the month containing `date`.
pub fn end_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day0(0)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}
