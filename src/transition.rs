//! Field side effects of a status change.
//!
//! Completion and archival timestamps follow the status: `completed_at` is set
//! exactly while a task is Done, `archived_at` exactly while it is Archived.
//! Moving a task into another bucket also moves it to the end of that bucket.

use chrono::{DateTime, Utc};

use crate::fields::Status;
use crate::task::TaskChanges;

/// Overrides implied by a status change, to be merged into the change set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideEffects {
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub archived_at: Option<Option<DateTime<Utc>>>,
    /// The task needs `max(sort_order in new bucket) + 1`.
    pub append_to_bucket: bool,
}

/// Compute the overrides for `changes` applied to a task currently in `old_status`.
///
/// Nothing is derived when `changes` carries no status. Explicitly supplied
/// timestamps and sort order always win.
pub fn derive_side_effects(old_status: Status, changes: &TaskChanges, now: DateTime<Utc>) -> SideEffects {
    let Some(new_status) = changes.status else {
        return SideEffects::default();
    };

    let completed_at = match (changes.completed_at, new_status) {
        (Some(_), _) => None,
        (None, Status::Done) => Some(Some(now)),
        (None, Status::Inbox | Status::InProgress | Status::Archived) => Some(None),
    };
    let archived_at = match (changes.archived_at, new_status) {
        (Some(_), _) => None,
        (None, Status::Archived) => Some(Some(now)),
        (None, Status::Inbox | Status::InProgress | Status::Done) => Some(None),
    };

    SideEffects {
        completed_at,
        archived_at,
        append_to_bucket: new_status != old_status && changes.sort_order.is_none(),
    }
}

impl SideEffects {
    /// Merge into `changes`; `next_sort_order` is consulted only when the task changes bucket.
    pub fn merge_into<E>(
        self,
        changes: &mut TaskChanges,
        next_sort_order: impl FnOnce() -> Result<i64, E>,
    ) -> Result<(), E> {
        if let Some(v) = self.completed_at {
            changes.completed_at = Some(v);
        }
        if let Some(v) = self.archived_at {
            changes.archived_at = Some(v);
        }
        if self.append_to_bucket {
            changes.sort_order = Some(next_sort_order()?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap()
    }

    #[test]
    fn test_no_status_no_effects() {
        let changes = TaskChanges {
            title: Some("x".into()),
            ..Default::default()
        };
        assert_eq!(derive_side_effects(Status::Inbox, &changes, now()), SideEffects::default());
    }

    #[test]
    fn test_done_sets_completed_and_clears_archived() {
        let fx = derive_side_effects(Status::Archived, &TaskChanges::status(Status::Done), now());
        assert_eq!(fx.completed_at, Some(Some(now())));
        assert_eq!(fx.archived_at, Some(None));
        assert!(fx.append_to_bucket);
    }

    #[test]
    fn test_archive_sets_archived_and_clears_completed() {
        let fx = derive_side_effects(Status::Done, &TaskChanges::status(Status::Archived), now());
        assert_eq!(fx.completed_at, Some(None));
        assert_eq!(fx.archived_at, Some(Some(now())));
    }

    #[test]
    fn test_reopen_clears_both() {
        let fx = derive_side_effects(Status::Done, &TaskChanges::status(Status::InProgress), now());
        assert_eq!(fx.completed_at, Some(None));
        assert_eq!(fx.archived_at, Some(None));
    }

    #[test]
    fn test_explicit_fields_win() {
        let earlier = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let changes = TaskChanges {
            status: Some(Status::Done),
            completed_at: Some(Some(earlier)),
            sort_order: Some(7),
            ..Default::default()
        };
        let fx = derive_side_effects(Status::Inbox, &changes, now());
        assert_eq!(fx.completed_at, None);
        assert!(!fx.append_to_bucket);
    }

    #[test]
    fn test_same_status_keeps_sort_order() {
        let fx = derive_side_effects(Status::Done, &TaskChanges::status(Status::Done), now());
        assert!(!fx.append_to_bucket);
        assert_eq!(fx.completed_at, Some(Some(now())));
    }

    #[test]
    fn test_merge_only_queries_bucket_when_moving() {
        let mut changes = TaskChanges::status(Status::Done);
        let fx = derive_side_effects(Status::Done, &changes, now());
        fx.merge_into::<()>(&mut changes, || panic!("should not be called")).unwrap();
        assert_eq!(changes.sort_order, None);

        let mut changes = TaskChanges::status(Status::InProgress);
        let fx = derive_side_effects(Status::Inbox, &changes, now());
        fx.merge_into::<()>(&mut changes, || Ok(4)).unwrap();
        assert_eq!(changes.sort_order, Some(4));
        assert_eq!(changes.completed_at, Some(None));
    }
}
