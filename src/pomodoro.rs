//! Pomodoro timer schedule.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    Break,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Work => f.write_str("Work"),
            Phase::Break => f.write_str("Break"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub phase: Phase,
    pub minutes: u32,
}

/// `cycles` work sessions, each followed by a break except the last.
pub fn schedule(work_min: u32, break_min: u32, cycles: u32) -> Vec<Session> {
    let mut out = Vec::new();
    for i in 0..cycles {
        out.push(Session { phase: Phase::Work, minutes: work_min });
        if i + 1 < cycles {
            out.push(Session { phase: Phase::Break, minutes: break_min });
        }
    }
    out
}

/// `MM:SS` countdown label.
pub fn format_remaining(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_alternates_and_ends_on_work() {
        let s = schedule(25, 5, 2);
        assert_eq!(
            s,
            vec![
                Session { phase: Phase::Work, minutes: 25 },
                Session { phase: Phase::Break, minutes: 5 },
                Session { phase: Phase::Work, minutes: 25 },
            ]
        );
        assert!(schedule(25, 5, 0).is_empty());
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(25 * 60), "25:00");
        assert_eq!(format_remaining(61), "01:01");
    }
}
