//! # TaskForge
//!
//! A personal task manager: tasks with status, priority, due dates, tags,
//! checklists and recurrence rules, shown as filtered lists or a kanban board,
//! with CSV/ICS exchange and a pomodoro timer.
//!
//! ## Key pieces
//!
//! - [`filter`]: selects and orders tasks for a view (all, inbox, overdue, upcoming, ...)
//! - [`service::TaskService`]: status transitions, completion/archival timestamps,
//!   bucket ordering and spawning the next occurrence of recurring tasks
//! - [`store::TaskStore`]: the storage interface, implemented by [`db::Database`]
//!   (one JSON file, written atomically)
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task that repeats every two weeks
//! tf add "Water the plants" --due fri --repeat weekly --every 2
//!
//! # What is overdue?
//! tf list --filter overdue
//!
//! # Finish it; the next occurrence is created automatically
//! tf done 1
//! ```
//!
//! Data is stored locally in `~/.taskforge/` (override with `TASKFORGE_HOME`).

pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod exchange;
pub mod fields;
pub mod filter;
pub mod pomodoro;
pub mod recurrence;
pub mod service;
pub mod store;
pub mod task;
pub mod transition;

pub use error::{Error, Result};
