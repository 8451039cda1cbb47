//! Command implementations for the CLI interface.
//!
//! Each subcommand maps onto one `TaskService` operation and prints its result.
//! Handlers return `Result` and leave exit-code handling to `main`.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{Local, NaiveDate, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::{info, warn};

use crate::config::Settings;
use crate::db::*;
use crate::error::{Error, Result};
use crate::exchange;
use crate::fields::*;
use crate::pomodoro;
use crate::service::{TaskService, MAX_REPORT_WEEKS};
use crate::store::TaskStore;
use crate::task::*;

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Initial status.
        #[arg(long, value_enum, default_value_t = Status::Inbox)]
        status: Status,
        /// Priority: low | medium | high | critical.
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "fri" or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated tags.
        #[arg(long)]
        tags: Option<String>,
        /// Repeat the task when it is marked done.
        #[arg(long, value_enum)]
        repeat: Option<RecurrenceRule>,
        /// Repeat every N days/weeks/months.
        #[arg(long, default_value_t = 1)]
        every: u32,
        /// Last date an occurrence may fall on.
        #[arg(long)]
        until: Option<String>,
    },

    /// List tasks in display order.
    List {
        /// View: all | inbox | in_progress | done | archived | overdue | upcoming.
        #[arg(long, value_enum, default_value_t = FilterKey::All)]
        filter: FilterKey,
        /// Case-insensitive text to find in title, description or tags.
        #[arg(long, short)]
        search: Option<String>,
        /// Only tasks due on this date.
        #[arg(long)]
        on: Option<String>,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task with its subtasks.
    View {
        id: u64,
    },

    /// Update fields on a task.
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        due: Option<String>,
        /// Clear due date.
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
        /// Replace tags (comma-separated).
        #[arg(long)]
        tags: Option<String>,
        #[arg(long, value_enum)]
        repeat: Option<RecurrenceRule>,
        /// Stop repeating.
        #[arg(long, conflicts_with = "repeat")]
        no_repeat: bool,
        #[arg(long)]
        every: Option<u32>,
        #[arg(long)]
        until: Option<String>,
        /// Clear the recurrence end date.
        #[arg(long, conflicts_with = "until")]
        clear_until: bool,
    },

    /// Mark a task done (spawning its next occurrence), or reopen it if already done.
    Done {
        id: u64,
    },

    /// Move a task to another board column.
    Move {
        id: u64,
        #[arg(value_enum)]
        status: Status,
    },

    /// Archive a task.
    Archive {
        id: u64,
    },

    /// Delete a task and its subtasks.
    Delete {
        id: u64,
    },

    /// Set manual order: the given tasks get positions 1, 2, 3, ...
    Reorder {
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Show the kanban board.
    Board,

    /// Dashboard counters.
    Stats,

    /// Open tasks due today or earlier.
    Reminders,

    /// Tasks created and completed per week.
    Report {
        /// Number of weeks, at most ten years.
        #[arg(
            long,
            default_value_t = 8,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_REPORT_WEEKS))
        )]
        weeks: u32,
    },

    /// Manage a task's checklist.
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },

    /// Export all tasks to CSV.
    Export {
        /// Output file path (default: tasks.csv)
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Import tasks from CSV.
    Import {
        /// Input CSV file path
        input: String,
        /// Skip creating backup before import
        #[arg(long)]
        no_backup: bool,
    },

    /// Export dated tasks as an iCalendar file.
    Ics {
        /// Output file path (default: tasks.ics)
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Create a timestamped backup of the database.
    Backup,

    /// Run a pomodoro timer.
    Pomodoro {
        /// Number of work sessions.
        #[arg(long, default_value_t = 1)]
        cycles: u32,
        /// Work minutes (defaults to config).
        #[arg(long)]
        work: Option<u32>,
        /// Break minutes (defaults to config).
        #[arg(long = "break")]
        rest: Option<u32>,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    /// Whether the command can change tasks (and so the calendar export).
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Commands::Add { .. }
                | Commands::Update { .. }
                | Commands::Done { .. }
                | Commands::Move { .. }
                | Commands::Archive { .. }
                | Commands::Delete { .. }
                | Commands::Reorder { .. }
                | Commands::Import { .. }
        )
    }
}

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Add a checklist item.
    Add { task_id: u64, title: String },
    /// List a task's checklist.
    List { task_id: u64 },
    /// Tick an item.
    Check { id: u64 },
    /// Untick an item.
    Uncheck { id: u64 },
    /// Rename an item.
    Rename { id: u64, title: String },
    /// Remove an item.
    Remove { id: u64 },
}

fn parse_date_arg(flag: &str, value: &str) -> Result<NaiveDate> {
    parse_due_input(value, Local::now().date_naive()).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "unrecognised {flag} date '{value}'. Use YYYY-MM-DD, 'today', 'tomorrow', or 'in Nd'"
        ))
    })
}

/// Add a new task.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add<S: TaskStore>(
    svc: &mut TaskService<S>,
    title: String,
    desc: Option<String>,
    status: Status,
    priority: Priority,
    due: Option<String>,
    tags: Option<String>,
    repeat: Option<RecurrenceRule>,
    every: u32,
    until: Option<String>,
) -> Result<()> {
    let new = NewTask {
        title,
        description: desc.unwrap_or_default(),
        status,
        priority,
        due_date: due.as_deref().map(|d| parse_date_arg("--due", d)).transpose()?,
        tags: tags.unwrap_or_default().trim().to_string(),
        recurrence_rule: repeat,
        recurrence_interval: every,
        recurrence_end_date: until.as_deref().map(|d| parse_date_arg("--until", d)).transpose()?,
        sort_order: None,
    };
    if new.recurrence_rule.is_some() && new.due_date.is_none() {
        warn!("recurring task has no due date; it will not repeat until one is set");
    }
    let task = svc.create_task(new)?;
    println!("Added task {}", task.id);
    Ok(())
}

/// List tasks for a view.
pub fn cmd_list<S: TaskStore>(
    svc: &TaskService<S>,
    filter: FilterKey,
    search: Option<String>,
    on: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    let filters = TaskFilters {
        filter_key: filter,
        search,
        due_on: on.as_deref().map(|d| parse_date_arg("--on", d)).transpose()?,
    };
    let mut tasks = svc.list_tasks(&filters)?;
    if let Some(n) = limit {
        tasks.truncate(n);
    }
    print_table(&tasks);
    Ok(())
}

/// View detailed information about a specific task.
pub fn cmd_view<S: TaskStore>(svc: &TaskService<S>, id: u64) -> Result<()> {
    let task = svc.get_task(id)?.ok_or(Error::TaskNotFound(id))?;
    let today = Local::now().date_naive();
    let fmt_ts = |ts: Option<chrono::DateTime<Utc>>| ts.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".into());
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}", task.status.label());
    println!("Priority:     {}", task.priority.label());
    println!(
        "Due:          {}",
        match task.due_date {
            Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!("Tags:         {}", if task.tags.is_empty() { "-" } else { task.tags.as_str() });
    match task.recurrence_rule {
        Some(rule) => println!(
            "Repeats:      {} x{}{}",
            rule.as_str(),
            task.recurrence_interval,
            task.recurrence_end_date.map(|d| format!(" until {d}")).unwrap_or_default()
        ),
        None => println!("Repeats:      -"),
    }
    println!("Order:        {}", task.sort_order);
    println!("Created UTC:  {}", task.created_at.to_rfc3339());
    println!("Updated UTC:  {}", task.updated_at.to_rfc3339());
    println!("Completed:    {}", fmt_ts(task.completed_at));
    println!("Archived:     {}", fmt_ts(task.archived_at));
    println!("Description:\n{}\n", if task.description.is_empty() { "-" } else { task.description.as_str() });

    let subtasks = svc.list_subtasks(id)?;
    if !subtasks.is_empty() {
        print_subtasks(&subtasks);
    }
    Ok(())
}

/// Update an existing task's fields.
#[allow(clippy::too_many_arguments)]
pub fn cmd_update<S: TaskStore>(
    svc: &mut TaskService<S>,
    id: u64,
    title: Option<String>,
    desc: Option<String>,
    status: Option<Status>,
    priority: Option<Priority>,
    due: Option<String>,
    clear_due: bool,
    tags: Option<String>,
    repeat: Option<RecurrenceRule>,
    no_repeat: bool,
    every: Option<u32>,
    until: Option<String>,
    clear_until: bool,
) -> Result<()> {
    let mut changes = TaskChanges {
        title,
        description: desc,
        status,
        priority,
        tags: tags.map(|t| t.trim().to_string()),
        recurrence_interval: every,
        ..Default::default()
    };
    if clear_due {
        changes.due_date = Some(None);
    } else if let Some(d) = due {
        changes.due_date = Some(Some(parse_date_arg("--due", &d)?));
    }
    if no_repeat {
        changes.recurrence_rule = Some(None);
    } else if let Some(r) = repeat {
        changes.recurrence_rule = Some(Some(r));
    }
    if clear_until {
        changes.recurrence_end_date = Some(None);
    } else if let Some(d) = until {
        changes.recurrence_end_date = Some(Some(parse_date_arg("--until", &d)?));
    }
    if changes.is_empty() {
        return Err(Error::InvalidArgument("nothing to update".into()));
    }
    svc.update_task(id, changes)?.ok_or(Error::TaskNotFound(id))?;
    println!("Updated {id}");
    Ok(())
}

/// Mark done, or reopen an already-done task as in progress.
pub fn cmd_done<S: TaskStore>(svc: &mut TaskService<S>, id: u64) -> Result<()> {
    let task = svc.get_task(id)?.ok_or(Error::TaskNotFound(id))?;
    if task.status == Status::Done {
        svc.update_task(id, TaskChanges::status(Status::InProgress))?
            .ok_or(Error::TaskNotFound(id))?;
        println!("Reopened {id}");
        return Ok(());
    }
    let completion = svc.mark_done(id)?.ok_or(Error::TaskNotFound(id))?;
    println!("Marked {id} done.");
    if let Some(next) = completion.next {
        let due = next.due_date.map(|d| d.to_string()).unwrap_or_default();
        println!("Next occurrence: task {} due {due}", next.id);
    }
    Ok(())
}

pub fn cmd_move<S: TaskStore>(svc: &mut TaskService<S>, id: u64, status: Status) -> Result<()> {
    svc.update_task(id, TaskChanges::status(status))?
        .ok_or(Error::TaskNotFound(id))?;
    println!("Moved {id} to {}", status.label());
    Ok(())
}

pub fn cmd_archive<S: TaskStore>(svc: &mut TaskService<S>, id: u64) -> Result<()> {
    svc.archive_task(id)?.ok_or(Error::TaskNotFound(id))?;
    println!("Archived {id}");
    Ok(())
}

pub fn cmd_delete<S: TaskStore>(svc: &mut TaskService<S>, id: u64) -> Result<()> {
    svc.delete_task(id)?;
    println!("Deleted.");
    Ok(())
}

pub fn cmd_reorder<S: TaskStore>(svc: &mut TaskService<S>, ids: Vec<u64>) -> Result<()> {
    svc.reorder_tasks(&ids)?;
    println!("Reordered {} task(s).", ids.len());
    Ok(())
}

/// Print the board, one column per status.
pub fn cmd_board<S: TaskStore>(svc: &TaskService<S>) -> Result<()> {
    let today = Local::now().date_naive();
    for (status, tasks) in svc.board()? {
        println!("== {} ({}) ==", status.label(), tasks.len());
        for t in tasks {
            println!(
                "  #{:<4} {:<40} {:<9} {}",
                t.id,
                truncate(&t.title, 40),
                t.priority.label(),
                format_due_relative(t.due_date, today)
            );
        }
        println!();
    }
    Ok(())
}

pub fn cmd_stats<S: TaskStore>(svc: &TaskService<S>) -> Result<()> {
    let s = svc.stats()?;
    println!("Total:        {}", s.total);
    println!("In progress:  {}", s.in_progress);
    println!("Done:         {}", s.done);
    println!("Overdue:      {}", s.overdue);
    println!("Due today:    {}", s.due_today);
    Ok(())
}

pub fn cmd_reminders<S: TaskStore>(svc: &TaskService<S>, limit: usize) -> Result<()> {
    let reminders = svc.reminders()?;
    if reminders.is_empty() {
        println!("Nothing due.");
        return Ok(());
    }
    for t in reminders.iter().take(limit) {
        let due = t.due_date.map(|d| d.format("%d.%m.%Y").to_string()).unwrap_or_default();
        println!("- {} (due {}, {})", t.title, due, t.status.label());
    }
    if reminders.len() > limit {
        println!("... and {} more", reminders.len() - limit);
    }
    Ok(())
}

pub fn cmd_report<S: TaskStore>(svc: &TaskService<S>, weeks: u32) -> Result<()> {
    println!("{:<12} {:>8} {:>10}", "Week", "Created", "Completed");
    for w in svc.weekly_stats(weeks)? {
        println!("{:<12} {:>8} {:>10}", w.week_start, w.created, w.completed);
    }
    Ok(())
}

fn print_subtasks(subtasks: &[Subtask]) {
    let done = subtasks.iter().filter(|s| s.is_done).count();
    println!("Subtasks ({done}/{}):", subtasks.len());
    for s in subtasks {
        println!("  [{}] {} (#{})", if s.is_done { "x" } else { " " }, s.title, s.id);
    }
}

pub fn cmd_subtask<S: TaskStore>(svc: &mut TaskService<S>, action: SubtaskAction) -> Result<()> {
    let set = |title: Option<String>, is_done: Option<bool>| SubtaskChanges {
        title,
        is_done,
        ..Default::default()
    };
    match action {
        SubtaskAction::Add { task_id, title } => {
            let sub = svc.add_subtask(task_id, &title)?.ok_or(Error::TaskNotFound(task_id))?;
            println!("Added subtask {}", sub.id);
        }
        SubtaskAction::List { task_id } => {
            svc.get_task(task_id)?.ok_or(Error::TaskNotFound(task_id))?;
            print_subtasks(&svc.list_subtasks(task_id)?);
        }
        SubtaskAction::Check { id } => {
            svc.update_subtask(id, set(None, Some(true)))?.ok_or(Error::SubtaskNotFound(id))?;
        }
        SubtaskAction::Uncheck { id } => {
            svc.update_subtask(id, set(None, Some(false)))?.ok_or(Error::SubtaskNotFound(id))?;
        }
        SubtaskAction::Rename { id, title } => {
            svc.update_subtask(id, set(Some(title), None))?.ok_or(Error::SubtaskNotFound(id))?;
        }
        SubtaskAction::Remove { id } => {
            svc.delete_subtask(id)?;
            println!("Removed.");
        }
    }
    Ok(())
}

/// Export all tasks to CSV.
pub fn cmd_export<S: TaskStore>(svc: &TaskService<S>, output: Option<String>) -> Result<()> {
    let output_path = output.unwrap_or_else(|| "tasks.csv".to_string());
    let tasks = svc.list_tasks(&TaskFilters::default())?;
    fs::write(&output_path, exchange::tasks_to_csv(&tasks))?;
    println!("Exported {} task(s) to {}", tasks.len(), output_path);
    Ok(())
}

/// Import tasks from CSV, backing up the database first.
pub fn cmd_import(svc: &mut TaskService<Database>, input: String, no_backup: bool) -> Result<()> {
    let csv_content = fs::read_to_string(&input)?;
    let rows = exchange::tasks_from_csv(&csv_content)?;

    if !no_backup {
        if let Some(path) = svc.store().path().filter(|p| p.exists()) {
            let backup = create_backup(path)?;
            println!("Created backup: {}", backup.display());
        }
    }

    let mut created = 0;
    for row in rows {
        svc.create_task(row)?;
        created += 1;
    }
    info!(created, input = %input, "imported tasks");
    println!("Imported {created} task(s).");
    Ok(())
}

/// Export dated tasks as an iCalendar file.
pub fn cmd_ics<S: TaskStore>(svc: &TaskService<S>, output: Option<String>) -> Result<()> {
    let output_path = output.unwrap_or_else(|| "tasks.ics".to_string());
    write_ics(svc, Path::new(&output_path))?;
    println!("Calendar written to {output_path}");
    Ok(())
}

/// Rewrite the calendar file with every dated task.
pub fn write_ics<S: TaskStore>(svc: &TaskService<S>, path: &Path) -> Result<()> {
    let tasks = svc.list_tasks(&TaskFilters::default())?;
    fs::write(path, exchange::tasks_to_ics(&tasks, Utc::now()))?;
    Ok(())
}

/// Keep the configured calendar file in sync after a change.
pub fn auto_export_ics<S: TaskStore>(svc: &TaskService<S>, settings: &Settings) -> Result<()> {
    if let Some(path) = &settings.ics_export_path {
        write_ics(svc, path)?;
    }
    Ok(())
}

pub fn cmd_backup(db_path: &Path) -> Result<()> {
    let backup = create_backup(db_path)?;
    println!("Backup created: {}", backup.display());
    Ok(())
}

/// Count down each pomodoro session on the terminal.
pub fn cmd_pomodoro(settings: &Settings, cycles: u32, work: Option<u32>, rest: Option<u32>) -> Result<()> {
    let work = work.unwrap_or(settings.pomodoro_work_min);
    let rest = rest.unwrap_or(settings.pomodoro_break_min);
    if work == 0 || rest == 0 {
        return Err(Error::InvalidArgument("session minutes must be positive".into()));
    }
    let mut stdout = std::io::stdout();
    for session in pomodoro::schedule(work, rest, cycles) {
        let total = u64::from(session.minutes) * 60;
        for remaining in (1..=total).rev() {
            print!("\r{:<6} {}", session.phase, pomodoro::format_remaining(remaining));
            stdout.flush()?;
            thread::sleep(StdDuration::from_secs(1));
        }
        println!("\r{:<6} done! ", session.phase);
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
