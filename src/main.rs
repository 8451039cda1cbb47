use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taskforge::cli::Cli;
use taskforge::cmd::*;
use taskforge::config::{self, Settings};
use taskforge::db::Database;
use taskforge::error::Result;
use taskforge::service::TaskService;

fn main() {
    let cli = Cli::parse();

    // Completions need neither config nor database.
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    let settings = match Settings::load(&config::data_dir()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };
    init_tracing(&settings.log_level);

    if let Err(e) = run(cli, settings) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

/// Tracing goes to stderr. `RUST_LOG` wins over the configured level when it parses.
fn init_tracing(default_level: &str) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .or_else(|| EnvFilter::try_new(default_level).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli, settings: Settings) -> Result<()> {
    let db_path = cli.db.unwrap_or_else(|| settings.database_path.clone());
    let mutating = cli.command.is_mutating();
    let mut svc = TaskService::new(Database::load(&db_path)?);

    match cli.command {
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Add {
            title,
            desc,
            status,
            priority,
            due,
            tags,
            repeat,
            every,
            until,
        } => cmd_add(
            &mut svc, title, desc, status, priority, due, tags, repeat, every, until,
        )?,
        Commands::List {
            filter,
            search,
            on,
            limit,
        } => cmd_list(&svc, filter, search, on, limit)?,
        Commands::View { id } => cmd_view(&svc, id)?,
        Commands::Update {
            id,
            title,
            desc,
            status,
            priority,
            due,
            clear_due,
            tags,
            repeat,
            no_repeat,
            every,
            until,
            clear_until,
        } => cmd_update(
            &mut svc,
            id,
            title,
            desc,
            status,
            priority,
            due,
            clear_due,
            tags,
            repeat,
            no_repeat,
            every,
            until,
            clear_until,
        )?,
        Commands::Done { id } => cmd_done(&mut svc, id)?,
        Commands::Move { id, status } => cmd_move(&mut svc, id, status)?,
        Commands::Archive { id } => cmd_archive(&mut svc, id)?,
        Commands::Delete { id } => cmd_delete(&mut svc, id)?,
        Commands::Reorder { ids } => cmd_reorder(&mut svc, ids)?,
        Commands::Board => cmd_board(&svc)?,
        Commands::Stats => cmd_stats(&svc)?,
        Commands::Reminders => cmd_reminders(&svc, settings.reminder_limit)?,
        Commands::Report { weeks } => cmd_report(&svc, weeks)?,
        Commands::Subtask { action } => cmd_subtask(&mut svc, action)?,
        Commands::Export { output } => cmd_export(&svc, output)?,
        Commands::Import { input, no_backup } => cmd_import(&mut svc, input, no_backup)?,
        Commands::Ics { output } => cmd_ics(&svc, output)?,
        Commands::Backup => cmd_backup(&db_path)?,
        Commands::Pomodoro { cycles, work, rest } => {
            cmd_pomodoro(&settings, cycles, work, rest)?
        }
    }

    if mutating {
        auto_export_ics(&svc, &settings)?;
    }
    Ok(())
}
