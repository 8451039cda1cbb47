use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Personal task manager with recurring tasks, a kanban board and CSV/ICS exchange.
/// Storage defaults to ~/.taskforge/tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tf", version, about = "Personal task manager")]
pub struct Cli {
    /// Path to the JSON database file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
