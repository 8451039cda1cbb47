#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use chrono::NaiveDate;
use tempfile::TempDir;

use taskforge::db::Database;
use taskforge::fields::RecurrenceRule;
use taskforge::service::TaskService;
use taskforge::task::NewTask;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn service() -> TaskService<Database> {
    TaskService::new(Database::in_memory())
}

pub fn recurring(title: &str, due: NaiveDate, rule: RecurrenceRule, every: u32) -> NewTask {
    NewTask {
        due_date: Some(due),
        recurrence_rule: Some(rule),
        recurrence_interval: every,
        ..NewTask::new(title)
    }
}

/// An isolated data dir for running the `tf` binary.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(TestHome { dir: tempfile::tempdir()? })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("tasks.json")
    }

    pub fn tf(&self) -> Command {
        let mut cmd = Command::cargo_bin("tf").expect("binary");
        cmd.current_dir(self.path())
            .env("TASKFORGE_HOME", self.path())
            .env_remove("TASKFORGE_DB")
            .env_remove("TASKFORGE_ICS_EXPORT")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn load(&self) -> Database {
        Database::load(&self.db_path()).expect("load db")
    }
}
