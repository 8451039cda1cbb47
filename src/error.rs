//! Error types for taskforge
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (unknown id, empty title, bad arguments or config)
//! - 4: Operation failed (storage could not read or write)

use thiserror::Error;

/// Exit codes for the `tf` binary
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Task {0} not found")]
    TaskNotFound(u64),

    #[error("Subtask {0} not found")]
    SubtaskNotFound(u64),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Storage / operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::TaskNotFound(_)
            | Error::SubtaskNotFound(_)
            | Error::Validation(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            Error::Io(_) | Error::Json(_) | Error::TomlParse(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
