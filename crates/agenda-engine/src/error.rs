//! Error types for agenda-engine operations.
//!
//! Only structural problems are errors. Degraded-but-recoverable conditions
//! (an unrecognized repeat rule, an unusable AI ordering) are reported through
//! status values and logs instead; see [`crate::schedule::ScheduleStatus`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid reminder offset: {0}")]
    InvalidReminder(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Holiday table error: {0}")]
    Holiday(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
