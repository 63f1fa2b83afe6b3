//! # Application Errors
//!
//! Failures of the binary itself. Core failures are wrapped unchanged so the
//! CLI prints the same message the API would return.

use moodlog_core::MoodError;
use thiserror::Error;

/// Errors raised by the CLI, configuration loading and server startup.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Mood(#[from] MoodError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
