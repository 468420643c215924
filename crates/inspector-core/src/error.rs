//! Core error types for inspector-core

use thiserror::Error;

/// Errors that can occur while preparing or running an inspection
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// A row for this host was already recorded in this run
    #[error("host already recorded: {0}")]
    HostAlreadyRecorded(String),

    /// Aggregator actor communication error
    #[error("aggregator error: {0}")]
    Aggregator(String),

    /// `run` was given without a command
    #[error("no command given")]
    NoCommandGiven,

    /// First word is neither `run` nor a configured alias
    #[error("invalid parameter, no such command or alias: {0}")]
    UnknownCommand(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
}
