//! Error types for DeployKit

use thiserror::Error;

/// DeployKit error types
#[derive(Error, Debug)]
pub enum DeployError {
    /// Configuration file errors (missing file, missing key, type mismatch)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration value present but empty
    #[error("Configuration value 'deploy.{key}' must not be empty")]
    EmptyConfigValue { key: &'static str },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SSH transport errors (connect, handshake, auth, channel)
    #[error("SSH error on {host}: {message}")]
    Ssh { host: String, message: String },

    /// Remote command exited non-zero; aborts the current task invocation
    #[error("Remote command failed with exit code {exit_code}: {command}")]
    CommandFailed { command: String, exit_code: i32 },

    /// Command validation errors
    #[error("Command exceeds {limit} bytes")]
    CommandTooLong { limit: usize },

    /// Generic validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using DeployError
pub type Result<T> = std::result::Result<T, DeployError>;
