use std::io;
use thiserror::Error;

use crate::config::settings::ConfigError;
use crate::transport::TransportError;

/// Errors that can occur while running git
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to execute {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },

    #[error("git {args} failed ({status}): {stderr}")]
    CommandFailed {
        args: String,
        status: String,
        stderr: String,
    },

    #[error("git {args} timed out after {seconds}s")]
    Timeout { args: String, seconds: u64 },

    #[error("Failed to parse git output: {0}")]
    ParseError(String),

    #[error("Git version {0} is too old. Minimum required: 2.20")]
    GitVersionTooOld(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Top-level application error that wraps all module-specific errors
///
/// All module errors automatically convert to AppError via the `From` trait.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
