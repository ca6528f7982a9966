//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Argon Process Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Argon not found. Install it from https://argon.wiki or set argon.custom_path.")]
    ArgonNotFound,

    #[error("Failed to spawn process: {reason}")]
    ProcessSpawn { reason: String },

    /// The process closed without a success code. `message` is the aggregated
    /// stderr text or the first meaningful output line.
    #[error("{message}")]
    ProcessFailed { message: String, code: Option<i32> },

    /// Argon reported readiness but the line did not have the expected shape.
    #[error("Unexpected Argon output: {message}")]
    OutputContract { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration / State Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("State store error: {message}")]
    StateStore { message: String },

    // ─────────────────────────────────────────────────────────────
    // Workspace Errors
    // ─────────────────────────────────────────────────────────────
    #[error("No workspace folder open! Please open one before running this command again")]
    NoWorkspace,

    #[error("No project found: {path}")]
    NoProject { path: PathBuf },

    #[error("Invalid command: {message}")]
    InvalidCommand { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn process_spawn(reason: impl Into<String>) -> Self {
        Self::ProcessSpawn {
            reason: reason.into(),
        }
    }

    pub fn process_failed(message: impl Into<String>, code: Option<i32>) -> Self {
        Self::ProcessFailed {
            message: message.into(),
            code,
        }
    }

    pub fn output_contract(message: impl Into<String>) -> Self {
        Self::OutputContract {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn state_store(message: impl Into<String>) -> Self {
        Self::StateStore {
            message: message.into(),
        }
    }

    pub fn no_project(path: impl Into<PathBuf>) -> Self {
        Self::NoProject { path: path.into() }
    }

    pub fn invalid_command(message: impl Into<String>) -> Self {
        Self::InvalidCommand {
            message: message.into(),
        }
    }

    /// Exit code half of the `(message, exit code)` pair a failed Argon call
    /// produces. Spawn failures and early exits without a code yield `None`.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::ProcessFailed { code, .. } => *code,
            _ => None,
        }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ProcessFailed { .. }
                | Error::OutputContract { .. }
                | Error::StateStore { .. }
                | Error::InvalidCommand { .. }
                | Error::NoProject { .. }
        )
    }

    /// Check if this error should trigger application exit
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ArgonNotFound | Error::NoWorkspace)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
