//! Error types for analyzer invocation and settings resolution

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type for analyzer invocations
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Failure while running the external analyzer.
///
/// Every variant is an invocation failure from the caller's point of view;
/// the split only exists so the message shown to the user says what broke.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Failed to start analyzer {path}: {source}")]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to send document to analyzer: {0}")]
    Stdin(std::io::Error),

    #[error("Failed to wait for analyzer: {0}")]
    Wait(std::io::Error),

    #[error("Analyzer exited with {status}: {stderr}")]
    Exit { status: ExitStatus, stderr: String },

    #[error("Analyzer output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Analyzer output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Analyzer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AnalyzerError {
    /// Create a spawn error with the analyzer path attached
    pub fn spawn(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Spawn {
            path: path.into(),
            source,
        }
    }

    /// Create an exit error from a failed process, keeping its stderr
    pub fn exit(status: ExitStatus, stderr: &[u8]) -> Self {
        Self::Exit {
            status,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}

/// Failure while resolving settings for a document.
///
/// Cloneable because a single pending query is shared by every caller
/// resolving the same URI.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Configuration request failed: {0}")]
    Query(String),

    #[error("Invalid wisl settings: {0}")]
    Invalid(String),
}
