//! Error types for rawdroid
//!
//! Centralized error handling using thiserror.

use std::process::ExitStatus;

use thiserror::Error;

/// Errors shared by every pipeline stage
#[derive(Error, Debug)]
pub enum RawdroidError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed with {status}")]
    ToolFailed { tool: String, status: ExitStatus },
}

/// Result type alias for rawdroid operations
pub type Result<T> = std::result::Result<T, RawdroidError>;

impl RawdroidError {
    /// Name of the external tool responsible for this error, if any
    pub fn tool(&self) -> Option<&str> {
        match self {
            RawdroidError::Spawn { tool, .. } | RawdroidError::ToolFailed { tool, .. } => {
                Some(tool)
            }
            _ => None,
        }
    }

    /// Exit code the CLI should terminate with
    pub fn exit_code(&self) -> i32 {
        match self {
            RawdroidError::ToolFailed { status, .. } => status.code().unwrap_or(1),
            _ => 1,
        }
    }
}
