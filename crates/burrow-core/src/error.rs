//! Error types for burrow core
//!
//! Provides a unified error type for registry, config and session operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for burrow core operations
pub type Result<T> = std::result::Result<T, BurrowError>;

/// Unified error type for burrow core
#[derive(Error, Debug)]
pub enum BurrowError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tool settings could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown workspace, missing path or missing archive
    #[error("Not found: {0}")]
    NotFound(String),

    /// Name or destination already taken
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Workspace name that cannot be stored in the registry
    #[error("Invalid workspace name '{0}'")]
    InvalidName(String),

    /// `config` key outside the known field set
    #[error("Unknown key: {0}")]
    UnknownKey(String),

    /// Operation has no command configured and nothing could be detected
    #[error("No {operation} command configured for '{workspace}'")]
    Unconfigured {
        operation: &'static str,
        workspace: String,
        hint: String,
    },

    /// An external program exited unsuccessfully
    #[error("{program} exited with status {code}")]
    Delegate { program: String, code: i32 },

    /// Process duplication failed
    #[error("Failed to fork session process: {0}")]
    Fork(String),

    /// The interactive interpreter could not be started
    #[error("Failed to start interpreter {}: {source}", path.display())]
    Interpreter {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BurrowError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        BurrowError::Config(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        BurrowError::NotFound(msg.into())
    }

    /// Create an already exists error
    pub fn already_exists(msg: impl Into<String>) -> Self {
        BurrowError::AlreadyExists(msg.into())
    }

    /// Create an unconfigured-operation error with the `burrow config` fix
    pub fn unconfigured(operation: &'static str, workspace: &str, key: &str) -> Self {
        BurrowError::Unconfigured {
            operation,
            workspace: workspace.to_string(),
            hint: format!("burrow config {} {} \"your command\"", workspace, key),
        }
    }

    /// Remediation hint for the user, if the error carries one
    pub fn hint(&self) -> Option<&str> {
        match self {
            BurrowError::Unconfigured { hint, .. } => Some(hint),
            _ => None,
        }
    }

    /// Process exit code this error maps to
    ///
    /// Delegate failures propagate the delegate's own status; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            BurrowError::Delegate { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

impl From<toml::de::Error> for BurrowError {
    fn from(err: toml::de::Error) -> Self {
        BurrowError::Config(err.to_string())
    }
}

impl From<walkdir::Error> for BurrowError {
    fn from(err: walkdir::Error) -> Self {
        match err.into_io_error() {
            Some(io) => BurrowError::Io(io),
            None => BurrowError::Io(std::io::Error::other("filesystem loop detected")),
        }
    }
}
