// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Each variant corresponds to one failure kind a caller can act on.
//! Runtime failures of the external tool and cancellations are *not*
//! errors: they are terminal task states (see [`crate::engine::TaskState`]).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LauncherError {
    /// Directory or file access failed.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The external tool could not be started.
    #[error("Launch error: {0}")]
    LaunchError(String),

    /// A task request references unknown or invalid resources.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// An execution for this task identity is already registered.
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Operation on an unknown task identity.
    #[error("Task not found: {0}")]
    NotFoundError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LauncherError {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LauncherError::IoError(_) => "io",
            LauncherError::LaunchError(_) => "launch",
            LauncherError::ValidationError(_) => "validation",
            LauncherError::ConflictError(_) => "conflict",
            LauncherError::NotFoundError(_) => "not_found",
            LauncherError::ConfigError(_) => "config",
            LauncherError::TomlError(_) | LauncherError::TomlSerError(_) => "toml",
            LauncherError::Other(_) => "other",
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LauncherError>;
