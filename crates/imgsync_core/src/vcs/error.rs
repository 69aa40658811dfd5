//! Errors from version-control operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::credentials::CredentialError;

/// Error raised by a `VcsSession` or a maintenance operation.
#[derive(Error, Debug)]
pub enum VcsError {
    /// The tool could not be launched at all.
    #[error("Failed to launch '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The tool ran and reported failure.
    #[error("'{command}' failed with exit code {exit_code}:\n{output}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    /// A repair of interrupted repository state failed.
    #[error("Recovery failed for '{}': {source}", .path.display())]
    Recovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Credential unavailable: {0}")]
    Credential(#[from] CredentialError),

    /// File I/O performed alongside the tool (e.g. writing the ignore list).
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl VcsError {
    pub fn command_failed(
        command: impl Into<String>,
        exit_code: i32,
        output: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            exit_code,
            output: output.into(),
        }
    }

    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for version-control operations.
pub type VcsResult<T> = Result<T, VcsError>;
