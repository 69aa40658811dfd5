//! Error types for the sync orchestrator.
//!
//! Errors carry context that chains through layers:
//! Job → Folder/Step → Operation → Detail

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::batching::PlanError;
use crate::manifest::ManifestError;
use crate::staging::StageError;
use crate::vcs::VcsError;

/// Top-level job error with folder context.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A step failed while processing one folder.
    #[error("Folder '{folder}' failed at step '{step}': {source}")]
    FolderFailed {
        folder: String,
        step: String,
        #[source]
        source: StepError,
    },

    /// Repository preparation failed before any folder was processed.
    #[error("Job setup failed at step '{step}': {source}")]
    SetupFailed {
        step: String,
        #[source]
        source: StepError,
    },

    /// The job cannot start.
    #[error("Job '{job_id}' failed validation: {message}")]
    ValidationFailed { job_id: String, message: String },

    /// The job was cancelled cooperatively.
    #[error("Job '{job_id}' was cancelled before {point}")]
    Cancelled { job_id: String, point: String },
}

impl SyncError {
    pub fn folder_failed(
        folder: impl Into<String>,
        step: impl Into<String>,
        source: impl Into<StepError>,
    ) -> Self {
        Self::FolderFailed {
            folder: folder.into(),
            step: step.into(),
            source: source.into(),
        }
    }

    pub fn setup_failed(step: impl Into<String>, source: impl Into<StepError>) -> Self {
        Self::SetupFailed {
            step: step.into(),
            source: source.into(),
        }
    }

    pub fn validation_failed(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            job_id: job_id.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(job_id: impl Into<String>, point: impl Into<String>) -> Self {
        Self::Cancelled {
            job_id: job_id.into(),
            point: point.into(),
        }
    }

    /// Name of the failing step, if the error is tied to one.
    pub fn step(&self) -> Option<&str> {
        match self {
            SyncError::FolderFailed { step, .. } | SyncError::SetupFailed { step, .. } => {
                Some(step.as_str())
            }
            SyncError::ValidationFailed { .. } => Some("validation"),
            SyncError::Cancelled { .. } => None,
        }
    }

    /// Folder the error occurred in, if any.
    pub fn folder(&self) -> Option<&str> {
        match self {
            SyncError::FolderFailed { folder, .. } => Some(folder.as_str()),
            _ => None,
        }
    }
}

/// Error from a single step of a folder's protocol.
#[derive(Error, Debug)]
pub enum StepError {
    /// Copying into the working tree failed.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Batch planning failed (including a folder without images).
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// A version-control command failed or could not be launched.
    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// Manifest generation failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// File I/O outside the stager.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The queued path has no usable folder name (e.g. a filesystem root).
    #[error("Cannot derive a folder name from '{}'", .0.display())]
    InvalidFolder(PathBuf),
}

impl StepError {
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Raw tool output when the step failed on a version-control command.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            StepError::Vcs(VcsError::CommandFailed { output, .. }) => Some(output.as_str()),
            _ => None,
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for job operations.
pub type SyncResult<T> = Result<T, SyncError>;
