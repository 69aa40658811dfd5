//! Core types for the sync orchestrator.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{EmptyFolderPolicy, ManifestSettings, Settings};
use crate::logging::LogConfig;
use crate::vcs::RecoveryReport;

/// Runtime configuration of one orchestrator.
///
/// Built from [`Settings`] by the frontend; the orchestrator never reads
/// configuration files itself.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Maximum images per commit/push cycle.
    pub batch_size: usize,
    /// Maximum paths per `add` invocation.
    pub add_chunk_size: usize,
    pub empty_folder_policy: EmptyFolderPolicy,
    /// Repair interrupted repository state before each command.
    pub auto_recover: bool,
    /// Version-control executable.
    pub vcs_program: String,
    /// Manifest naming, headers, CDN host and branch pinning.
    pub manifest: ManifestSettings,
    /// Directory for per-job log files. `None` logs to the listener only.
    pub logs_folder: Option<PathBuf>,
    pub log: LogConfig,
}

impl SyncSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            batch_size: settings.upload.batch_size,
            add_chunk_size: settings.upload.add_chunk_size,
            empty_folder_policy: settings.upload.empty_folder_policy,
            auto_recover: settings.upload.auto_recover,
            vcs_program: settings.upload.vcs_program.clone(),
            manifest: settings.manifest.clone(),
            logs_folder: Some(PathBuf::from(&settings.paths.logs_folder)),
            log: LogConfig::from_settings(&settings.logging),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        let mut settings = Self::from_settings(&Settings::default());
        settings.logs_folder = None;
        settings
    }
}

/// Where a job currently is in its per-folder protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    /// Validation and repository preparation.
    Preparing,
    Staging {
        folder: String,
    },
    Batching {
        folder: String,
    },
    Committing {
        folder: String,
        batch: usize,
        of: usize,
    },
    Pulling {
        folder: String,
        batch: usize,
        of: usize,
    },
    Pushing {
        folder: String,
        batch: usize,
        of: usize,
    },
    ManifestWriting {
        folder: String,
    },
    Done,
    Failed,
    Cancelled,
}

impl SyncPhase {
    /// Whether the job has stopped.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncPhase::Done | SyncPhase::Failed | SyncPhase::Cancelled
        )
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Idle => write!(f, "Idle"),
            SyncPhase::Preparing => write!(f, "Preparing"),
            SyncPhase::Staging { folder } => write!(f, "Staging {}", folder),
            SyncPhase::Batching { folder } => write!(f, "Batching {}", folder),
            SyncPhase::Committing { folder, batch, of } => {
                write!(f, "Committing {} {}/{}", folder, batch, of)
            }
            SyncPhase::Pulling { folder, batch, of } => {
                write!(f, "Pulling {} {}/{}", folder, batch, of)
            }
            SyncPhase::Pushing { folder, batch, of } => {
                write!(f, "Pushing {} {}/{}", folder, batch, of)
            }
            SyncPhase::ManifestWriting { folder } => write!(f, "Writing manifest for {}", folder),
            SyncPhase::Done => write!(f, "Done"),
            SyncPhase::Failed => write!(f, "Failed"),
            SyncPhase::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Final status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Done,
    Failed,
    Cancelled,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Done => write!(f, "done"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Outcome for one queued folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderStatus {
    /// Not reached (job stopped earlier).
    Pending,
    /// All batches pushed and manifest written.
    Published,
    /// Contained no images.
    Skipped,
    Failed,
}

/// Per-folder section of a [`SyncReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderReport {
    /// Folder name inside the working tree.
    pub folder: String,
    /// Queued source path.
    pub source: PathBuf,
    pub status: FolderStatus,
    /// Images discovered in the destination.
    pub images: usize,
    pub batches_total: usize,
    pub batches_pushed: usize,
    /// Written manifest file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FolderReport {
    pub fn pending(folder: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            source: source.into(),
            status: FolderStatus::Pending,
            images: 0,
            batches_total: 0,
            batches_pushed: 0,
            manifest: None,
            message: None,
        }
    }
}

/// Result of one job, delivered to `on_finished` and persisted by the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub job_id: String,
    pub status: JobStatus,
    pub started_at: String,
    pub finished_at: String,
    pub folders: Vec<FolderReport>,
    /// Human-readable outcome. On failure names the step and includes tool output.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    /// Repairs performed on the working tree during the job.
    #[serde(default)]
    pub recovery: RecoveryReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Done
    }

    /// Folder report by name.
    pub fn folder(&self, name: &str) -> Option<&FolderReport> {
        self.folders.iter().find(|f| f.folder == name)
    }

    /// Multi-line summary for terminal output.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Job {}: {}", self.job_id, self.status)];
        for folder in &self.folders {
            let mut line = format!(
                "  {:<24} {:?}  {} images, {}/{} batches",
                folder.folder,
                folder.status,
                folder.images,
                folder.batches_pushed,
                folder.batches_total
            );
            if let Some(ref manifest) = folder.manifest {
                line.push_str(&format!("  -> {}", manifest.display()));
            }
            lines.push(line);
        }
        if !self.recovery.is_empty() {
            lines.push(format!(
                "  {} recovery action(s) performed",
                self.recovery.actions.len()
            ));
        }
        lines.push(self.message.clone());
        lines.join("\n")
    }
}
