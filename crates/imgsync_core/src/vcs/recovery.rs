//! Detection of interrupted repository state.
//!
//! A run killed mid-command can leave a lock file or a half-finished
//! rebase/merge behind. Detection is done by looking at marker files in the
//! metadata directory, so repair commands only run when something is wrong.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Metadata directory name inside the working tree.
pub const METADATA_DIR: &str = ".git";

/// Markers found in the metadata directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoState {
    pub index_lock: bool,
    pub rebase_in_progress: bool,
    pub merge_in_progress: bool,
}

impl RepoState {
    /// Inspect the metadata directory of the working tree at `root`.
    ///
    /// A missing metadata directory reports a clean state.
    pub fn inspect(root: &Path) -> Self {
        let meta = root.join(METADATA_DIR);
        if !meta.is_dir() {
            return Self::default();
        }

        Self {
            index_lock: meta.join("index.lock").exists(),
            rebase_in_progress: meta.join("rebase-merge").exists()
                || meta.join("rebase-apply").exists(),
            merge_in_progress: meta.join("MERGE_HEAD").exists(),
        }
    }

    pub fn is_clean(&self) -> bool {
        !(self.index_lock || self.rebase_in_progress || self.merge_in_progress)
    }
}

/// Path of the index lock file for the working tree at `root`.
pub fn index_lock_path(root: &Path) -> PathBuf {
    root.join(METADATA_DIR).join("index.lock")
}

/// One repair performed on the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryAction {
    RemovedIndexLock,
    AbortedRebase,
    AbortedMerge,
    ResetIndex,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RecoveryAction::RemovedIndexLock => "removed stale index.lock",
            RecoveryAction::AbortedRebase => "aborted interrupted rebase",
            RecoveryAction::AbortedMerge => "aborted interrupted merge",
            RecoveryAction::ResetIndex => "reset staging area",
        };
        f.write_str(text)
    }
}

/// Repairs performed during a job, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub actions: Vec<RecoveryAction>,
}

impl RecoveryReport {
    pub fn record(&mut self, action: RecoveryAction) {
        self.actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn count(&self, action: RecoveryAction) -> usize {
        self.actions.iter().filter(|a| **a == action).count()
    }
}
