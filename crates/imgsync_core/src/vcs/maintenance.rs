//! Repository maintenance: bootstrap, cleanup, unlock and readiness checks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::models::RemoteIdentity;

use super::command::VcsCommand;
use super::error::{VcsError, VcsResult};
use super::recovery::{index_lock_path, RecoveryAction, RepoState, METADATA_DIR};
use super::session::VcsSession;

/// Name of the ignore-list file written at the repository root.
pub const IGNORE_FILE: &str = ".gitignore";

/// Commit message used by [`clean`].
pub const CLEAN_COMMIT_MESSAGE: &str = "Clean folders";

/// Readiness of a working tree for upload jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryStatus {
    pub root: PathBuf,
    pub root_exists: bool,
    /// The root holds a version-control metadata directory.
    pub initialized: bool,
    pub state: RepoState,
}

impl RepositoryStatus {
    pub fn check(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            root_exists: root.is_dir(),
            initialized: root.join(METADATA_DIR).is_dir(),
            state: RepoState::inspect(root),
        }
    }

    /// Whether an upload job may start.
    pub fn is_ready(&self) -> bool {
        self.root_exists && self.initialized
    }

    /// One-line description for status output.
    pub fn summary(&self) -> String {
        if !self.root_exists {
            return format!("{} does not exist", self.root.display());
        }
        if !self.initialized {
            return format!(
                "{} is not a repository (run `imgsync init`)",
                self.root.display()
            );
        }
        if self.state.is_clean() {
            format!("{} is ready", self.root.display())
        } else {
            format!(
                "{} is ready, interrupted state will be repaired (lock: {}, rebase: {}, merge: {})",
                self.root.display(),
                self.state.index_lock,
                self.state.rebase_in_progress,
                self.state.merge_in_progress
            )
        }
    }
}

/// Parameters for [`bootstrap`].
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Credential-free remote URL.
    pub remote_url: String,
    pub branch: String,
    pub user_name: String,
    pub user_email: String,
    pub ignore_patterns: Vec<String>,
}

impl BootstrapOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let remote = RemoteIdentity::new(
            &settings.remote.account,
            &settings.remote.repository,
            &settings.remote.branch,
        );
        Self {
            remote_url: remote.remote_url(&settings.remote.host),
            branch: remote.branch,
            user_name: settings.identity.user_name.clone(),
            user_email: settings.identity.user_email.clone(),
            ignore_patterns: settings.upload.ignore_patterns.clone(),
        }
    }
}

/// Write the ignore-list file, one pattern per line.
pub fn write_ignore_file(root: &Path, patterns: &[String]) -> io::Result<PathBuf> {
    let path = root.join(IGNORE_FILE);
    let mut content = patterns.join("\n");
    content.push('\n');
    fs::write(&path, content)?;
    Ok(path)
}

/// Prepare the working tree: init, identity, ignore list, remote and branch.
///
/// Safe to repeat on an existing repository.
pub fn bootstrap(session: &mut VcsSession, options: &BootstrapOptions) -> VcsResult<()> {
    let root = session.root().to_path_buf();
    session.logger().phase("Bootstrap");

    fs::create_dir_all(&root)
        .map_err(|e| VcsError::io(format!("creating {}", root.display()), e))?;

    if root.join(METADATA_DIR).is_dir() {
        session.logger().info("Repository already initialized");
    } else {
        session.run(&VcsCommand::Init)?;
    }

    if !options.user_email.is_empty() {
        session.run(&VcsCommand::config("user.email", &options.user_email))?;
    }
    if !options.user_name.is_empty() {
        session.run(&VcsCommand::config("user.name", &options.user_name))?;
    }

    let ignore = write_ignore_file(&root, &options.ignore_patterns)
        .map_err(|e| VcsError::io(format!("writing {}", IGNORE_FILE), e))?;
    session
        .logger()
        .info(&format!("Wrote {}", ignore.display()));

    session.run_allow_failure(&VcsCommand::RemoteRemove)?;
    session.run(&VcsCommand::RemoteAdd {
        url: options.remote_url.clone(),
    })?;

    session.run_allow_failure(&VcsCommand::CheckoutNewBranch {
        branch: options.branch.clone(),
    })?;
    session.run(&VcsCommand::BranchRename {
        branch: options.branch.clone(),
    })?;

    session.logger().success("Repository ready");
    Ok(())
}

/// Commit everything, then remove untracked files except `excludes`.
pub fn clean(session: &mut VcsSession, excludes: &[String]) -> VcsResult<()> {
    session.logger().phase("Clean");
    session.run(&VcsCommand::AddAll)?;
    session.run(&VcsCommand::Commit {
        message: CLEAN_COMMIT_MESSAGE.to_string(),
        allow_empty: true,
    })?;
    session.run(&VcsCommand::Clean {
        excludes: excludes.to_vec(),
    })?;
    session.logger().success("Working tree cleaned");
    Ok(())
}

/// Remove a stale index lock and reset the staging area.
///
/// Returns the repairs performed.
pub fn unlock(session: &mut VcsSession) -> VcsResult<Vec<RecoveryAction>> {
    session.logger().phase("Unlock");
    let mut actions = Vec::new();

    let lock = index_lock_path(session.root());
    match fs::remove_file(&lock) {
        Ok(()) => {
            session.record_recovery(RecoveryAction::RemovedIndexLock);
            actions.push(RecoveryAction::RemovedIndexLock);
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            session.logger().info("No index lock present");
        }
        Err(source) => return Err(VcsError::Recovery { path: lock, source }),
    }

    session.run(&VcsCommand::Reset)?;
    session.record_recovery(RecoveryAction::ResetIndex);
    actions.push(RecoveryAction::ResetIndex);

    Ok(actions)
}
