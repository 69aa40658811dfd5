//! Upload job and remote identity models.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identity of the remote repository files are published to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIdentity {
    /// Account (user or organization) owning the repository.
    pub account: String,
    /// Repository name.
    pub repository: String,
    /// Branch commits are pushed to.
    pub branch: String,
}

impl RemoteIdentity {
    pub fn new(
        account: impl Into<String>,
        repository: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            repository: repository.into(),
            branch: branch.into(),
        }
    }

    /// Credential-free HTTPS clone URL on the given host.
    pub fn remote_url(&self, host: &str) -> String {
        format!("https://{}/{}/{}.git", host, self.account, self.repository)
    }
}

/// Result of adding a folder to a job's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    /// Folder was appended to the queue.
    Added,
    /// Folder was already queued; the queue is unchanged.
    Duplicate,
    /// Path does not name an existing directory.
    NotADirectory,
}

/// One user-submitted request to publish a set of folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadJob {
    /// Unique job identifier.
    pub id: String,
    /// Folders to publish, in submission order.
    source_folders: Vec<PathBuf>,
    /// Local working tree of the remote repository.
    pub repository_root: PathBuf,
    /// Where the working tree is pushed.
    pub remote: RemoteIdentity,
}

impl UploadJob {
    /// Create an empty job for the given working tree and remote.
    pub fn new(repository_root: impl Into<PathBuf>, remote: RemoteIdentity) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_folders: Vec::new(),
            repository_root: repository_root.into(),
            remote,
        }
    }

    /// Queue a folder. Duplicates (by normalized path) are dropped silently.
    pub fn add_folder(&mut self, path: impl AsRef<Path>) -> QueueOutcome {
        let path = path.as_ref();
        if !path.is_dir() {
            return QueueOutcome::NotADirectory;
        }

        let normalized = normalize(path);
        if self
            .source_folders
            .iter()
            .any(|existing| normalize(existing) == normalized)
        {
            return QueueOutcome::Duplicate;
        }

        self.source_folders.push(path.to_path_buf());
        QueueOutcome::Added
    }

    /// Queued folders in submission order.
    pub fn source_folders(&self) -> &[PathBuf] {
        &self.source_folders
    }

    /// Whether no folders are queued.
    pub fn is_empty(&self) -> bool {
        self.source_folders.is_empty()
    }

    /// Drop every queued folder.
    pub fn clear(&mut self) {
        self.source_folders.clear();
    }

    /// Destination of a source folder inside the working tree.
    ///
    /// Returns `None` when the source path has no final component (e.g. `/` or `..`).
    pub fn destination_for(&self, source: &Path) -> Option<PathBuf> {
        folder_name(source).map(|name| self.repository_root.join(name))
    }
}

/// Base name of a folder, ignoring trailing separators.
pub(crate) fn folder_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}

/// Normalize a path for duplicate detection (drops `.` components and trailing separators).
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn remote() -> RemoteIdentity {
        RemoteIdentity::new("acct", "repo", "main")
    }

    #[test]
    fn remote_url_has_no_credentials() {
        assert_eq!(
            remote().remote_url("github.com"),
            "https://github.com/acct/repo.git"
        );
    }

    #[test]
    fn duplicate_folders_are_rejected() {
        let dir = tempdir().unwrap();
        let cats = dir.path().join("cats");
        std::fs::create_dir(&cats).unwrap();

        let mut job = UploadJob::new(dir.path().join("repo"), remote());
        assert_eq!(job.add_folder(&cats), QueueOutcome::Added);
        assert_eq!(job.add_folder(&cats), QueueOutcome::Duplicate);

        let with_slash = PathBuf::from(format!("{}/", cats.display()));
        assert_eq!(job.add_folder(&with_slash), QueueOutcome::Duplicate);
        assert_eq!(job.source_folders().len(), 1);
    }

    #[test]
    fn non_directories_are_rejected() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.png");
        std::fs::write(&file, b"x").unwrap();

        let mut job = UploadJob::new(dir.path(), remote());
        assert_eq!(job.add_folder(&file), QueueOutcome::NotADirectory);
        assert_eq!(
            job.add_folder(dir.path().join("missing")),
            QueueOutcome::NotADirectory
        );
        assert!(job.is_empty());
    }

    #[test]
    fn destination_uses_folder_basename() {
        let job = UploadJob::new("/work/repo", remote());
        assert_eq!(
            job.destination_for(Path::new("/photos/cats/")),
            Some(PathBuf::from("/work/repo/cats"))
        );
        assert_eq!(job.destination_for(Path::new("/")), None);
    }

    #[test]
    fn job_ids_are_unique() {
        let a = UploadJob::new("/r", remote());
        let b = UploadJob::new("/r", remote());
        assert_ne!(a.id, b.id);
    }
}
