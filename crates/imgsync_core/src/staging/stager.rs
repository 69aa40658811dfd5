//! File stager - mirrors the images of a source folder into the working tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::models::is_image_path;

/// Errors raised while copying a folder into the working tree.
#[derive(Error, Debug)]
pub enum StageError {
    /// Source folder is missing or not a directory.
    #[error("Source folder not found: {0}")]
    SourceMissing(PathBuf),

    /// Source and destination are the same folder or one contains the other.
    #[error("Source '{}' and destination '{}' overlap", .folder.display(), .destination.display())]
    Overlap { folder: PathBuf, destination: PathBuf },

    /// A filesystem operation failed.
    #[error("I/O error while {operation} '{}': {source}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StageError {
    fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Result type for staging operations.
pub type StageResult<T> = Result<T, StageError>;

/// Summary of one staging pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Destination paths written, in source traversal order.
    pub copied: Vec<PathBuf>,
    /// Non-image files that were left behind.
    pub ignored: usize,
    /// Total bytes copied.
    pub bytes: u64,
}

/// Copies image files from a source folder to a destination folder.
///
/// Relative subpaths are preserved, existing files are overwritten
/// (last writer wins) and missing directories are created. Files without a
/// recognized image extension are never copied.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStager;

impl FileStager {
    pub fn new() -> Self {
        Self
    }

    /// Copy every image under `source` into `destination`.
    ///
    /// Any I/O failure aborts the pass; files copied before the failure stay
    /// in place. Nothing is copied when one folder contains the other, since
    /// copying a file onto itself truncates it.
    pub fn stage(&self, source: &Path, destination: &Path) -> StageResult<StageReport> {
        if !source.is_dir() {
            return Err(StageError::SourceMissing(source.to_path_buf()));
        }
        check_disjoint(source, destination)?;

        let mut report = StageReport::default();

        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(source).to_path_buf();
                StageError::io("scanning", path, e.into())
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            if !is_image_path(entry.path()) {
                report.ignored += 1;
                continue;
            }

            // WalkDir only yields paths under its root.
            let relative = entry
                .path()
                .strip_prefix(source)
                .unwrap_or_else(|_| entry.path());
            let target = destination.join(relative);

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| StageError::io("creating directory", parent, e))?;
            }

            let bytes = fs::copy(entry.path(), &target)
                .map_err(|e| StageError::io("copying", entry.path(), e))?;

            tracing::trace!("Staged {} -> {}", entry.path().display(), target.display());
            report.bytes += bytes;
            report.copied.push(target);
        }

        tracing::debug!(
            "Staged {} images ({} bytes) from {} into {}, ignored {} other files",
            report.copied.len(),
            report.bytes,
            source.display(),
            destination.display(),
            report.ignored
        );

        Ok(report)
    }
}

/// Reject destinations that overlap the source in either direction.
fn check_disjoint(source: &Path, destination: &Path) -> StageResult<()> {
    let source_real = source
        .canonicalize()
        .map_err(|e| StageError::io("resolving", source, e))?;
    let destination_real = resolve_partial(destination)?;

    if source_real.starts_with(&destination_real) || destination_real.starts_with(&source_real) {
        return Err(StageError::Overlap {
            folder: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });
    }
    Ok(())
}

/// Canonicalize the longest existing prefix of `path` and append the rest.
fn resolve_partial(path: &Path) -> StageResult<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| StageError::io("resolving", path, e))?
            .join(path)
    };

    let mut missing = Vec::new();
    let mut existing = absolute.as_path();
    loop {
        match existing.canonicalize() {
            Ok(mut real) => {
                for part in missing.iter().rev() {
                    real.push(part);
                }
                return Ok(real);
            }
            Err(e) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = parent;
                }
                _ => return Err(StageError::io("resolving", path, e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn copies_images_preserving_subpaths() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("cats");
        let dest = dir.path().join("repo").join("cats");
        write(&src.join("a.png"), b"aaa");
        write(&src.join("nested").join("b.JPG"), b"bb");
        write(&src.join("readme.txt"), b"text");

        let report = FileStager::new().stage(&src, &dest).unwrap();

        assert_eq!(report.copied.len(), 2);
        assert_eq!(report.ignored, 1);
        assert_eq!(report.bytes, 5);
        assert_eq!(fs::read(dest.join("a.png")).unwrap(), b"aaa");
        assert_eq!(fs::read(dest.join("nested").join("b.JPG")).unwrap(), b"bb");
        assert!(!dest.join("readme.txt").exists());
    }

    #[test]
    fn staging_twice_is_idempotent() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("cats");
        let dest = dir.path().join("repo").join("cats");
        write(&src.join("a.png"), b"first");
        write(&src.join("deep").join("c.webp"), b"webp");

        let stager = FileStager::new();
        stager.stage(&src, &dest).unwrap();
        stager.stage(&src, &dest).unwrap();

        assert_eq!(fs::read(dest.join("a.png")).unwrap(), b"first");
        assert_eq!(fs::read(dest.join("deep").join("c.webp")).unwrap(), b"webp");
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 2);
    }

    #[test]
    fn overwrites_existing_destination_files() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("cats");
        let dest = dir.path().join("repo").join("cats");
        write(&src.join("a.png"), b"new");
        write(&dest.join("a.png"), b"old content");

        FileStager::new().stage(&src, &dest).unwrap();

        assert_eq!(fs::read(dest.join("a.png")).unwrap(), b"new");
    }

    #[test]
    fn staging_a_folder_onto_itself_is_refused() {
        let dir = tempdir().unwrap();
        let cats = dir.path().join("repo").join("cats");
        write(&cats.join("a.png"), b"PNGDATA");

        let result = FileStager::new().stage(&cats, &cats);

        assert!(matches!(result, Err(StageError::Overlap { .. })));
        assert_eq!(fs::read(cats.join("a.png")).unwrap(), b"PNGDATA");
    }

    #[test]
    fn destination_inside_source_is_refused() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("photos");
        write(&src.join("a.png"), b"PNGDATA");
        let dest = src.join("repo").join("photos");

        let result = FileStager::new().stage(&src, &dest);

        assert!(matches!(result, Err(StageError::Overlap { .. })));
        assert!(!dest.exists());
    }

    #[test]
    fn source_inside_destination_is_refused_through_dot_segments() {
        let dir = tempdir().unwrap();
        let repo = dir.path().join("repo");
        let src = repo.join("cats");
        write(&src.join("a.png"), b"PNGDATA");

        let result = FileStager::new().stage(&src, &repo.join("cats").join(".."));

        assert!(matches!(result, Err(StageError::Overlap { .. })));
        assert_eq!(fs::read(src.join("a.png")).unwrap(), b"PNGDATA");
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempdir().unwrap();
        let result = FileStager::new().stage(&dir.path().join("gone"), dir.path());
        assert!(matches!(result, Err(StageError::SourceMissing(_))));
    }

    #[test]
    fn folder_without_images_copies_nothing() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("docs");
        let dest = dir.path().join("repo").join("docs");
        write(&src.join("a.txt"), b"a");

        let report = FileStager::new().stage(&src, &dest).unwrap();

        assert!(report.copied.is_empty());
        assert!(!dest.exists());
    }
}
