//! Image discovery under a directory tree.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::models::is_image_path;

/// List every image file under `root`, recursively.
///
/// Entries are visited sorted by file name within each directory, so the
/// result is stable across runs and platforms. A missing `root` yields an
/// empty list; any other traversal error is returned.
pub fn discover_images(root: &Path) -> io::Result<Vec<PathBuf>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_image_path(entry.path()) {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_images_recursively_in_name_order() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.png"), b"b").unwrap();
        fs::write(dir.path().join("a.JPG"), b"a").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        fs::write(dir.path().join("sub").join("c.gif"), b"c").unwrap();

        let found = discover_images(dir.path()).unwrap();
        let rel: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            rel,
            vec![
                PathBuf::from("a.JPG"),
                PathBuf::from("b.png"),
                PathBuf::from("sub").join("c.gif"),
            ]
        );
    }

    #[test]
    fn missing_root_is_empty() {
        let dir = tempdir().unwrap();
        assert!(discover_images(&dir.path().join("nope")).unwrap().is_empty());
    }
}
