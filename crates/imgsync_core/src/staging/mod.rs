//! Copying image folders into the working tree.
//!
//! - [`FileStager`] mirrors the image files of a source folder into its
//!   destination inside the repository, preserving relative paths.
//! - [`discover_images`] lists the image files under a directory in a
//!   deterministic order (used both for batching and manifests).

mod discover;
mod stager;

pub use discover::discover_images;
pub use stager::{FileStager, StageError, StageReport, StageResult};
