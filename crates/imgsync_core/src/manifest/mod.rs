//! URL manifests for published folders.
//!
//! After a folder's batches are pushed, [`ManifestWriter`] lists every image
//! under the folder's destination and writes one row per file:
//! `(name, placeholder, url)`. URLs come from a [`CdnUrlTemplate`]; the file
//! format is chosen by the [`TabularWriter`] (`.xlsx` by default).

mod tabular;
mod url;
mod writer;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use tabular::{TabularWriter, XlsxTabularWriter};
pub use url::{encode_segment, CdnUrlTemplate};
pub use writer::{ManifestOutput, ManifestWriter};

/// Errors from manifest generation.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The synced destination folder does not exist.
    #[error("Manifest folder not found: {}", .0.display())]
    FolderMissing(PathBuf),

    #[error("I/O error while {operation} '{}': {source}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The spreadsheet backend rejected the data or the save.
    #[error("Failed to write table '{}': {message}", .path.display())]
    Tabular { path: PathBuf, message: String },
}

impl ManifestError {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub fn tabular(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Tabular {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

#[cfg(test)]
pub(crate) use tabular::testing;
