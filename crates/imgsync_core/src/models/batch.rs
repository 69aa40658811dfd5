//! Image batch model.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A contiguous slice of discovered image files committed and pushed as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBatch {
    /// 1-based position of this batch within its folder.
    pub number: usize,
    /// Total number of batches planned for the folder.
    pub of: usize,
    /// Files in discovery order.
    pub files: Vec<PathBuf>,
}

impl ImageBatch {
    /// Number of files in the batch.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the batch holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Short label used in logs, e.g. `batch 2/5`.
    pub fn label(&self) -> String {
        format!("batch {}/{}", self.number, self.of)
    }
}
