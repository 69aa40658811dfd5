//! Batch planning - splits a folder's images into bounded commit units.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::ImageBatch;

/// Errors from batch planning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The folder contributed no recognized image files.
    #[error("No images found in '{folder}'")]
    NoImagesFound { folder: String },

    /// Batch size must be positive.
    #[error("Batch size must be at least 1")]
    InvalidBatchSize,
}

/// Partitions an ordered file list into batches of at most `batch_size` files.
#[derive(Debug, Clone, Copy)]
pub struct BatchPlanner {
    batch_size: usize,
}

impl BatchPlanner {
    /// Create a planner. Fails when `batch_size` is zero.
    pub fn new(batch_size: usize) -> Result<Self, PlanError> {
        if batch_size == 0 {
            return Err(PlanError::InvalidBatchSize);
        }
        Ok(Self { batch_size })
    }

    /// Maximum files per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Plan batches for `files`, preserving their order.
    ///
    /// Every batch holds `batch_size` files except possibly the last; the
    /// concatenation of all batches equals `files`.
    pub fn plan(&self, folder: &str, files: Vec<PathBuf>) -> Result<Vec<ImageBatch>, PlanError> {
        if files.is_empty() {
            return Err(PlanError::NoImagesFound {
                folder: folder.to_string(),
            });
        }

        let total = files.len().div_ceil(self.batch_size);
        let mut batches = Vec::with_capacity(total);
        let mut remaining = files.into_iter().peekable();
        let mut number = 0;

        while remaining.peek().is_some() {
            number += 1;
            let chunk: Vec<PathBuf> = remaining.by_ref().take(self.batch_size).collect();
            batches.push(ImageBatch {
                number,
                of: total,
                files: chunk,
            });
        }

        Ok(batches)
    }
}
