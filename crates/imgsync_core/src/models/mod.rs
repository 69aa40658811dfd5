//! Data models shared across the sync engine.

mod batch;
mod images;
mod job;
mod manifest;

pub use batch::ImageBatch;
pub use images::{is_image_path, IMAGE_EXTENSIONS};
pub(crate) use job::folder_name;
pub use job::{QueueOutcome, RemoteIdentity, UploadJob};
pub use manifest::ManifestRow;
