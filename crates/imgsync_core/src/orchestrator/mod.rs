//! Sync orchestrator for publishing queued folders.
//!
//! A job walks each queued folder through a fixed protocol, one
//! version-control command at a time:
//!
//! # Architecture
//!
//! ```text
//! SyncWorker (one job at a time, background thread)
//!     └── SyncOrchestrator::run(job)
//!             ├── validate + recover + per-job config
//!             └── for each folder
//!                     ├── Staging        FileStager
//!                     ├── Batching       BatchPlanner
//!                     ├── for each batch add → commit → pull → push
//!                     └── ManifestWriting ManifestWriter
//! ```
//!
//! Progress, log lines and the final [`SyncReport`] reach the consumer
//! through a [`SyncListener`].
//!
//! # Example
//!
//! ```ignore
//! let orchestrator = SyncOrchestrator::new(settings, Arc::new(ProcessRunner), Arc::new(XlsxTabularWriter));
//! let worker = SyncWorker::new(orchestrator);
//! let handle = worker.start(job, Arc::new(NullListener))?;
//! let report = handle.join()?;
//! println!("{}", report.summary());
//! ```

mod cancel;
mod errors;
mod listener;
mod sync;
mod types;
mod worker;

pub use cancel::CancelHandle;
pub use errors::{StepError, StepResult, SyncError, SyncResult};
pub use listener::{ChannelListener, NullListener, SyncEvent, SyncListener};
pub use sync::SyncOrchestrator;
pub use types::{
    FolderReport, FolderStatus, JobStatus, SyncPhase, SyncReport, SyncSettings,
};
pub use worker::{JobHandle, SyncWorker, WorkerError};
