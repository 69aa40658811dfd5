//! Background execution with exclusive ownership of the working tree.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;

use crate::models::UploadJob;

use super::cancel::CancelHandle;
use super::listener::SyncListener;
use super::sync::SyncOrchestrator;
use super::types::SyncReport;

/// Errors from starting or joining a background job.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// A job is already running against the working tree.
    #[error("Another upload job is already running")]
    Busy,

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("Worker thread panicked")]
    Panicked,
}

/// Runs at most one job at a time on a dedicated thread.
pub struct SyncWorker {
    orchestrator: Arc<SyncOrchestrator>,
    active: Arc<AtomicBool>,
}

impl SyncWorker {
    pub fn new(orchestrator: SyncOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn orchestrator(&self) -> &SyncOrchestrator {
        &self.orchestrator
    }

    /// Whether a job currently holds the working tree.
    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start `job` in the background.
    ///
    /// Fails with [`WorkerError::Busy`] while another job is active.
    pub fn start(
        &self,
        job: UploadJob,
        listener: Arc<dyn SyncListener>,
    ) -> Result<JobHandle, WorkerError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WorkerError::Busy);
        }
        let guard = ActiveGuard(Arc::clone(&self.active));

        let cancel = CancelHandle::new();
        let thread_cancel = cancel.clone();
        let job_id = job.id.clone();
        let orchestrator = Arc::clone(&self.orchestrator);
        let short_id: String = job.id.chars().take(8).collect();

        let thread = thread::Builder::new()
            .name(format!("imgsync-job-{}", short_id))
            .spawn(move || {
                let _guard = guard;
                orchestrator.run(&job, listener, &thread_cancel)
            })
            .map_err(WorkerError::Spawn)?;

        tracing::debug!("Started worker thread for job {}", job_id);

        Ok(JobHandle {
            job_id,
            cancel,
            thread,
        })
    }
}

/// Clears the busy flag when the job thread ends, even on panic.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Handle to a job running on a [`SyncWorker`].
pub struct JobHandle {
    job_id: String,
    cancel: CancelHandle,
    thread: JoinHandle<SyncReport>,
}

impl JobHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Shared cancellation flag, e.g. for a signal handler.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the job stops.
    pub fn join(self) -> Result<SyncReport, WorkerError> {
        self.thread.join().map_err(|_| WorkerError::Panicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::testing::RecordingWriter;
    use crate::models::RemoteIdentity;
    use crate::orchestrator::listener::NullListener;
    use crate::orchestrator::types::{JobStatus, SyncSettings};
    use crate::vcs::testing::ScriptedRunner;
    use parking_lot::Mutex;
    use std::fs;
    use std::path::Path;
    use std::sync::mpsc;
    use tempfile::tempdir;

    /// Worker whose pushes block until the returned sender is signalled
    /// or dropped.
    fn gated_worker() -> (SyncWorker, Arc<ScriptedRunner>, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel::<()>();
        let gate = Mutex::new(rx);
        let runner = ScriptedRunner::new()
            .rule(move |args, _| {
                if args[0] == "push" {
                    let _ = gate.lock().recv();
                }
                None
            })
            .into_arc();
        let settings = SyncSettings {
            batch_size: 1,
            ..SyncSettings::default()
        };
        let orchestrator = SyncOrchestrator::new(
            settings,
            runner.clone(),
            Arc::new(RecordingWriter::default()),
        );
        (SyncWorker::new(orchestrator), runner, tx)
    }

    fn job(root: &Path, images: usize) -> UploadJob {
        let repo = root.join("repo");
        let cats = root.join("cats");
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::create_dir_all(&cats).unwrap();
        for i in 0..images {
            fs::write(cats.join(format!("{i}.png")), b"x").unwrap();
        }
        let mut job = UploadJob::new(repo, RemoteIdentity::new("acct", "repo", "main"));
        job.add_folder(&cats);
        job
    }

    #[test]
    fn second_start_is_rejected_while_busy() {
        let dir = tempdir().unwrap();
        let (worker, _, tx) = gated_worker();

        let handle = worker
            .start(job(dir.path(), 1), Arc::new(NullListener))
            .unwrap();
        assert!(worker.is_busy());
        assert!(matches!(
            worker.start(job(dir.path(), 1), Arc::new(NullListener)),
            Err(WorkerError::Busy)
        ));

        tx.send(()).unwrap();
        let report = handle.join().unwrap();
        assert_eq!(report.status, JobStatus::Done, "{}", report.message);
        assert!(!worker.is_busy());

        drop(tx);
        let again = worker
            .start(job(dir.path(), 1), Arc::new(NullListener))
            .unwrap();
        assert_eq!(again.join().unwrap().status, JobStatus::Done);
    }

    #[test]
    fn cancel_through_handle_finishes_running_batch() {
        let dir = tempdir().unwrap();
        let (worker, runner, tx) = gated_worker();

        let handle = worker
            .start(job(dir.path(), 3), Arc::new(NullListener))
            .unwrap();
        handle.cancel();
        tx.send(()).unwrap();

        let report = handle.join().unwrap();
        assert_eq!(report.status, JobStatus::Cancelled);
        assert!(runner.count("push") <= 1);
        assert!(!worker.is_busy());
    }
}
