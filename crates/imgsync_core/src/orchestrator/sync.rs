//! The sync orchestrator - drives one upload job through its protocol.
//!
//! ```text
//! for each folder:
//!     stage -> discover -> plan
//!     for each batch: add -> commit -> pull -> push -> progress
//!     manifest
//! ```
//!
//! Everything runs on the calling thread, one command at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::batching::{BatchPlanner, PlanError};
use crate::config::EmptyFolderPolicy;
use crate::logging::{JobLogger, LogCallback};
use crate::manifest::{CdnUrlTemplate, ManifestWriter, TabularWriter};
use crate::models::{folder_name, ImageBatch, UploadJob};
use crate::staging::{discover_images, FileStager};
use crate::vcs::{
    CommandRunner, CredentialProvider, NoCredentials, RepositoryStatus, VcsCommand, VcsSession,
};

use super::cancel::CancelHandle;
use super::errors::{StepError, SyncError, SyncResult};
use super::listener::SyncListener;
use super::types::{FolderReport, FolderStatus, JobStatus, SyncPhase, SyncReport, SyncSettings};

/// Runs upload jobs against a working tree.
///
/// The orchestrator itself is stateless between jobs; exclusive use of the
/// working tree is enforced by [`super::SyncWorker`].
pub struct SyncOrchestrator {
    settings: SyncSettings,
    runner: Arc<dyn CommandRunner>,
    tabular: Arc<dyn TabularWriter>,
    credentials: Arc<dyn CredentialProvider>,
}

impl SyncOrchestrator {
    pub fn new(
        settings: SyncSettings,
        runner: Arc<dyn CommandRunner>,
        tabular: Arc<dyn TabularWriter>,
    ) -> Self {
        Self {
            settings,
            runner,
            tabular,
            credentials: Arc::new(NoCredentials),
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Run a job to completion, first failure, or cancellation.
    ///
    /// Never returns an error: every outcome is folded into the report,
    /// which is also delivered to `listener.on_finished`.
    pub fn run(
        &self,
        job: &UploadJob,
        listener: Arc<dyn SyncListener>,
        cancel: &CancelHandle,
    ) -> SyncReport {
        let started_at = Local::now().to_rfc3339();
        let folders: Vec<FolderReport> = job
            .source_folders()
            .iter()
            .map(|source| FolderReport::pending(folder_name(source).unwrap_or_default(), source))
            .collect();

        tracing::info!(
            "Starting upload job {} ({} folders)",
            job.id,
            folders.len()
        );

        let logger = match self.create_logger(job, &listener) {
            Ok(logger) => Arc::new(logger),
            Err(e) => {
                let report = SyncReport {
                    job_id: job.id.clone(),
                    status: JobStatus::Failed,
                    started_at,
                    finished_at: Local::now().to_rfc3339(),
                    folders,
                    message: format!("Failed to create job log: {}", e),
                    failed_step: Some("setup".to_string()),
                    recovery: Default::default(),
                    log_path: None,
                };
                tracing::error!("{}", report.message);
                listener.on_phase(&SyncPhase::Failed);
                listener.on_finished(&report);
                return report;
            }
        };

        let rate_listener = Arc::clone(&listener);
        let session = VcsSession::new(
            Arc::clone(&self.runner),
            &self.settings.vcs_program,
            &job.repository_root,
            Arc::clone(&logger),
        )
        .with_credentials(Arc::clone(&self.credentials))
        .with_auto_recover(self.settings.auto_recover)
        .with_transfer_rate_callback(Box::new(move |rate: &str| {
            rate_listener.on_transfer_rate(rate)
        }));

        let mut run = JobRun {
            settings: &self.settings,
            tabular: &self.tabular,
            job,
            listener: listener.as_ref(),
            cancel,
            logger,
            session,
            folders,
        };

        let outcome = run.execute();
        run.finish(outcome, started_at)
    }

    fn create_logger(
        &self,
        job: &UploadJob,
        listener: &Arc<dyn SyncListener>,
    ) -> std::io::Result<JobLogger> {
        let forward = Arc::clone(listener);
        let callback: LogCallback = Box::new(move |line: &str| forward.on_log(line));
        let short_id: String = job.id.chars().take(8).collect();
        let name = format!(
            "upload_{}_{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            short_id
        );

        match &self.settings.logs_folder {
            Some(dir) => JobLogger::new(name, dir, self.settings.log.clone(), Some(callback)),
            None => Ok(JobLogger::callback_only(
                name,
                self.settings.log.clone(),
                Some(callback),
            )),
        }
    }
}

/// State of one job while it runs.
struct JobRun<'a> {
    settings: &'a SyncSettings,
    tabular: &'a Arc<dyn TabularWriter>,
    job: &'a UploadJob,
    listener: &'a dyn SyncListener,
    cancel: &'a CancelHandle,
    logger: Arc<JobLogger>,
    session: VcsSession,
    folders: Vec<FolderReport>,
}

impl JobRun<'_> {
    fn execute(&mut self) -> SyncResult<()> {
        self.phase(SyncPhase::Preparing);
        self.logger.phase("Preparing");

        let planner = self.validate()?;
        self.prepare_repository()?;

        let template = CdnUrlTemplate::new(
            &self.settings.manifest.cdn_host,
            &self.job.remote,
            self.settings.manifest.pin_branch,
        );
        let manifest = ManifestWriter::new(template, Arc::clone(self.tabular))
            .with_settings(&self.settings.manifest);

        for index in 0..self.folders.len() {
            let folder = self.folders[index].folder.clone();
            self.checkpoint(format!("folder '{}'", folder))?;

            if let Err(e) = self.sync_folder(index, &planner, &manifest) {
                if !matches!(e, SyncError::Cancelled { .. }) {
                    let report = &mut self.folders[index];
                    report.status = FolderStatus::Failed;
                    report.message = Some(e.to_string());
                }
                return Err(e);
            }
        }

        Ok(())
    }

    fn validate(&self) -> SyncResult<BatchPlanner> {
        let job_id = &self.job.id;

        if self.job.is_empty() {
            return Err(SyncError::validation_failed(job_id, "No folders queued"));
        }

        let status = RepositoryStatus::check(&self.job.repository_root);
        if !status.is_ready() {
            return Err(SyncError::validation_failed(job_id, status.summary()));
        }

        let remote = &self.job.remote;
        if remote.account.is_empty() || remote.repository.is_empty() || remote.branch.is_empty()
        {
            return Err(SyncError::validation_failed(
                job_id,
                "Remote account, repository and branch must be configured",
            ));
        }

        BatchPlanner::new(self.settings.batch_size)
            .map_err(|e| SyncError::validation_failed(job_id, e.to_string()))
    }

    /// Heal a previous interrupted run and set per-job tool options.
    fn prepare_repository(&mut self) -> SyncResult<()> {
        if self.settings.auto_recover {
            self.session
                .recover()
                .map_err(|e| SyncError::setup_failed("recovery", e))?;
        }

        self.session
            .run(&VcsCommand::config("core.quotepath", "false"))
            .map_err(|e| SyncError::setup_failed("config", e))?;
        Ok(())
    }

    fn sync_folder(
        &mut self,
        index: usize,
        planner: &BatchPlanner,
        manifest: &ManifestWriter,
    ) -> SyncResult<()> {
        let source = self.folders[index].source.clone();
        let folder = self.folders[index].folder.clone();
        if folder.is_empty() {
            return Err(SyncError::folder_failed(
                source.display().to_string(),
                "stage",
                StepError::InvalidFolder(source),
            ));
        }
        let root = self.job.repository_root.clone();
        let destination = root.join(&folder);

        self.logger.phase(&format!("Folder {}", folder));

        // Stage
        self.phase(SyncPhase::Staging {
            folder: folder.clone(),
        });
        let staged = FileStager::new()
            .stage(&source, &destination)
            .map_err(|e| SyncError::folder_failed(&folder, "stage", e))?;
        self.logger.info(&format!(
            "Copied {} image(s) ({} bytes) from {}, ignored {} other file(s)",
            staged.copied.len(),
            staged.bytes,
            source.display(),
            staged.ignored
        ));

        // Plan
        self.phase(SyncPhase::Batching {
            folder: folder.clone(),
        });
        let files = discover_images(&destination)
            .map_err(|e| {
                SyncError::folder_failed(
                    &folder,
                    "discover",
                    StepError::io(format!("scanning {}", destination.display()), e),
                )
            })?
            .into_iter()
            .filter_map(|p| p.strip_prefix(&root).ok().map(Path::to_path_buf))
            .collect::<Vec<PathBuf>>();
        let total = files.len();
        self.folders[index].images = total;

        let batches = match planner.plan(&folder, files) {
            Ok(batches) => batches,
            Err(e @ PlanError::NoImagesFound { .. })
                if self.settings.empty_folder_policy == EmptyFolderPolicy::Skip =>
            {
                self.logger.warn(&format!("{}, skipping", e));
                let report = &mut self.folders[index];
                report.status = FolderStatus::Skipped;
                report.message = Some(e.to_string());
                return Ok(());
            }
            Err(e) => return Err(SyncError::folder_failed(&folder, "plan", e)),
        };
        self.folders[index].batches_total = batches.len();
        self.logger.info(&format!(
            "{} image(s) in {} batch(es) of up to {}",
            total,
            batches.len(),
            planner.batch_size()
        ));

        // Batches
        let mut done = 0;
        for batch in &batches {
            self.checkpoint(format!("{} of '{}'", batch.label(), folder))?;
            self.push_batch(&folder, batch)?;

            done += batch.len();
            self.folders[index].batches_pushed += 1;
            self.listener.on_progress(&folder, done, total);
        }

        // Manifest
        self.phase(SyncPhase::ManifestWriting {
            folder: folder.clone(),
        });
        let output = manifest
            .write_folder(&root, &folder)
            .map_err(|e| SyncError::folder_failed(&folder, "manifest", e))?;
        self.logger.success(&format!(
            "Wrote {} URL(s) to {}",
            output.rows,
            output.path.display()
        ));

        let report = &mut self.folders[index];
        report.status = FolderStatus::Published;
        report.manifest = Some(output.path);
        Ok(())
    }

    /// add -> commit -> pull -> push for one batch.
    fn push_batch(&mut self, folder: &str, batch: &ImageBatch) -> SyncResult<()> {
        let branch = self.job.remote.branch.clone();
        let (number, of) = (batch.number, batch.of);

        self.logger.section(&format!(
            "{} {} ({} files)",
            folder,
            batch.label(),
            batch.len()
        ));
        self.session
            .add_paths(&batch.files, self.settings.add_chunk_size)
            .map_err(|e| SyncError::folder_failed(folder, "add", e))?;

        self.checkpoint(format!("commit of {} {}", folder, batch.label()))?;
        self.phase(SyncPhase::Committing {
            folder: folder.to_string(),
            batch: number,
            of,
        });
        let message = format!(
            "Upload {} {} ({})",
            folder,
            batch.label(),
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.session
            .run(&VcsCommand::commit(message))
            .map_err(|e| SyncError::folder_failed(folder, "commit", e))?;

        self.checkpoint(format!("pull of {} {}", folder, batch.label()))?;
        self.phase(SyncPhase::Pulling {
            folder: folder.to_string(),
            batch: number,
            of,
        });
        self.session
            .run(&VcsCommand::sync_pull(branch.as_str()))
            .map_err(|e| SyncError::folder_failed(folder, "pull", e))?;

        self.checkpoint(format!("push of {} {}", folder, batch.label()))?;
        self.phase(SyncPhase::Pushing {
            folder: folder.to_string(),
            batch: number,
            of,
        });
        self.session
            .run(&VcsCommand::push(branch.as_str()))
            .map_err(|e| SyncError::folder_failed(folder, "push", e))?;

        self.logger
            .success(&format!("Pushed {} {}", folder, batch.label()));
        Ok(())
    }

    fn checkpoint(&self, point: String) -> SyncResult<()> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::cancelled(&self.job.id, point));
        }
        Ok(())
    }

    fn phase(&self, phase: SyncPhase) {
        self.listener.on_phase(&phase);
    }

    fn finish(self, outcome: SyncResult<()>, started_at: String) -> SyncReport {
        let (status, message, failed_step) = match &outcome {
            Ok(()) => {
                let published = self.count(FolderStatus::Published);
                let skipped = self.count(FolderStatus::Skipped);
                let message = if skipped > 0 {
                    format!(
                        "Published {} folder(s), skipped {} without images",
                        published, skipped
                    )
                } else {
                    format!("Published {} folder(s)", published)
                };
                self.logger.success(&message);
                (JobStatus::Done, message, None)
            }
            Err(e @ SyncError::Cancelled { .. }) => {
                let message = e.to_string();
                self.logger.warn(&message);
                (JobStatus::Cancelled, message, None)
            }
            Err(e) => {
                let message = e.to_string();
                self.logger.error(&message);
                (
                    JobStatus::Failed,
                    message,
                    e.step().map(str::to_string),
                )
            }
        };

        let phase = match status {
            JobStatus::Done => SyncPhase::Done,
            JobStatus::Failed => SyncPhase::Failed,
            JobStatus::Cancelled => SyncPhase::Cancelled,
        };

        let report = SyncReport {
            job_id: self.job.id.clone(),
            status,
            started_at,
            finished_at: Local::now().to_rfc3339(),
            folders: self.folders,
            message,
            failed_step,
            recovery: self.session.recovery_report().clone(),
            log_path: self.logger.log_path().map(Path::to_path_buf),
        };

        tracing::info!("Upload job {} finished: {}", report.job_id, report.status);
        self.logger.flush();
        self.listener.on_phase(&phase);
        self.listener.on_finished(&report);
        report
    }

    fn count(&self, status: FolderStatus) -> usize {
        self.folders.iter().filter(|f| f.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::testing::RecordingWriter;
    use crate::models::RemoteIdentity;
    use crate::orchestrator::listener::{ChannelListener, SyncEvent};
    use crate::vcs::testing::ScriptedRunner;
    use crate::vcs::{index_lock_path, RecoveryAction};
    use std::fs;
    use std::sync::mpsc::Receiver;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _dir: TempDir,
        repo: PathBuf,
        sources: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let repo = dir.path().join("repo");
        let sources = dir.path().join("src");
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::create_dir_all(&sources).unwrap();
        Fixture {
            _dir: dir,
            repo,
            sources,
        }
    }

    impl Fixture {
        fn folder(&self, name: &str, files: &[&str]) -> PathBuf {
            let folder = self.sources.join(name);
            fs::create_dir_all(&folder).unwrap();
            for file in files {
                fs::write(folder.join(file), file.as_bytes()).unwrap();
            }
            folder
        }

        fn job(&self, folders: &[PathBuf]) -> UploadJob {
            let mut job = UploadJob::new(&self.repo, RemoteIdentity::new("acct", "repo", "main"));
            for folder in folders {
                job.add_folder(folder);
            }
            job
        }
    }

    fn settings(batch_size: usize) -> SyncSettings {
        let mut settings = SyncSettings {
            batch_size,
            ..SyncSettings::default()
        };
        settings.manifest.cdn_host = "cdn.example".into();
        settings.log.show_timestamps = false;
        settings
    }

    fn run(
        settings: SyncSettings,
        runner: Arc<ScriptedRunner>,
        writer: Arc<RecordingWriter>,
        job: &UploadJob,
    ) -> (SyncReport, Vec<SyncEvent>) {
        let (listener, rx): (ChannelListener, Receiver<SyncEvent>) = ChannelListener::new();
        let orchestrator = SyncOrchestrator::new(settings, runner, writer);
        let report = orchestrator.run(job, Arc::new(listener), &CancelHandle::new());
        (report, rx.try_iter().collect())
    }

    fn progress(events: &[SyncEvent]) -> Vec<(String, usize, usize)> {
        events
            .iter()
            .filter_map(|e| match e {
                SyncEvent::Progress {
                    folder,
                    done,
                    total,
                } => Some((folder.clone(), *done, *total)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn three_images_in_batches_of_two() {
        let fx = fixture();
        let cats = fx.folder("cats", &["a.png", "b.png", "c.png", "notes.txt"]);
        let runner = ScriptedRunner::new()
            .rule(|args, _| {
                (args[0] == "push").then(|| {
                    (
                        0,
                        vec!["Writing objects: 100% (3/3), 1.00 MiB | 2.40 MiB/s".to_string()],
                    )
                })
            })
            .into_arc();
        let writer = Arc::new(RecordingWriter::default());

        let (report, events) = run(settings(2), runner.clone(), writer.clone(), &fx.job(&[cats]));

        assert_eq!(report.status, JobStatus::Done, "{}", report.message);
        assert_eq!(runner.count("commit"), 2);
        assert_eq!(runner.count("pull"), 2);
        assert_eq!(runner.count("push"), 2);

        let lines = runner.command_lines();
        assert_eq!(lines[0], "config core.quotepath false");
        assert_eq!(lines[1], "add -- cats/a.png cats/b.png");
        assert!(lines[2].starts_with("commit -m Upload cats batch 1/2 ("));
        assert_eq!(lines[3], "pull origin main --no-rebase -X ours");
        assert_eq!(lines[4], "push --progress origin main");
        assert_eq!(lines[5], "add -- cats/c.png");
        assert!(runner.calls().iter().all(|c| c.cwd == fx.repo));

        assert_eq!(
            progress(&events),
            vec![("cats".to_string(), 2, 3), ("cats".to_string(), 3, 3)]
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, SyncEvent::TransferRate(r) if r == "2.40 MiB/s")));
        assert!(matches!(events.last(), Some(SyncEvent::Finished(_))));

        let tables = writer.tables();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].path, fx.repo.join("cats_urls.xlsx"));
        let urls: Vec<&str> = tables[0].rows.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://cdn.example/gh/acct/repo/cats/a.png",
                "https://cdn.example/gh/acct/repo/cats/b.png",
                "https://cdn.example/gh/acct/repo/cats/c.png",
            ]
        );

        let folder = report.folder("cats").unwrap();
        assert_eq!(folder.status, FolderStatus::Published);
        assert_eq!(folder.images, 3);
        assert_eq!((folder.batches_pushed, folder.batches_total), (2, 2));
        assert!(!fx.repo.join("cats").join("notes.txt").exists());
    }

    #[test]
    fn push_failure_stops_job_and_keeps_earlier_manifest() {
        let fx = fixture();
        let cats = fx.folder("cats", &["a.png"]);
        let dogs = fx.folder("dogs", &["rex.jpg"]);
        let runner = ScriptedRunner::new()
            .fail_nth("push", 1, "! [rejected] main -> main (fetch first)")
            .into_arc();
        let writer = Arc::new(RecordingWriter::default());

        let (report, events) = run(
            settings(10),
            runner.clone(),
            writer.clone(),
            &fx.job(&[cats, dogs]),
        );

        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.failed_step.as_deref(), Some("push"));
        assert!(report.message.contains("dogs"));
        assert!(report.message.contains("[rejected]"));

        assert!(fx.repo.join("cats_urls.xlsx").exists());
        assert!(!fx.repo.join("dogs_urls.xlsx").exists());
        assert_eq!(writer.tables().len(), 1);

        assert_eq!(report.folders[0].status, FolderStatus::Published);
        assert_eq!(report.folders[1].status, FolderStatus::Failed);
        assert_eq!(report.folders[1].batches_pushed, 0);
        assert_eq!(progress(&events), vec![("cats".to_string(), 1, 1)]);
        assert!(events
            .iter()
            .any(|e| matches!(e, SyncEvent::Phase(SyncPhase::Failed))));
    }

    #[test]
    fn staging_failure_fails_job_before_any_commit() {
        let fx = fixture();
        let cats = fx.folder("cats", &["a.png"]);
        let dogs = fx.folder("dogs", &["rex.jpg"]);
        // A plain file where the folder's directory has to go.
        fs::write(fx.repo.join("cats"), b"not a directory").unwrap();
        let runner = ScriptedRunner::new().into_arc();
        let writer = Arc::new(RecordingWriter::default());

        let (report, events) = run(
            settings(10),
            runner.clone(),
            writer.clone(),
            &fx.job(&[cats, dogs]),
        );

        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.failed_step.as_deref(), Some("stage"));
        assert!(report.message.contains("cats"));
        assert_eq!(runner.count("add"), 0);
        assert_eq!(runner.count("commit"), 0);
        assert_eq!(runner.count("push"), 0);

        assert_eq!(report.folders[0].status, FolderStatus::Failed);
        assert_eq!(report.folders[1].status, FolderStatus::Pending);
        assert!(writer.tables().is_empty());
        assert!(!fx.repo.join("dogs").exists());
        assert!(progress(&events).is_empty());
    }

    #[test]
    fn folder_inside_working_tree_is_not_staged_onto_itself() {
        let fx = fixture();
        let cats = fx.repo.join("cats");
        fs::create_dir_all(&cats).unwrap();
        fs::write(cats.join("a.png"), b"PNGDATA").unwrap();
        let runner = ScriptedRunner::new().into_arc();
        let writer = Arc::new(RecordingWriter::default());

        let (report, _) = run(
            settings(10),
            runner.clone(),
            writer.clone(),
            &fx.job(&[cats.clone()]),
        );

        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.failed_step.as_deref(), Some("stage"));
        assert_eq!(runner.count("commit"), 0);
        assert!(writer.tables().is_empty());
        assert_eq!(fs::read(cats.join("a.png")).unwrap(), b"PNGDATA");
    }

    #[test]
    fn folder_without_images_is_skipped() {
        let fx = fixture();
        let empty = fx.folder("docs", &["readme.txt"]);
        let cats = fx.folder("cats", &["a.png"]);
        let runner = ScriptedRunner::new().into_arc();

        let (report, _) = run(
            settings(10),
            runner.clone(),
            Arc::new(RecordingWriter::default()),
            &fx.job(&[empty, cats]),
        );

        assert_eq!(report.status, JobStatus::Done, "{}", report.message);
        assert_eq!(report.folders[0].status, FolderStatus::Skipped);
        assert_eq!(
            report.folders[0].message.as_deref(),
            Some("No images found in 'docs'")
        );
        assert_eq!(report.folders[1].status, FolderStatus::Published);
        assert_eq!(runner.count("commit"), 1);
        assert!(!fx.repo.join("docs_urls.xlsx").exists());
    }

    #[test]
    fn folder_without_images_aborts_in_strict_mode() {
        let fx = fixture();
        let empty = fx.folder("docs", &["readme.txt"]);
        let cats = fx.folder("cats", &["a.png"]);
        let runner = ScriptedRunner::new().into_arc();
        let settings = SyncSettings {
            empty_folder_policy: EmptyFolderPolicy::Abort,
            ..settings(10)
        };

        let (report, _) = run(
            settings,
            runner.clone(),
            Arc::new(RecordingWriter::default()),
            &fx.job(&[empty, cats]),
        );

        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.failed_step.as_deref(), Some("plan"));
        assert_eq!(report.folders[1].status, FolderStatus::Pending);
        assert_eq!(runner.count("commit"), 0);
    }

    struct CancelAfterFirstBatch {
        cancel: CancelHandle,
    }

    impl SyncListener for CancelAfterFirstBatch {
        fn on_progress(&self, _folder: &str, _done: usize, _total: usize) {
            self.cancel.cancel();
        }
    }

    #[test]
    fn cancellation_stops_between_batches() {
        let fx = fixture();
        let cats = fx.folder("cats", &["a.png", "b.png", "c.png"]);
        let runner = ScriptedRunner::new().into_arc();
        let writer = Arc::new(RecordingWriter::default());
        let cancel = CancelHandle::new();
        let listener = Arc::new(CancelAfterFirstBatch {
            cancel: cancel.clone(),
        });

        let orchestrator = SyncOrchestrator::new(settings(1), runner.clone(), writer.clone());
        let report = orchestrator.run(&fx.job(&[cats]), listener, &cancel);

        assert_eq!(report.status, JobStatus::Cancelled);
        assert!(report.message.contains("batch 2/3"));
        assert_eq!(runner.count("push"), 1);
        assert_eq!(report.folders[0].batches_pushed, 1);
        assert!(writer.tables().is_empty());
    }

    #[test]
    fn uninitialized_repository_fails_validation() {
        let fx = fixture();
        let cats = fx.folder("cats", &["a.png"]);
        fs::remove_dir_all(fx.repo.join(".git")).unwrap();
        let runner = ScriptedRunner::new().into_arc();

        let (report, _) = run(
            settings(10),
            runner.clone(),
            Arc::new(RecordingWriter::default()),
            &fx.job(&[cats]),
        );

        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.failed_step.as_deref(), Some("validation"));
        assert!(runner.calls().is_empty());
        assert!(!fx.repo.join("cats").exists());
    }

    #[test]
    fn empty_commit_is_not_a_failure() {
        let fx = fixture();
        let cats = fx.folder("cats", &["a.png"]);
        let runner = ScriptedRunner::new()
            .rule(|args, _| {
                (args[0] == "commit").then(|| {
                    (
                        1,
                        vec!["nothing to commit, working tree clean".to_string()],
                    )
                })
            })
            .into_arc();

        let (report, _) = run(
            settings(10),
            runner.clone(),
            Arc::new(RecordingWriter::default()),
            &fx.job(&[cats]),
        );

        assert_eq!(report.status, JobStatus::Done, "{}", report.message);
        assert_eq!(runner.count("push"), 1);
    }

    #[test]
    fn stale_lock_is_repaired_at_start() {
        let fx = fixture();
        let cats = fx.folder("cats", &["a.png"]);
        fs::write(index_lock_path(&fx.repo), b"").unwrap();
        let runner = ScriptedRunner::new().into_arc();

        let (report, events) = run(
            settings(10),
            runner,
            Arc::new(RecordingWriter::default()),
            &fx.job(&[cats]),
        );

        assert_eq!(report.status, JobStatus::Done, "{}", report.message);
        assert_eq!(report.recovery.actions, vec![RecoveryAction::RemovedIndexLock]);
        assert!(!index_lock_path(&fx.repo).exists());
        assert!(events
            .iter()
            .any(|e| matches!(e, SyncEvent::Log(l) if l.starts_with("[RECOVERY]"))));
    }

    #[test]
    fn job_log_file_records_commands() {
        let fx = fixture();
        let cats = fx.folder("cats", &["a.png"]);
        let logs = fx.sources.parent().unwrap().join("logs");
        let settings = SyncSettings {
            logs_folder: Some(logs.clone()),
            ..settings(10)
        };

        let (report, _) = run(
            settings,
            ScriptedRunner::new().into_arc(),
            Arc::new(RecordingWriter::default()),
            &fx.job(&[cats]),
        );

        let log_path = report.log_path.clone().unwrap();
        assert!(log_path.starts_with(&logs));
        let content = fs::read_to_string(log_path).unwrap();
        assert!(content.contains("$ git push --progress origin main"));
    }
}
