use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};

use imgsync_core::config::{ConfigManager, EmptyFolderPolicy};
use imgsync_core::manifest::XlsxTabularWriter;
use imgsync_core::models::{QueueOutcome, RemoteIdentity, UploadJob};
use imgsync_core::orchestrator::{JobStatus, SyncOrchestrator, SyncReport, SyncSettings, SyncWorker};
use imgsync_core::vcs::ProcessRunner;

use crate::terminal::TerminalListener;

/// Exit code of a job stopped by Ctrl-C.
const CANCELLED_EXIT_CODE: u8 = 130;

pub struct UploadArgs {
    pub folders: Vec<PathBuf>,
    pub batch_size: Option<usize>,
    pub strict: bool,
    pub yes: bool,
}

/// Queue the folders, run the job on the worker and persist its report.
pub async fn run(config: &ConfigManager, args: UploadArgs) -> Result<ExitCode> {
    super::require_remote(config)?;
    let settings = config.settings();

    let remote = RemoteIdentity::new(
        &settings.remote.account,
        &settings.remote.repository,
        &settings.remote.branch,
    );
    let mut job = UploadJob::new(config.repository_root(), remote);

    for folder in &args.folders {
        match job.add_folder(folder) {
            QueueOutcome::Added => {}
            QueueOutcome::Duplicate => tracing::debug!("{} already queued", folder.display()),
            QueueOutcome::NotADirectory => {
                eprintln!("warning: {} is not a directory, skipped", folder.display())
            }
        }
    }
    if job.is_empty() {
        anyhow::bail!("no folders to upload");
    }

    if !args.yes {
        println!("Folders to upload:");
        for folder in job.source_folders() {
            println!("  {}", folder.display());
        }
        let question = format!(
            "Publish {} folder(s) to {}/{} ({})?",
            job.source_folders().len(),
            job.remote.account,
            job.remote.repository,
            job.remote.branch
        );
        if !super::confirm(&question)? {
            println!("Aborted");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let mut sync_settings = SyncSettings::from_settings(settings);
    sync_settings.logs_folder = Some(config.logs_folder());
    if let Some(batch_size) = args.batch_size {
        sync_settings.batch_size = batch_size;
    }
    if args.strict {
        sync_settings.empty_folder_policy = EmptyFolderPolicy::Abort;
    }

    let orchestrator = SyncOrchestrator::new(
        sync_settings,
        Arc::new(ProcessRunner),
        Arc::new(XlsxTabularWriter),
    )
    .with_credentials(super::credentials(settings));
    let worker = SyncWorker::new(orchestrator);

    let handle = worker.start(job, Arc::new(TerminalListener::new()))?;
    let cancel = handle.cancel_handle();
    let mut join = tokio::task::spawn_blocking(move || handle.join());

    let report = tokio::select! {
        joined = &mut join => joined??,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nCancelling after the current command finishes (Ctrl-C again to abort)...");
            cancel.cancel();
            tokio::select! {
                joined = &mut join => joined??,
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("Upload aborted by a second interrupt");
                    eprintln!("\nAborted.");
                    // The runtime would wait for the blocked worker on shutdown.
                    std::process::exit(i32::from(CANCELLED_EXIT_CODE));
                }
            }
        }
    };

    write_report(config, &report)?;
    println!();
    println!("{}", report.summary());

    Ok(ExitCode::from(exit_status(report.status)))
}

fn exit_status(status: JobStatus) -> u8 {
    match status {
        JobStatus::Done => 0,
        JobStatus::Cancelled => CANCELLED_EXIT_CODE,
        JobStatus::Failed => 1,
    }
}

fn write_report(config: &ConfigManager, report: &SyncReport) -> Result<()> {
    let path = super::last_report_path(config);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!("Wrote job report to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupted_jobs_exit_like_sigint() {
        assert_eq!(exit_status(JobStatus::Done), 0);
        assert_eq!(exit_status(JobStatus::Failed), 1);
        assert_eq!(exit_status(JobStatus::Cancelled), 130);
    }
}
