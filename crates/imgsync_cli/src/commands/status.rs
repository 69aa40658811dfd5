use std::fs;

use anyhow::{Context, Result};

use imgsync_core::config::ConfigManager;
use imgsync_core::orchestrator::SyncReport;
use imgsync_core::vcs::RepositoryStatus;

/// Print repository readiness and the last job report, if any.
pub fn run(config: &ConfigManager) -> Result<()> {
    let settings = config.settings();
    let status = RepositoryStatus::check(&config.repository_root());

    println!("Config:     {}", config.path().display());
    println!(
        "Remote:     {}/{} ({}) on {}",
        settings.remote.account,
        settings.remote.repository,
        settings.remote.branch,
        settings.remote.host
    );
    println!("Repository: {}", status.summary());

    let report_path = super::last_report_path(config);
    if !report_path.exists() {
        println!("No upload has run yet");
        return Ok(());
    }

    let content = fs::read_to_string(&report_path)
        .with_context(|| format!("failed to read {}", report_path.display()))?;
    let report: SyncReport = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", report_path.display()))?;

    println!();
    println!("Last job ({} - {}):", report.started_at, report.finished_at);
    println!("{}", report.summary());
    if let Some(log) = &report.log_path {
        println!("Log: {}", log.display());
    }
    Ok(())
}
