pub mod init;
pub mod maintenance;
pub mod status;
pub mod upload;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use imgsync_core::config::{ConfigManager, Settings};
use imgsync_core::logging::{JobLogger, LogCallback, LogConfig};
use imgsync_core::vcs::{CredentialProvider, EnvCredentialProvider, ProcessRunner, VcsSession};

/// Last job report, written into the logs folder after every upload.
pub const LAST_REPORT_FILE: &str = "last_report.json";

pub fn last_report_path(config: &ConfigManager) -> PathBuf {
    config.logs_folder().join(LAST_REPORT_FILE)
}

/// Token from the configured environment variable, sent as the account user.
pub fn credentials(settings: &Settings) -> Arc<dyn CredentialProvider> {
    Arc::new(EnvCredentialProvider::new(
        &settings.remote.token_env,
        &settings.remote.account,
    ))
}

/// Session for a one-off maintenance command, logging to stdout and
/// `<logs>/<name>.log`.
pub fn session(config: &ConfigManager, name: &str) -> Result<VcsSession> {
    let settings = config.settings();
    let callback: LogCallback = Box::new(|line: &str| println!("{line}"));
    let logger = JobLogger::new(
        name,
        config.logs_folder(),
        LogConfig::from_settings(&settings.logging),
        Some(callback),
    )
    .with_context(|| format!("failed to create log in {}", config.logs_folder().display()))?;

    Ok(VcsSession::new(
        Arc::new(ProcessRunner),
        &settings.upload.vcs_program,
        config.repository_root(),
        Arc::new(logger),
    )
    .with_credentials(credentials(settings))
    .with_auto_recover(settings.upload.auto_recover))
}

/// Ask a yes/no question on stdin. Anything but `y`/`yes` is a no.
pub fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

pub fn require_remote(config: &ConfigManager) -> Result<()> {
    let remote = &config.settings().remote;
    if remote.account.is_empty() || remote.repository.is_empty() {
        anyhow::bail!(
            "remote.account and remote.repository must be set in {}",
            config.path().display()
        );
    }
    Ok(())
}

pub fn display_root(root: &Path) -> String {
    root.canonicalize()
        .unwrap_or_else(|_| root.to_path_buf())
        .display()
        .to_string()
}
