use std::process::ExitCode;

use anyhow::{Context, Result};

use imgsync_core::config::ConfigManager;
use imgsync_core::vcs::{self, RepositoryStatus};

fn require_ready(config: &ConfigManager) -> Result<()> {
    let status = RepositoryStatus::check(&config.repository_root());
    if !status.is_ready() {
        anyhow::bail!("{}", status.summary());
    }
    Ok(())
}

/// Commit everything, then remove untracked files.
pub fn clean(config: &ConfigManager, yes: bool) -> Result<ExitCode> {
    require_ready(config)?;

    let excludes = &config.settings().upload.clean_excludes;
    if !yes {
        let question = format!(
            "Delete untracked files in {} (keeping {})?",
            super::display_root(&config.repository_root()),
            excludes.join(", ")
        );
        if !super::confirm(&question)? {
            println!("Aborted");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let mut session = super::session(config, "clean")?;
    vcs::clean(&mut session, excludes).context("cleanup failed")?;
    Ok(ExitCode::SUCCESS)
}

/// Clear a stale index lock and reset the staging area.
pub fn unlock(config: &ConfigManager) -> Result<()> {
    require_ready(config)?;

    let mut session = super::session(config, "unlock")?;
    let actions = vcs::unlock(&mut session).context("unlock failed")?;
    for action in actions {
        println!("  {action}");
    }
    Ok(())
}
