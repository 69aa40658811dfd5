use anyhow::{Context, Result};

use imgsync_core::config::ConfigManager;
use imgsync_core::vcs::{bootstrap, BootstrapOptions};

/// Bootstrap the configured working tree. Safe to repeat.
pub fn run(config: &ConfigManager) -> Result<()> {
    super::require_remote(config)?;

    let options = BootstrapOptions::from_settings(config.settings());
    let mut session = super::session(config, "init")?;
    bootstrap(&mut session, &options).context("repository bootstrap failed")?;

    println!(
        "Repository ready at {} (remote {}, branch {})",
        super::display_root(session.root()),
        options.remote_url,
        options.branch
    );
    Ok(())
}
