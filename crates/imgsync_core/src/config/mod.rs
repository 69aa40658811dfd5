//! Configuration management for imgsync.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use imgsync_core::config::{ConfigManager, ConfigSection};
//!
//! // Create manager and load (or create default) config
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! // Read settings
//! println!("Repository: {}", config.settings().paths.repository_root);
//!
//! // Modify a setting
//! config.settings_mut().upload.batch_size = 200;
//!
//! // Save just the upload section atomically
//! config.update_section(ConfigSection::Upload).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EmptyFolderPolicy, IdentitySettings, LoggingSettings, ManifestSettings,
    PathSettings, RemoteSettings, Settings, UploadSettings,
};
