//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Remote repository settings.
    #[serde(default)]
    pub remote: RemoteSettings,

    /// Commit author identity written into the repository.
    #[serde(default)]
    pub identity: IdentitySettings,

    /// Upload/batching behavior.
    #[serde(default)]
    pub upload: UploadSettings,

    /// URL manifest output.
    #[serde(default)]
    pub manifest: ManifestSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for the working tree and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Local working tree of the remote repository.
    #[serde(default = "default_repository_root")]
    pub repository_root: String,

    /// Folder for log files and the last-run report.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_repository_root() -> String {
    ".".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            repository_root: default_repository_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Remote repository configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Account owning the repository.
    #[serde(default)]
    pub account: String,

    /// Repository name.
    #[serde(default)]
    pub repository: String,

    /// Branch to push to.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Git hosting server.
    #[serde(default = "default_host")]
    pub host: String,

    /// Environment variable holding the access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_host() -> String {
    "github.com".to_string()
}

fn default_token_env() -> String {
    "IMGSYNC_TOKEN".to_string()
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            account: String::new(),
            repository: String::new(),
            branch: default_branch(),
            host: default_host(),
            token_env: default_token_env(),
        }
    }
}

/// Author identity applied to the local repository on bootstrap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentitySettings {
    #[serde(default)]
    pub user_name: String,

    #[serde(default)]
    pub user_email: String,
}

/// What to do with a queued folder that contains no images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyFolderPolicy {
    /// Report the folder and continue with the rest of the queue.
    #[default]
    Skip,
    /// Fail the whole job.
    Abort,
}

/// Upload and batching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Maximum images per commit/push cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum paths passed to a single `add` invocation.
    #[serde(default = "default_add_chunk_size")]
    pub add_chunk_size: usize,

    /// Handling of folders without images.
    #[serde(default)]
    pub empty_folder_policy: EmptyFolderPolicy,

    /// Detect and repair interrupted repository state before each command.
    #[serde(default = "default_true")]
    pub auto_recover: bool,

    /// Version-control executable.
    #[serde(default = "default_vcs_program")]
    pub vcs_program: String,

    /// Patterns written to the ignore-list file on bootstrap.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Patterns preserved by the cleanup command.
    #[serde(default = "default_clean_excludes")]
    pub clean_excludes: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    500
}

fn default_add_chunk_size() -> usize {
    100
}

fn default_vcs_program() -> String {
    "git".to_string()
}

fn default_ignore_patterns() -> Vec<String> {
    ["*.exe", ".config/", ".logs/", "*.xlsx", "*.py", ".gitignore"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_clean_excludes() -> Vec<String> {
    ["*.exe", ".config/", ".logs/"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            add_chunk_size: default_add_chunk_size(),
            empty_folder_policy: EmptyFolderPolicy::default(),
            auto_recover: true,
            vcs_program: default_vcs_program(),
            ignore_patterns: default_ignore_patterns(),
            clean_excludes: default_clean_excludes(),
        }
    }
}

/// URL manifest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSettings {
    /// CDN host serving repository files.
    #[serde(default = "default_cdn_host")]
    pub cdn_host: String,

    /// Pin URLs to the configured branch (`repo@branch`).
    #[serde(default)]
    pub pin_branch: bool,

    /// Suffix appended to the folder name for the manifest file.
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Header of the name column.
    #[serde(default = "default_name_header")]
    pub name_header: String,

    /// Header of the placeholder column.
    #[serde(default = "default_placeholder_header")]
    pub placeholder_header: String,

    /// Header of the URL column.
    #[serde(default = "default_url_header")]
    pub url_header: String,
}

fn default_cdn_host() -> String {
    "cdn.jsdelivr.net".to_string()
}

fn default_suffix() -> String {
    "_urls".to_string()
}

fn default_name_header() -> String {
    "name".to_string()
}

fn default_placeholder_header() -> String {
    "placeholder".to_string()
}

fn default_url_header() -> String {
    "url".to_string()
}

impl Default for ManifestSettings {
    fn default() -> Self {
        Self {
            cdn_host: default_cdn_host(),
            pin_branch: false,
            suffix: default_suffix(),
            name_header: default_name_header(),
            placeholder_header: default_placeholder_header(),
            url_header: default_url_header(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for application logs.
    #[serde(default)]
    pub level: LogLevel,

    /// Prefix job log lines with the wall-clock time.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,

    /// Number of tool output lines replayed on failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: usize,
}

fn default_error_tail() -> usize {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            show_timestamps: true,
            error_tail: default_error_tail(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Remote,
    Identity,
    Upload,
    Manifest,
    Logging,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 6] = [
        ConfigSection::Paths,
        ConfigSection::Remote,
        ConfigSection::Identity,
        ConfigSection::Upload,
        ConfigSection::Manifest,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Remote => "remote",
            ConfigSection::Identity => "identity",
            ConfigSection::Upload => "upload",
            ConfigSection::Manifest => "manifest",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section in generated files.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Working tree and log locations",
            ConfigSection::Remote => "Remote repository the images are pushed to",
            ConfigSection::Identity => "Commit author written into the repository config",
            ConfigSection::Upload => "Batching and repository maintenance",
            ConfigSection::Manifest => "CDN URL spreadsheet output",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}
