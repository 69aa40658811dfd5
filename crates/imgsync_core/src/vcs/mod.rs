//! Version-control plumbing.
//!
//! All interaction with the external tool goes through [`VcsSession`], which
//! runs one [`VcsCommand`] at a time via a [`CommandRunner`]:
//!
//! ```text
//! VcsSession::run(command)
//!     ├── recover()          stale lock / interrupted rebase / merge
//!     ├── CommandRunner::run  combined output streamed line by line
//!     └── classify            exit code, tolerated commit output
//! ```
//!
//! Maintenance operations (bootstrap, clean, unlock) are built on the same
//! session so they share logging and recovery.

mod command;
mod credentials;
mod error;
mod maintenance;
mod progress;
mod recovery;
mod runner;
mod session;

pub use command::{PullStrategy, VcsCommand, ORIGIN};
pub use credentials::{
    Credential, CredentialError, CredentialProvider, EnvCredentialProvider, NoCredentials,
    StaticCredentialProvider,
};
pub use error::{VcsError, VcsResult};
pub use maintenance::{
    bootstrap, clean, unlock, write_ignore_file, BootstrapOptions, RepositoryStatus,
    CLEAN_COMMIT_MESSAGE, IGNORE_FILE,
};
pub use progress::parse_transfer_rate;
pub use recovery::{index_lock_path, RecoveryAction, RecoveryReport, RepoState, METADATA_DIR};
pub use runner::{split_lines, CommandRunner, Invocation, ProcessRunner};
pub use session::{
    is_tolerated_failure, RateCallback, VcsCommandResult, VcsSession, TOLERATED_COMMIT_OUTPUT,
};

#[cfg(test)]
pub(crate) use session::testing;
