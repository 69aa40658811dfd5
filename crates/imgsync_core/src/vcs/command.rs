//! Version-control subcommands issued by the sync engine.

use std::ffi::OsString;
use std::path::PathBuf;

/// Remote name used for every network command.
pub const ORIGIN: &str = "origin";

/// How a pull reconciles local and remote history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStrategy {
    /// `--rebase`
    Rebase,
    /// `--no-rebase -X ours`: merge, resolving conflicts in favor of local content.
    PreferLocal,
}

/// One version-control invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCommand {
    Init,
    Config { key: String, value: String },
    RemoteRemove,
    RemoteAdd { url: String },
    CheckoutNewBranch { branch: String },
    BranchRename { branch: String },
    /// Explicit per-path staging. Paths are relative to the repository root.
    Add { paths: Vec<PathBuf> },
    AddAll,
    Commit { message: String, allow_empty: bool },
    Pull { branch: String, strategy: PullStrategy },
    Push { branch: String },
    Clean { excludes: Vec<String> },
    RebaseAbort,
    MergeAbort,
    Reset,
}

impl VcsCommand {
    pub fn config(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn commit(message: impl Into<String>) -> Self {
        Self::Commit {
            message: message.into(),
            allow_empty: false,
        }
    }

    /// Conflict-tolerant pull used before every push.
    pub fn sync_pull(branch: impl Into<String>) -> Self {
        Self::Pull {
            branch: branch.into(),
            strategy: PullStrategy::PreferLocal,
        }
    }

    pub fn push(branch: impl Into<String>) -> Self {
        Self::Push {
            branch: branch.into(),
        }
    }

    /// Command-line arguments, excluding the program name.
    pub fn args(&self) -> Vec<OsString> {
        match self {
            VcsCommand::Init => strs(&["init"]),
            VcsCommand::Config { key, value } => strs(&["config", key.as_str(), value.as_str()]),
            VcsCommand::RemoteRemove => strs(&["remote", "remove", ORIGIN]),
            VcsCommand::RemoteAdd { url } => strs(&["remote", "add", ORIGIN, url.as_str()]),
            VcsCommand::CheckoutNewBranch { branch } => strs(&["checkout", "-b", branch.as_str()]),
            VcsCommand::BranchRename { branch } => strs(&["branch", "-M", branch.as_str()]),
            VcsCommand::Add { paths } => {
                let mut args = strs(&["add", "--"]);
                args.extend(paths.iter().map(|p| p.as_os_str().to_os_string()));
                args
            }
            VcsCommand::AddAll => strs(&["add", "-A"]),
            VcsCommand::Commit {
                message,
                allow_empty,
            } => {
                let mut args = strs(&["commit", "-m", message.as_str()]);
                if *allow_empty {
                    args.push("--allow-empty".into());
                }
                args
            }
            VcsCommand::Pull { branch, strategy } => {
                let mut args = strs(&["pull", ORIGIN, branch.as_str()]);
                match strategy {
                    PullStrategy::Rebase => args.push("--rebase".into()),
                    PullStrategy::PreferLocal => {
                        args.extend(strs(&["--no-rebase", "-X", "ours"]));
                    }
                }
                args
            }
            VcsCommand::Push { branch } => strs(&["push", "--progress", ORIGIN, branch.as_str()]),
            VcsCommand::Clean { excludes } => {
                let mut args = strs(&["clean", "-fd"]);
                for pattern in excludes {
                    args.push("-e".into());
                    args.push(OsString::from(pattern));
                }
                args
            }
            VcsCommand::RebaseAbort => strs(&["rebase", "--abort"]),
            VcsCommand::MergeAbort => strs(&["merge", "--abort"]),
            VcsCommand::Reset => strs(&["reset"]),
        }
    }

    /// Short name of the subcommand, used as the step label in errors.
    pub fn name(&self) -> &'static str {
        match self {
            VcsCommand::Init => "init",
            VcsCommand::Config { .. } => "config",
            VcsCommand::RemoteRemove | VcsCommand::RemoteAdd { .. } => "remote",
            VcsCommand::CheckoutNewBranch { .. } => "checkout",
            VcsCommand::BranchRename { .. } => "branch",
            VcsCommand::Add { .. } | VcsCommand::AddAll => "add",
            VcsCommand::Commit { .. } => "commit",
            VcsCommand::Pull { .. } => "pull",
            VcsCommand::Push { .. } => "push",
            VcsCommand::Clean { .. } => "clean",
            VcsCommand::RebaseAbort => "rebase --abort",
            VcsCommand::MergeAbort => "merge --abort",
            VcsCommand::Reset => "reset",
        }
    }

    /// Whether the command talks to the remote and needs credentials.
    pub fn is_network(&self) -> bool {
        matches!(self, VcsCommand::Pull { .. } | VcsCommand::Push { .. })
    }

    pub fn is_commit(&self) -> bool {
        matches!(self, VcsCommand::Commit { .. })
    }

    /// Human-readable command line for logs.
    ///
    /// Long `add` invocations are abbreviated to keep the log readable.
    pub fn display(&self, program: &str) -> String {
        if let VcsCommand::Add { paths } = self {
            if paths.len() > 3 {
                return format!(
                    "{} add -- {} {} ... ({} files)",
                    program,
                    paths[0].display(),
                    paths[1].display(),
                    paths.len()
                );
            }
        }

        let args: Vec<String> = self
            .args()
            .iter()
            .map(|a| {
                let s = a.to_string_lossy();
                if s.contains(' ') {
                    format!("\"{}\"", s)
                } else {
                    s.to_string()
                }
            })
            .collect();
        format!("{} {}", program, args.join(" "))
    }
}

fn strs(items: &[&str]) -> Vec<OsString> {
    items.iter().map(OsString::from).collect()
}
