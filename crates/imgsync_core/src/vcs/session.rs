//! A version-control session bound to one working tree.
//!
//! Each call runs exactly one command: optional state repair, launch with the
//! repository root as working directory, live line streaming into the job
//! log, then classification of the exit code.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::logging::JobLogger;

use super::command::VcsCommand;
use super::credentials::{CredentialProvider, NoCredentials};
use super::error::{VcsError, VcsResult};
use super::progress::parse_transfer_rate;
use super::recovery::{index_lock_path, RecoveryAction, RecoveryReport, RepoState};
use super::runner::{CommandRunner, Invocation};

/// Output fragments that make a failed commit count as success.
pub const TOLERATED_COMMIT_OUTPUT: [&str; 3] = [
    "nothing to commit",
    "no changes added",
    "nothing added to commit",
];

/// Callback receiving transfer rates parsed from network command output.
pub type RateCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Outcome of one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsCommandResult {
    /// Command line as logged.
    pub command: String,
    pub exit_code: i32,
    /// Combined stdout/stderr lines in arrival order.
    pub lines: Vec<String>,
    /// Non-zero exit accepted because the output matched a tolerated pattern.
    pub tolerated: bool,
}

impl VcsCommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0 || self.tolerated
    }

    pub fn output(&self) -> String {
        self.lines.join("\n")
    }
}

/// Whether a failed `command` with this output should be treated as success.
pub fn is_tolerated_failure(command: &VcsCommand, lines: &[String]) -> bool {
    command.is_commit()
        && lines.iter().any(|line| {
            let lower = line.to_lowercase();
            TOLERATED_COMMIT_OUTPUT.iter().any(|p| lower.contains(p))
        })
}

/// Runs version-control commands against one working tree.
pub struct VcsSession {
    runner: Arc<dyn CommandRunner>,
    program: String,
    root: PathBuf,
    logger: Arc<JobLogger>,
    credentials: Arc<dyn CredentialProvider>,
    auto_recover: bool,
    on_transfer_rate: Option<RateCallback>,
    recovery: RecoveryReport,
}

impl VcsSession {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        program: impl Into<String>,
        root: impl Into<PathBuf>,
        logger: Arc<JobLogger>,
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            root: root.into(),
            logger,
            credentials: Arc::new(NoCredentials),
            auto_recover: true,
            on_transfer_rate: None,
            recovery: RecoveryReport::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Enable or disable state inspection before each command.
    pub fn with_auto_recover(mut self, enabled: bool) -> Self {
        self.auto_recover = enabled;
        self
    }

    pub fn with_transfer_rate_callback(mut self, callback: RateCallback) -> Self {
        self.on_transfer_rate = Some(callback);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn logger(&self) -> &Arc<JobLogger> {
        &self.logger
    }

    /// Repairs performed so far.
    pub fn recovery_report(&self) -> &RecoveryReport {
        &self.recovery
    }

    pub(crate) fn record_recovery(&mut self, action: RecoveryAction) {
        self.logger.recovery(&action.to_string());
        self.recovery.record(action);
    }

    /// Run a command and fail unless it succeeded (or was tolerated).
    pub fn run(&mut self, command: &VcsCommand) -> VcsResult<VcsCommandResult> {
        let result = self.execute(command)?;
        if result.success() {
            return Ok(result);
        }

        self.logger.show_tail(command.name());
        Err(VcsError::command_failed(
            result.command.clone(),
            result.exit_code,
            result.output(),
        ))
    }

    /// Run a command whose failure is expected in some states
    /// (e.g. removing a remote that does not exist).
    pub fn run_allow_failure(&mut self, command: &VcsCommand) -> VcsResult<VcsCommandResult> {
        let result = self.execute(command)?;
        if !result.success() {
            self.logger.info(&format!(
                "'{}' exited with {} (ignored)",
                command.name(),
                result.exit_code
            ));
        }
        Ok(result)
    }

    /// Stage `paths` with explicit `add` calls of at most `chunk_size` paths.
    pub fn add_paths(&mut self, paths: &[PathBuf], chunk_size: usize) -> VcsResult<()> {
        for chunk in paths.chunks(chunk_size.max(1)) {
            self.run(&VcsCommand::Add {
                paths: chunk.to_vec(),
            })?;
        }
        Ok(())
    }

    /// Run a command without classifying its exit code.
    ///
    /// Only launch failures (and failed repairs) are errors here.
    pub fn execute(&mut self, command: &VcsCommand) -> VcsResult<VcsCommandResult> {
        if self.auto_recover {
            self.recover()?;
        }
        self.launch(command)
    }

    /// Inspect the metadata directory and repair interrupted state.
    ///
    /// Runs no commands when the repository is clean.
    pub fn recover(&mut self) -> VcsResult<()> {
        let state = RepoState::inspect(&self.root);
        if state.is_clean() {
            return Ok(());
        }

        if state.index_lock {
            let lock = index_lock_path(&self.root);
            match fs::remove_file(&lock) {
                Ok(()) => self.record_recovery(RecoveryAction::RemovedIndexLock),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(VcsError::Recovery { path: lock, source }),
            }
        }

        if state.rebase_in_progress {
            self.abort_for_recovery(&VcsCommand::RebaseAbort, RecoveryAction::AbortedRebase)?;
        }

        if state.merge_in_progress {
            self.abort_for_recovery(&VcsCommand::MergeAbort, RecoveryAction::AbortedMerge)?;
        }

        Ok(())
    }

    fn abort_for_recovery(
        &mut self,
        command: &VcsCommand,
        action: RecoveryAction,
    ) -> VcsResult<()> {
        let result = self.launch(command)?;
        if result.success() {
            self.record_recovery(action);
        } else {
            self.logger.warn(&format!(
                "Could not {} (exit code {})",
                command.name(),
                result.exit_code
            ));
        }
        Ok(())
    }

    fn environment(&self, command: &VcsCommand) -> VcsResult<Vec<(String, String)>> {
        let mut env = vec![
            // Never block an unattended job on an interactive prompt.
            ("GIT_TERMINAL_PROMPT".to_string(), "0".to_string()),
            // Tolerated-output matching relies on untranslated messages.
            ("LC_ALL".to_string(), "C".to_string()),
        ];
        if command.is_network() {
            if let Some(credential) = self.credentials.credential()? {
                env.extend(credential.to_env());
            }
        }
        Ok(env)
    }

    fn launch(&mut self, command: &VcsCommand) -> VcsResult<VcsCommandResult> {
        let shown = command.display(&self.program);
        let args = command.args();
        let env = self.environment(command)?;

        self.logger.command(&shown);
        self.logger.clear_tail();
        tracing::debug!("Running {} in {}", shown, self.root.display());

        let mut lines: Vec<String> = Vec::new();
        let network = command.is_network();
        let logger = &self.logger;
        let rate_callback = self.on_transfer_rate.as_ref();

        let invocation = Invocation {
            program: &self.program,
            args: &args,
            cwd: &self.root,
            env: &env,
        };

        let exit_code = self
            .runner
            .run(&invocation, &mut |line: &str| {
                logger.output_line(line);
                if network {
                    if let (Some(callback), Some(rate)) = (rate_callback, parse_transfer_rate(line))
                    {
                        callback(&rate);
                    }
                }
                lines.push(line.to_string());
            })
            .map_err(|source| VcsError::Spawn {
                command: shown.clone(),
                source,
            })?;

        let tolerated = exit_code != 0 && is_tolerated_failure(command, &lines);
        if tolerated {
            self.logger.info("Nothing new to commit, continuing");
        }

        Ok(VcsCommandResult {
            command: shown,
            exit_code,
            lines,
            tolerated,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedRunner;
    use super::*;
    use crate::logging::{LogCallback, LogConfig};
    use crate::vcs::credentials::{Credential, StaticCredentialProvider};
    use parking_lot::Mutex;
    use tempfile::tempdir;

    fn capture() -> (Arc<JobLogger>, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let callback: LogCallback = Box::new(move |l: &str| sink.lock().push(l.to_string()));
        let config = LogConfig {
            show_timestamps: false,
            ..LogConfig::default()
        };
        (
            Arc::new(JobLogger::callback_only("test", config, Some(callback))),
            lines,
        )
    }

    fn session(runner: Arc<ScriptedRunner>, root: &Path) -> (VcsSession, Arc<Mutex<Vec<String>>>) {
        let (logger, lines) = capture();
        (VcsSession::new(runner, "git", root, logger), lines)
    }

    #[test]
    fn nothing_to_commit_is_success() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .rule(|args, _| {
                (args[0] == "commit").then(|| {
                    (
                        1,
                        vec![
                            "On branch main".to_string(),
                            "nothing to commit, working tree clean".to_string(),
                        ],
                    )
                })
            })
            .into_arc();
        let (mut session, _) = session(runner, dir.path());

        let result = session.run(&VcsCommand::commit("Upload cats")).unwrap();
        assert!(result.tolerated);
        assert!(result.success());
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn same_output_on_push_is_failure() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .rule(|_, _| Some((1, vec!["nothing to commit".to_string()])))
            .into_arc();
        let (mut session, _) = session(runner, dir.path());

        let err = session.run(&VcsCommand::push("main")).unwrap_err();
        match err {
            VcsError::CommandFailed {
                command,
                exit_code,
                output,
            } => {
                assert_eq!(command, "git push --progress origin main");
                assert_eq!(exit_code, 1);
                assert_eq!(output, "nothing to commit");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn output_is_logged_live_after_command_line() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .rule(|_, _| Some((0, vec!["one".to_string(), "two".to_string()])))
            .into_arc();
        let (mut session, lines) = session(runner.clone(), dir.path());

        session.run(&VcsCommand::AddAll).unwrap();

        assert_eq!(
            *lines.lock(),
            vec!["$ git add -A", "  [git] one", "  [git] two"]
        );
        assert_eq!(runner.calls()[0].cwd, dir.path());
    }

    #[test]
    fn recovery_runs_only_when_markers_exist() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::new().into_arc();
        let (mut session, lines) = session(runner.clone(), dir.path());

        session.run(&VcsCommand::AddAll).unwrap();
        assert!(session.recovery_report().is_empty());
        assert_eq!(runner.command_lines(), vec!["add -A"]);

        let meta = dir.path().join(".git");
        fs::create_dir_all(meta.join("rebase-merge")).unwrap();
        fs::write(meta.join("index.lock"), b"").unwrap();

        session.run(&VcsCommand::AddAll).unwrap();

        assert!(!meta.join("index.lock").exists());
        assert_eq!(
            runner.command_lines(),
            vec!["add -A", "rebase --abort", "add -A"]
        );
        assert_eq!(
            session.recovery_report().actions,
            vec![RecoveryAction::RemovedIndexLock, RecoveryAction::AbortedRebase]
        );
        let recovery_lines = lines
            .lock()
            .iter()
            .filter(|l| l.starts_with("[RECOVERY]"))
            .count();
        assert_eq!(recovery_lines, 2);
    }

    #[test]
    fn recovery_disabled_inspects_nothing() {
        let dir = tempdir().unwrap();
        let meta = dir.path().join(".git");
        fs::create_dir_all(&meta).unwrap();
        fs::write(meta.join("MERGE_HEAD"), b"abc").unwrap();

        let runner = ScriptedRunner::new().into_arc();
        let (session, _) = session(runner.clone(), dir.path());
        let mut session = session.with_auto_recover(false);

        session.run(&VcsCommand::AddAll).unwrap();
        assert_eq!(runner.command_lines(), vec!["add -A"]);
        assert!(session.recovery_report().is_empty());
    }

    #[test]
    fn credentials_only_reach_network_commands() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::new().into_arc();
        let (session, _) = session(runner.clone(), dir.path());
        let mut session = session.with_credentials(Arc::new(StaticCredentialProvider(
            Credential::new("acct", "tok"),
        )));

        session.run(&VcsCommand::commit("m")).unwrap();
        session.run(&VcsCommand::push("main")).unwrap();

        let calls = runner.calls();
        let has_header = |env: &[(String, String)]| env.iter().any(|(k, _)| k == "GIT_CONFIG_VALUE_0");
        assert!(!has_header(calls[0].env.as_slice()));
        assert!(has_header(calls[1].env.as_slice()));
        assert!(!calls[1].args.iter().any(|a| a.contains("tok")));
    }

    #[test]
    fn transfer_rate_reported_for_push() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .rule(|_, _| {
                Some((
                    0,
                    vec!["Writing objects:  50% (1/2), 1.00 MiB | 3.10 MiB/s".to_string()],
                ))
            })
            .into_arc();
        let rates = Arc::new(Mutex::new(Vec::new()));
        let sink = rates.clone();
        let (session, _) = session(runner, dir.path());
        let mut session = session
            .with_transfer_rate_callback(Box::new(move |r: &str| sink.lock().push(r.to_string())));

        session.run(&VcsCommand::AddAll).unwrap();
        assert!(rates.lock().is_empty());

        session.run(&VcsCommand::push("main")).unwrap();
        assert_eq!(*rates.lock(), vec!["3.10 MiB/s"]);
    }

    #[test]
    fn add_paths_chunks_invocations() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::new().into_arc();
        let (mut session, _) = session(runner.clone(), dir.path());

        let paths: Vec<PathBuf> = (0..5).map(|i| PathBuf::from(format!("c/{i}.png"))).collect();
        session.add_paths(&paths, 2).unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![
                "add -- c/0.png c/1.png",
                "add -- c/2.png c/3.png",
                "add -- c/4.png",
            ]
        );
    }
}
