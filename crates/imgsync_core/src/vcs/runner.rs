//! Process boundary for version-control invocations.
//!
//! `ProcessRunner` spawns the real tool; tests substitute a scripted runner.

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};

/// Everything needed to launch one command.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub program: &'a str,
    pub args: &'a [OsString],
    pub cwd: &'a Path,
    /// Extra environment variables for the child process.
    pub env: &'a [(String, String)],
}

/// Runs an external command, streaming its combined output.
pub trait CommandRunner: Send + Sync {
    /// Run to completion, calling `on_line` for every output line as it
    /// arrives, and return the exit code.
    ///
    /// The exit code is read only after the output stream is fully drained.
    /// Processes killed by a signal report `-1`.
    fn run(&self, invocation: &Invocation<'_>, on_line: &mut dyn FnMut(&str)) -> io::Result<i32>;
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation<'_>, on_line: &mut dyn FnMut(&str)) -> io::Result<i32> {
        // One pipe behind both stdout and stderr keeps lines in the order
        // the child wrote them.
        let (reader, writer) = io::pipe()?;
        let error_writer = writer.try_clone()?;

        let mut cmd = Command::new(invocation.program);
        cmd.args(invocation.args)
            .current_dir(invocation.cwd)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(error_writer);
        for (key, value) in invocation.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn()?;
        // The command keeps its copies of the write ends open until dropped,
        // and the reader only sees EOF once every write end is closed.
        drop(cmd);

        let drained = split_lines(reader, |line: &str| on_line(line));
        let status = child.wait()?;
        drained?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// Read `reader` to exhaustion, calling `emit` per line.
///
/// Both `\n` and `\r` terminate a line, so carriage-return progress updates
/// arrive as separate lines. Empty lines are skipped. Invalid UTF-8 is
/// replaced rather than rejected.
pub fn split_lines<R: Read>(mut reader: R, mut emit: impl FnMut(&str)) -> io::Result<()> {
    let mut chunk = [0u8; 8192];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        for &byte in &chunk[..n] {
            if byte == b'\n' || byte == b'\r' {
                flush_line(&mut pending, &mut emit);
            } else {
                pending.push(byte);
            }
        }
    }

    flush_line(&mut pending, &mut emit);
    Ok(())
}

fn flush_line(pending: &mut Vec<u8>, emit: &mut impl FnMut(&str)) {
    if pending.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(pending);
    let trimmed = line.trim_end();
    if !trimmed.is_empty() {
        emit(trimmed);
    }
    pending.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        split_lines(input, |l| lines.push(l.to_string())).unwrap();
        lines
    }

    #[test]
    fn splits_on_newlines_and_carriage_returns() {
        let input = b"Enumerating objects: 5, done.\nWriting objects:  50% (1/2)\rWriting objects: 100% (2/2), done.\r\nTotal 2";
        assert_eq!(
            collect(input),
            vec![
                "Enumerating objects: 5, done.",
                "Writing objects:  50% (1/2)",
                "Writing objects: 100% (2/2), done.",
                "Total 2",
            ]
        );
    }

    #[test]
    fn lossy_on_invalid_utf8() {
        let lines = collect(b"caf\xff\n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("caf"));
    }

    #[test]
    fn empty_input_emits_nothing() {
        assert!(collect(b"").is_empty());
        assert!(collect(b"\n\r\n").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_merges_streams_and_reports_exit() {
        let dir = tempfile::tempdir().unwrap();
        let args: Vec<OsString> = vec!["-c".into(), "echo out; echo err 1>&2; exit 3".into()];
        let invocation = Invocation {
            program: "sh",
            args: &args,
            cwd: dir.path(),
            env: &[],
        };

        let mut lines = Vec::new();
        let code = ProcessRunner
            .run(&invocation, &mut |l: &str| lines.push(l.to_string()))
            .unwrap();

        assert_eq!(code, 3);
        assert_eq!(lines, vec!["out", "err"]);
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_keeps_interleaved_stream_order() {
        let dir = tempfile::tempdir().unwrap();
        let script = "for i in $(seq 1 300); do echo o$i; echo e$i 1>&2; done";
        let args: Vec<OsString> = vec!["-c".into(), script.into()];
        let invocation = Invocation {
            program: "sh",
            args: &args,
            cwd: dir.path(),
            env: &[],
        };

        let mut lines = Vec::new();
        let code = ProcessRunner
            .run(&invocation, &mut |l: &str| lines.push(l.to_string()))
            .unwrap();

        let expected: Vec<String> = (1..=300)
            .flat_map(|i| [format!("o{i}"), format!("e{i}")])
            .collect();
        assert_eq!(code, 0);
        assert_eq!(lines, expected);
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = Invocation {
            program: "imgsync-no-such-tool",
            args: &[],
            cwd: dir.path(),
            env: &[],
        };
        let result = ProcessRunner.run(&invocation, &mut |_: &str| {});
        assert!(result.is_err());
    }
}
