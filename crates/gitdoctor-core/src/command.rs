//! Common interface for executing git command lines.
//!
//! Every external interaction in this crate is a single subprocess
//! invocation, described by a [`CommandLine`] and dispatched through the
//! [`CommandRunner`] trait. Probes and checks depend only on the trait, so
//! they can be exercised against a fake runner returning canned output
//! instead of spawning git.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DoctorError, Result};
use crate::report;

/// A literal command line plus display flags.
///
/// The line is split on whitespace only; arguments containing spaces are
/// not representable. None of the command templates this tool issues need
/// quoting, so the limitation is acceptable and documented here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    line: String,
    echo: bool,
    cwd: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            echo: false,
            cwd: None,
        }
    }

    /// Display a dimmed `$ <line>` on stderr before running.
    pub fn echoed(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Pin the child's working directory, overriding the runner's default.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn echo(&self) -> bool {
        self.echo
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Program name and argument list, split on whitespace.
    fn argv(&self) -> Result<(&str, Vec<&str>)> {
        let mut parts = self.line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| DoctorError::Git("empty command line".to_string()))?;
        Ok((program, parts.collect()))
    }
}

/// Exit code and captured output of one finished subprocess.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Execution {
    /// Child exit code; non-zero is a normal result for many probes.
    pub code: i32,

    /// Captured stdout, split into UTF-8 lines.
    pub stdout: Vec<String>,

    /// Captured stderr, split into UTF-8 lines.
    pub stderr: Vec<String>,
}

impl Execution {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Where a child's stdout/stderr go when the caller does not capture them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Child streams are inherited from this process (verbose runs).
    Inherit,
    /// Child streams are discarded.
    Discard,
}

/// The single execution seam probes and checks depend on.
///
/// Both operations run the child to completion before returning; there is
/// no parallelism, no timeout, and no retry anywhere in this tool.
pub trait CommandRunner {
    /// Run a command, inheriting or discarding child output, and return its
    /// exit code. A non-zero exit is a normal outcome, not an error; only a
    /// failure to launch the process is.
    fn execute(&self, cmd: &CommandLine, output: OutputMode) -> Result<i32>;

    /// Run a command with both streams captured as UTF-8 lines.
    fn capture(&self, cmd: &CommandLine) -> Result<Execution>;
}

/// Real runner over [`std::process::Command`].
///
/// Children inherit this runner's working directory unless the command
/// pins its own via [`CommandLine::in_dir`].
#[derive(Debug, Default)]
pub struct SystemRunner {
    dir: Option<PathBuf>,
}

impl SystemRunner {
    /// Runner whose children inherit the process working directory.
    pub fn new() -> Self {
        Self { dir: None }
    }

    /// Runner whose children run in `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    fn build(&self, cmd: &CommandLine) -> Result<Command> {
        let (program, args) = cmd.argv()?;
        let mut child = Command::new(program);
        child.args(args);
        if let Some(dir) = cmd.cwd().or(self.dir.as_deref()) {
            child.current_dir(dir);
        }
        if cmd.echo() {
            report::echo_command(cmd.line());
        }
        debug!(command = %cmd.line(), "spawning subprocess");
        Ok(child)
    }
}

impl CommandRunner for SystemRunner {
    fn execute(&self, cmd: &CommandLine, output: OutputMode) -> Result<i32> {
        let mut child = self.build(cmd)?;
        match output {
            OutputMode::Inherit => {
                child.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputMode::Discard => {
                child.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }
        let status = child.status().map_err(|source| DoctorError::Launch {
            command: cmd.line().to_string(),
            source,
        })?;
        let code = status.code().unwrap_or(1);
        debug!(command = %cmd.line(), code, "subprocess finished");
        Ok(code)
    }

    fn capture(&self, cmd: &CommandLine) -> Result<Execution> {
        let output = self
            .build(cmd)?
            .output()
            .map_err(|source| DoctorError::Launch {
                command: cmd.line().to_string(),
                source,
            })?;
        let execution = Execution {
            code: output.status.code().unwrap_or(1),
            stdout: split_lines(&output.stdout),
            stderr: split_lines(&output.stderr),
        };
        debug!(command = %cmd.line(), code = execution.code, "subprocess finished");
        Ok(execution)
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Canned-output runner for exercising probes and checks without git.

    use std::cell::RefCell;

    use super::*;

    /// Replays canned [`Execution`]s keyed by command-line prefix (first
    /// match wins) and records every line it was asked to run. Unmatched
    /// commands get the expected-negative outcome: exit 1, no output.
    pub(crate) struct FakeRunner {
        canned: Vec<(String, Execution)>,
        pub(crate) calls: RefCell<Vec<String>>,
    }

    impl FakeRunner {
        pub(crate) fn new() -> Self {
            Self {
                canned: Vec::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn respond(mut self, prefix: &str, execution: Execution) -> Self {
            self.canned.push((prefix.to_string(), execution));
            self
        }

        pub(crate) fn respond_stdout(self, prefix: &str, lines: &[&str]) -> Self {
            self.respond(prefix, exec_ok(lines))
        }

        fn lookup(&self, line: &str) -> Execution {
            self.calls.borrow_mut().push(line.to_string());
            self.canned
                .iter()
                .find(|(prefix, _)| line.starts_with(prefix.as_str()))
                .map(|(_, execution)| execution.clone())
                .unwrap_or(Execution {
                    code: 1,
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                })
        }

        pub(crate) fn ran(&self, prefix: &str) -> bool {
            self.calls
                .borrow()
                .iter()
                .any(|line| line.starts_with(prefix))
        }
    }

    impl CommandRunner for FakeRunner {
        fn execute(&self, cmd: &CommandLine, _output: OutputMode) -> Result<i32> {
            Ok(self.lookup(cmd.line()).code)
        }

        fn capture(&self, cmd: &CommandLine) -> Result<Execution> {
            Ok(self.lookup(cmd.line()))
        }
    }

    /// Successful execution with the given stdout lines.
    pub(crate) fn exec_ok(lines: &[&str]) -> Execution {
        Execution {
            code: 0,
            stdout: lines.iter().map(|l| l.to_string()).collect(),
            stderr: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argv_splits_on_whitespace_only() {
        let cmd = CommandLine::new("git  ls-files   --cached");
        let (program, args) = cmd.argv().unwrap();
        assert_eq!(program, "git");
        assert_eq!(args, vec!["ls-files", "--cached"]);
    }

    #[test]
    fn test_empty_command_line_is_an_error() {
        let cmd = CommandLine::new("   ");
        assert!(cmd.argv().is_err());
    }

    #[test]
    fn test_execution_success() {
        assert!(Execution::default().success());
        let failed = Execution {
            code: 1,
            ..Execution::default()
        };
        assert!(!failed.success());
    }

    #[test]
    fn test_execution_serde_roundtrip() {
        let execution = Execution {
            code: 128,
            stdout: vec!["refs/tags/v1".to_string()],
            stderr: vec!["fatal: not a git repository".to_string()],
        };

        let json = serde_json::to_string(&execution).expect("serialize");
        let back: Execution = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(execution, back);
    }

    #[test]
    fn test_system_runner_captures_git_version() {
        let runner = SystemRunner::new();
        let run = runner
            .capture(&CommandLine::new("git --version"))
            .expect("git must be installed to run the test suite");
        assert_eq!(run.code, 0);
        assert!(run.stdout[0].starts_with("git version"));
    }

    #[test]
    fn test_system_runner_launch_failure_is_reported() {
        let runner = SystemRunner::new();
        let err = runner
            .capture(&CommandLine::new("git-doctor-no-such-binary --version"))
            .unwrap_err();
        assert!(matches!(err, DoctorError::Launch { .. }));
    }
}
