//! Thin queries against the current repository.
//!
//! Each probe is a single git invocation with a narrow output contract,
//! except [`size_in_bytes`], which is a plain filesystem walk. Probes
//! re-query git on every call; nothing is cached between them.

use std::path::PathBuf;

use walkdir::WalkDir;

use crate::command::{CommandLine, CommandRunner, OutputMode};
use crate::error::{DoctorError, Result};

/// Which part of the repository a size measurement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The work tree and the metadata store.
    Everything,
    /// Only the `.git` metadata store.
    MetadataOnly,
}

/// Return true if git is installed.
///
/// A failed launch means git is probably not on PATH. That is an expected,
/// user-correctable condition, so it maps to `false` instead of an error —
/// the only place in this crate where a launch failure is downgraded.
pub fn git_available(runner: &dyn CommandRunner) -> bool {
    runner
        .execute(&CommandLine::new("git --version"), OutputMode::Discard)
        .map(|code| code == 0)
        .unwrap_or(false)
}

/// Return true if the working directory is inside the work tree of a
/// repository.
///
/// Being inside the work tree (and not, say, inside `.git/`) matters:
/// several checks list files relative to it and would silently come up
/// empty elsewhere.
pub fn is_inside_work_tree(runner: &dyn CommandRunner) -> bool {
    let cmd = CommandLine::new("git rev-parse --is-inside-work-tree");
    match runner.capture(&cmd) {
        Ok(run) => {
            run.success()
                && run
                    .stdout
                    .iter()
                    .any(|line| line.to_lowercase().contains("true"))
        }
        Err(_) => false,
    }
}

/// Return the absolute path to the root of the current repository.
pub fn absolute_path(runner: &dyn CommandRunner) -> Result<PathBuf> {
    let cmd = CommandLine::new("git rev-parse --show-toplevel");
    let run = runner.capture(&cmd)?;
    if !run.success() {
        return Err(DoctorError::Git(format!(
            "`{}` exited with status {}",
            cmd.line(),
            run.code
        )));
    }
    let path = run
        .stdout
        .first()
        .map(|line| line.trim())
        .unwrap_or_default();
    if path.is_empty() {
        return Err(DoctorError::Git(
            "`git rev-parse --show-toplevel` produced no path".to_string(),
        ));
    }
    Ok(PathBuf::from(path))
}

/// Return the size (in bytes) of the current repository.
///
/// Sums regular file sizes under the repository root, or under `.git`
/// only for [`Scope::MetadataOnly`]. Symbolic links are skipped so the
/// walk neither follows loops nor double-counts link targets.
pub fn size_in_bytes(runner: &dyn CommandRunner, scope: Scope) -> Result<u64> {
    let mut path = absolute_path(runner)?;
    if scope == Scope::MetadataOnly {
        path.push(".git");
    }

    let mut total = 0u64;
    for entry in WalkDir::new(&path)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        if entry.path_is_symlink() || !entry.file_type().is_file() {
            continue;
        }
        if let Ok(metadata) = entry.metadata() {
            total += metadata.len();
        }
    }
    Ok(total)
}

/// Return the default remote, if any.
///
/// Biased toward the first remote `git remote` lists; this could be the
/// wrong one in a multi-remote repository, but it is the policy the tool
/// has always had.
pub fn default_remote(runner: &dyn CommandRunner) -> Result<Option<String>> {
    let cmd = CommandLine::new("git remote");
    let run = runner.capture(&cmd)?;
    if !run.success() {
        return Err(DoctorError::Git(format!(
            "`git remote` exited with status {}",
            run.code
        )));
    }
    Ok(run
        .stdout
        .iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .map(str::to_string))
}

/// Return the name of the default branch on a remote.
///
/// Parsed from the `HEAD branch:` line of `git remote show`; a response
/// without that marker is malformed and fatal, not a recoverable state.
pub fn default_branch(runner: &dyn CommandRunner, remote: &str) -> Result<String> {
    let cmd = CommandLine::new(format!("git remote show {remote}"));
    let run = runner.capture(&cmd)?;
    if !run.success() {
        return Err(DoctorError::Git(format!(
            "`git remote show {remote}` exited with status {}",
            run.code
        )));
    }

    const MARKER: &str = "HEAD branch:";
    run.stdout
        .iter()
        .find_map(|line| line.split_once(MARKER))
        .map(|(_, name)| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| DoctorError::MissingHeadBranch {
            remote: remote.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::{exec_ok, FakeRunner};
    use crate::command::{Execution, SystemRunner};
    use std::path::Path;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }

    #[test]
    fn test_git_available() {
        let runner = SystemRunner::new();
        assert!(git_available(&runner));
    }

    #[test]
    fn test_is_inside_work_tree_true_for_repo() {
        let repo = make_git_repo();
        let runner = SystemRunner::in_dir(repo.path());
        assert!(is_inside_work_tree(&runner));
    }

    #[test]
    fn test_is_inside_work_tree_false_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SystemRunner::in_dir(dir.path());
        assert!(!is_inside_work_tree(&runner));
    }

    #[test]
    fn test_is_inside_work_tree_false_inside_metadata_dir() {
        let repo = make_git_repo();
        let runner = SystemRunner::in_dir(repo.path().join(".git"));
        assert!(!is_inside_work_tree(&runner));
    }

    #[test]
    fn test_absolute_path_resolves_root_from_subdirectory() {
        let repo = make_git_repo();
        let nested = repo.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();

        let runner = SystemRunner::in_dir(&nested);
        let root = absolute_path(&runner).unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            repo.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_absolute_path_fails_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SystemRunner::in_dir(dir.path());
        assert!(absolute_path(&runner).is_err());
    }

    #[test]
    fn test_size_metadata_is_at_most_everything() {
        let repo = make_git_repo();
        std::fs::write(repo.path().join("data.bin"), vec![0u8; 4096]).unwrap();

        let runner = SystemRunner::in_dir(repo.path());
        let metadata = size_in_bytes(&runner, Scope::MetadataOnly).unwrap();
        let everything = size_in_bytes(&runner, Scope::Everything).unwrap();
        assert!(metadata > 0);
        assert!(everything >= metadata + 4096);
    }

    #[cfg(unix)]
    #[test]
    fn test_size_skips_symlinks() {
        let repo = make_git_repo();
        std::fs::write(repo.path().join("data.bin"), vec![0u8; 8192]).unwrap();
        std::os::unix::fs::symlink(
            repo.path().join("data.bin"),
            repo.path().join("data-link.bin"),
        )
        .unwrap();

        let runner = SystemRunner::in_dir(repo.path());
        let with_link = size_in_bytes(&runner, Scope::Everything).unwrap();
        std::fs::remove_file(repo.path().join("data-link.bin")).unwrap();
        let without_link = size_in_bytes(&runner, Scope::Everything).unwrap();
        assert_eq!(with_link, without_link);
    }

    #[test]
    fn test_default_remote_none_for_fresh_repo() {
        let repo = make_git_repo();
        let runner = SystemRunner::in_dir(repo.path());
        assert_eq!(default_remote(&runner).unwrap(), None);
    }

    #[test]
    fn test_default_remote_is_first_listed() {
        let repo = make_git_repo();
        run_git(repo.path(), &["remote", "add", "upstream", "../nowhere-a"]);
        run_git(repo.path(), &["remote", "add", "origin", "../nowhere-b"]);

        let runner = SystemRunner::in_dir(repo.path());
        // `git remote` lists alphabetically; the bias picks whatever comes first.
        assert_eq!(default_remote(&runner).unwrap().as_deref(), Some("origin"));
    }

    #[test]
    fn test_default_branch_parses_head_marker() {
        let runner = FakeRunner::new().respond_stdout(
            "git remote show origin",
            &[
                "* remote origin",
                "  Fetch URL: ../origin.git",
                "  HEAD branch: main",
            ],
        );
        assert_eq!(default_branch(&runner, "origin").unwrap(), "main");
    }

    #[test]
    fn test_default_branch_missing_marker_is_fatal() {
        let runner = FakeRunner::new()
            .respond_stdout("git remote show origin", &["* remote origin"]);
        let err = default_branch(&runner, "origin").unwrap_err();
        assert!(matches!(err, DoctorError::MissingHeadBranch { .. }));
    }

    #[test]
    fn test_inside_work_tree_requires_literal_true() {
        let runner =
            FakeRunner::new().respond_stdout("git rev-parse --is-inside-work-tree", &["false"]);
        assert!(!is_inside_work_tree(&runner));

        let runner =
            FakeRunner::new().respond_stdout("git rev-parse --is-inside-work-tree", &["TRUE"]);
        assert!(is_inside_work_tree(&runner));
    }

    #[test]
    fn test_inside_work_tree_nonzero_exit_is_false() {
        let runner = FakeRunner::new().respond(
            "git rev-parse --is-inside-work-tree",
            Execution {
                code: 128,
                stdout: vec!["true".to_string()],
                stderr: Vec::new(),
            },
        );
        assert!(!is_inside_work_tree(&runner));
    }

    #[test]
    fn test_default_remote_trims_entries() {
        let runner = FakeRunner::new().respond(
            "git remote",
            exec_ok(&["  origin  ", "upstream"]),
        );
        assert_eq!(default_remote(&runner).unwrap().as_deref(), Some("origin"));
    }
}
