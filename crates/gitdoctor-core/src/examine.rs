//! Listing probes that gather the evidence diagnostics are built from.
//!
//! Every function here issues one or more git invocations and normalizes
//! their line-oriented output. A probe exiting non-zero is the expected
//! "nothing to report" outcome and yields an empty listing; only launch
//! failures and parser contract violations are errors.

use std::collections::HashSet;

use crate::command::{CommandLine, CommandRunner, OutputMode};
use crate::error::{DoctorError, Result};
use crate::repo;

/// How many paths one `git check-ignore` invocation may carry. Command
/// lines have a bounded length, so large listings are resolved in chunks.
const CHECK_IGNORE_CHUNK: usize = 1024;

/// Outcome of the full consistency verification.
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    /// True iff fsck exited zero and reported no issue lines.
    pub clean: bool,

    /// Raw issue lines from fsck's diagnostic stream.
    pub issues: Vec<String>,
}

/// Verify the repository's internal consistency.
pub fn check_integrity(runner: &dyn CommandRunner, verbose: bool) -> Result<IntegrityReport> {
    let cmd = CommandLine::new("git fsck --full --strict --no-progress").echoed(verbose);
    let run = runner.capture(&cmd)?;
    let issues: Vec<String> = run
        .stderr
        .iter()
        .filter(|line| !line.trim().is_empty())
        .cloned()
        .collect();
    Ok(IntegrityReport {
        clean: run.success() && issues.is_empty(),
        issues,
    })
}

/// List objects no reference can reach, one line per object.
pub fn find_unreachable_objects(runner: &dyn CommandRunner, verbose: bool) -> Result<Vec<String>> {
    let cmd = CommandLine::new("git fsck --unreachable --no-progress").echoed(verbose);
    let run = runner.capture(&cmd)?;
    if !run.success() {
        return Ok(Vec::new());
    }
    Ok(nonempty_lines(run.stdout))
}

/// Return true if a README-prefixed file is tracked at the repository root.
///
/// The listing runs with the child's working directory pinned to the root,
/// so invoking the doctor from a nested directory does not miss root-level
/// files. The `README` prefix match is case-sensitive by design.
pub fn contains_readme(runner: &dyn CommandRunner, verbose: bool) -> Result<bool> {
    let root = repo::absolute_path(runner)?;
    let cmd = CommandLine::new("git ls-files README*")
        .in_dir(root)
        .echoed(verbose);
    let run = runner.capture(&cmd)?;
    Ok(run.success() && run.stdout.iter().any(|line| !line.trim().is_empty()))
}

/// List tracked files that also match an ignore rule.
pub fn find_unwanted_files(runner: &dyn CommandRunner, verbose: bool) -> Result<Vec<String>> {
    let cmd =
        CommandLine::new("git ls-files --cached --ignored --exclude-standard").echoed(verbose);
    let run = runner.capture(&cmd)?;
    if !run.success() {
        return Ok(Vec::new());
    }
    Ok(nonempty_lines(run.stdout))
}

/// List files, tracked or not, that match an ignore rule.
pub fn find_excluded_files(runner: &dyn CommandRunner, verbose: bool) -> Result<Vec<String>> {
    let cmd = CommandLine::new("git ls-files --cached --others --ignored --exclude-standard")
        .echoed(verbose);
    let run = runner.capture(&cmd)?;
    if !run.success() {
        return Ok(Vec::new());
    }
    Ok(nonempty_lines(run.stdout))
}

/// Resolve the exclusion source of each path to `source:line` form.
///
/// Results come back in input order, one per path; a count mismatch would
/// desynchronize evidence from the files it describes and is therefore an
/// unrecoverable error rather than a partial answer. Only the first
/// chunk's invocation is echoed under verbose display.
pub fn exclusion_sources(
    runner: &dyn CommandRunner,
    files: &[String],
    verbose: bool,
) -> Result<Vec<String>> {
    let mut sources = Vec::with_capacity(files.len());
    for (index, chunk) in files.chunks(CHECK_IGNORE_CHUNK).enumerate() {
        let line = format!("git check-ignore --verbose {}", chunk.join(" "));
        let cmd = CommandLine::new(line).echoed(verbose && index == 0);
        let run = runner.capture(&cmd)?;
        for line in run.stdout.iter().filter(|line| !line.trim().is_empty()) {
            sources.push(parse_exclusion_source(line)?);
        }
    }

    if sources.len() != files.len() {
        return Err(DoctorError::ExclusionSourceMismatch {
            asked: files.len(),
            resolved: sources.len(),
        });
    }
    Ok(sources)
}

/// Parse one `source:line:pattern<TAB>path` line down to `source:line`.
fn parse_exclusion_source(line: &str) -> Result<String> {
    let fields = line.split('\t').next().unwrap_or(line);
    let mut parts = fields.splitn(3, ':');
    match (parts.next(), parts.next()) {
        (Some(source), Some(number)) if !source.is_empty() && !number.is_empty() => {
            Ok(format!("{source}:{number}"))
        }
        _ => Err(DoctorError::Git(format!(
            "unparseable check-ignore line: {line}"
        ))),
    }
}

/// Return true if `path` is tracked.
pub fn is_file_tracked(runner: &dyn CommandRunner, path: &str, verbose: bool) -> Result<bool> {
    let cmd = CommandLine::new(format!("git ls-files --error-unmatch {path}")).echoed(verbose);
    Ok(runner.execute(&cmd, OutputMode::Discard)? == 0)
}

/// List local tags.
pub fn find_local_tags(runner: &dyn CommandRunner, verbose: bool) -> Result<Vec<String>> {
    let cmd = CommandLine::new("git tag --list").echoed(verbose);
    let run = runner.capture(&cmd)?;
    if !run.success() {
        return Ok(Vec::new());
    }
    Ok(nonempty_lines(run.stdout))
}

/// List tag names on a remote.
///
/// Each listing line is `commit<TAB>refs/tags/name`; the trailing path
/// segment of the ref is taken as the tag name.
pub fn find_remote_tags(
    runner: &dyn CommandRunner,
    remote: &str,
    verbose: bool,
) -> Result<Vec<String>> {
    let cmd = CommandLine::new(format!("git ls-remote --tags --refs {remote}")).echoed(verbose);
    let run = runner.capture(&cmd)?;
    if !run.success() {
        return Ok(Vec::new());
    }

    Ok(run
        .stdout
        .iter()
        .filter_map(|line| line.split_whitespace().last())
        .filter_map(|reference| reference.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}

/// List branches already merged into the remote's default branch, paired
/// with that default branch's name.
///
/// Entries are trimmed, the `*` current-branch marker is stripped, and the
/// default branch itself — by name or as `remotes/<remote>/<name>` — is
/// excluded, as are symbolic-ref pointer lines (`... -> ...`).
pub fn find_merged_branches(
    runner: &dyn CommandRunner,
    remote: &str,
    verbose: bool,
) -> Result<(Vec<String>, String)> {
    let default = repo::default_branch(runner, remote)?;
    let cmd = CommandLine::new(format!("git branch --all --merged {default}")).echoed(verbose);
    let run = runner.capture(&cmd)?;
    if !run.success() {
        return Ok((Vec::new(), default));
    }

    let qualified = format!("remotes/{remote}/{default}");
    let branches = run
        .stdout
        .iter()
        .map(|raw| {
            let trimmed = raw.trim();
            trimmed
                .strip_prefix('*')
                .map(str::trim_start)
                .unwrap_or(trimmed)
        })
        .filter(|name| !name.is_empty() && !name.contains(" -> "))
        .filter(|name| *name != default && *name != qualified)
        .map(str::to_string)
        .collect();
    Ok((branches, default))
}

/// Local tags absent from the remote's tag set, in local listing order.
pub fn missing_tags(local: Vec<String>, remote: &[String]) -> Vec<String> {
    let published: HashSet<&str> = remote.iter().map(String::as_str).collect();
    local
        .into_iter()
        .filter(|tag| !published.contains(tag.as_str()))
        .collect()
}

fn nonempty_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect()
}
