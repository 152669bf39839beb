//! Repository maintenance: reclaim disk space from unreachable data.

use tracing::info;

use crate::command::{CommandLine, CommandRunner, OutputMode};
use crate::error::{DoctorError, Result};
use crate::repo::{self, Scope};

const GIT_REFLOG_EXPIRE: &str = "git reflog expire --expire-unreachable=now --stale-fix --all";
const GIT_GC: &str = "git gc --prune=now";
const GIT_GC_AGGRESSIVE: &str = "git gc --prune=now --aggressive";

/// Trim the repository and return the size difference (in bytes) of the
/// metadata store from before and after.
///
/// The difference is negative if the repository became smaller, positive
/// if it became larger. Only the `.git` directory is measured, so working
/// tree churn does not pollute the figure.
///
/// Steps run in a fixed sequence: expire reflog entries for unreachable
/// objects across all references, then garbage-collect with immediate
/// pruning (the aggressive variant repacks more exhaustively; slower,
/// smaller result). A failing step aborts the routine; there is no
/// rollback.
pub fn trim(runner: &dyn CommandRunner, aggressive: bool, verbose: bool) -> Result<i64> {
    let size_before = repo::size_in_bytes(runner, Scope::MetadataOnly)?;

    run_step(runner, GIT_REFLOG_EXPIRE, verbose)?;
    run_step(
        runner,
        if aggressive { GIT_GC_AGGRESSIVE } else { GIT_GC },
        verbose,
    )?;

    let size_after = repo::size_in_bytes(runner, Scope::MetadataOnly)?;
    info!(size_before, size_after, "scrub finished");

    Ok(size_after as i64 - size_before as i64)
}

fn run_step(runner: &dyn CommandRunner, line: &str, verbose: bool) -> Result<()> {
    let cmd = CommandLine::new(line).echoed(verbose);
    let output = if verbose {
        OutputMode::Inherit
    } else {
        OutputMode::Discard
    };
    let status = runner.execute(&cmd, output)?;
    if status != 0 {
        return Err(DoctorError::ScrubStep {
            command: line.to_string(),
            status,
        });
    }
    Ok(())
}
