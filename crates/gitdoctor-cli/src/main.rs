//! git-doctor — repository health checks and maintenance.
//!
//! Installed as `git-doctor`, so git invokes it for `git doctor`.
//!
//! ## Commands
//!
//! - (default): run the diagnostic checks against the current repository
//! - `scrub`: reclaim disk space by expiring reflogs and pruning
//!   unreachable objects

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use gitdoctor_core::{diagnose, examine, repo, report, scrub};
use gitdoctor_core::{CommandRunner, ExamContext, SystemRunner};

#[derive(Parser)]
#[command(name = "git-doctor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Checks the health of a git repository", long_about = None)]
struct Cli {
    /// Show the git commands being run and their output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reclaim disk space by expiring reflogs and pruning unreachable data
    Scrub {
        /// Use the slower, more exhaustive repack
        #[arg(long)]
        aggressive: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    gitdoctor_core::init_tracing(cli.json, level);

    let runner = SystemRunner::new();

    // Environment gate: both conditions are user-correctable, so they get
    // a headline conclusion rather than an error trace.
    if !repo::git_available(&runner) {
        report::conclude("git is required to run this program", false);
        return ExitCode::FAILURE;
    }
    if !repo::is_inside_work_tree(&runner) {
        report::conclude("must be inside the work tree of a repository", false);
        return ExitCode::FAILURE;
    }

    match run(&cli, &runner) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("doctor: error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run the selected mode behind the integrity gate. Returns `false` when
/// the gate rejects the repository.
fn run(cli: &Cli, runner: &dyn CommandRunner) -> Result<bool> {
    let integrity = examine::check_integrity(runner, cli.verbose)
        .context("consistency verification failed to run")?;
    if !integrity.clean {
        for issue in &integrity.issues {
            report::note(issue);
        }
        report::conclude("this repository is not internally consistent", false);
        report::supplement(
            "Diagnostics are unreliable on an inconsistent repository. Inspect the \
             problems reported by `git fsck` before going further.",
        );
        return Ok(false);
    }

    match cli.command {
        Some(Commands::Scrub { aggressive }) => {
            let delta =
                scrub::trim(runner, aggressive, cli.verbose).context("scrub aborted")?;
            if let Some(message) = reclaim_message(delta) {
                report::conclude(&message, true);
            }
        }
        None => {
            let ctx = ExamContext {
                runner,
                verbose: cli.verbose,
            };
            diagnose::diagnose(&ctx).context("diagnosis aborted")?;
        }
    }
    Ok(true)
}

/// The scrub headline — only when the repository actually shrank.
fn reclaim_message(delta: i64) -> Option<String> {
    if delta < 0 {
        Some(format!(
            "scrubbed clean; reclaimed {}",
            report::human_size(delta.unsigned_abs())
        ))
    } else {
        None
    }
}
