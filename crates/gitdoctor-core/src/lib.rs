//! git-doctor core library
//!
//! Health checks and maintenance for git repositories, built from three
//! layers: a process runner ([`command`]), thin repository probes
//! ([`repo`], [`examine`]), and the diagnostic pipeline and maintenance
//! routine on top ([`diagnose`], [`scrub`]). All real work is delegated
//! to git subprocesses; this crate constructs the command lines, parses
//! their line-oriented output, and aggregates the results.

pub mod command;
pub mod diagnose;
pub mod error;
pub mod examine;
pub mod repo;
pub mod report;
pub mod scrub;
pub mod telemetry;

pub use command::{CommandLine, CommandRunner, Execution, OutputMode, SystemRunner};
pub use diagnose::{diagnose, examinations, ExamContext, Examination, Finding};
pub use error::{DoctorError, Result};
pub use examine::{check_integrity, IntegrityReport};
pub use repo::Scope;
pub use scrub::trim;
pub use telemetry::init_tracing;

/// git-doctor version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
