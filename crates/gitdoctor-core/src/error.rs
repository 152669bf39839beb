//! Error taxonomy for git-doctor.

/// Errors produced while probing or maintaining a repository.
///
/// Expected negative outcomes (a probe exiting non-zero, an empty listing,
/// no configured remote) are not errors; they are the quiet "no issue"
/// path. These variants cover the rest: launch failures, fatal probe
/// failures, and parser contract violations that would desynchronize
/// evidence from the files it describes.
#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git error: {0}")]
    Git(String),

    #[error("no 'HEAD branch:' reported for remote '{remote}'")]
    MissingHeadBranch { remote: String },

    #[error("exclusion source count mismatch: asked about {asked} paths, resolved {resolved}")]
    ExclusionSourceMismatch { asked: usize, resolved: usize },

    #[error("scrub step `{command}` exited with status {status}")]
    ScrubStep { command: String, status: i32 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for git-doctor operations.
pub type Result<T> = std::result::Result<T, DoctorError>;
