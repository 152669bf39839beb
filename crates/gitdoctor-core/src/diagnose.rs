//! The ordered diagnostic pipeline.
//!
//! Each examination is stateless: it issues its probes, classifies the
//! result, and either produces a [`Finding`] or stays quiet. The pipeline
//! runs them in a fixed order and reports each finding immediately, before
//! the next examination starts. Examinations that compare against a remote
//! declare that through their applicability predicate and are skipped
//! entirely when no remote is configured.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::CommandRunner;
use crate::error::Result;
use crate::examine;
use crate::repo;
use crate::report;

/// Everything an examination needs: how to run git, and whether to show
/// the commands being issued.
pub struct ExamContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub verbose: bool,
}

/// An issue detected by one examination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    /// Headline conclusion.
    pub message: String,

    /// Remedy advice, word-wrapped onto stderr by the reporter.
    pub supplement: String,

    /// One line per affected object (file, tag, branch, fsck line).
    pub evidence: Vec<String>,
}

/// A single health check.
pub trait Examination {
    fn name(&self) -> &'static str;

    /// Whether the check applies to this repository at all.
    fn applies(&self, ctx: &ExamContext<'_>) -> Result<bool> {
        let _ = ctx;
        Ok(true)
    }

    /// Run the check; `None` means no issue.
    fn examine(&self, ctx: &ExamContext<'_>) -> Result<Option<Finding>>;
}

/// Recommend a scrubdown when unreachable objects have accumulated.
pub struct UnreachableObjects;

impl Examination for UnreachableObjects {
    fn name(&self) -> &'static str {
        "unreachable-objects"
    }

    fn examine(&self, ctx: &ExamContext<'_>) -> Result<Option<Finding>> {
        let unreachables = examine::find_unreachable_objects(ctx.runner, ctx.verbose)?;
        if unreachables.is_empty() {
            return Ok(None);
        }
        Ok(Some(Finding {
            message: "scrubdown is recommended".to_string(),
            supplement: "Run a scrubdown using `git doctor scrub`.".to_string(),
            evidence: unreachables,
        }))
    }
}

/// A README should exist and be tracked at the repository root.
pub struct MissingReadme;

impl Examination for MissingReadme {
    fn name(&self) -> &'static str {
        "readme"
    }

    fn examine(&self, ctx: &ExamContext<'_>) -> Result<Option<Finding>> {
        if examine::contains_readme(ctx.runner, ctx.verbose)? {
            return Ok(None);
        }
        Ok(Some(Finding {
            message: "README not found".to_string(),
            supplement: "As per convention, a README-file should exist and be tracked at \
                         the root of the repository."
                .to_string(),
            evidence: Vec::new(),
        }))
    }
}

/// Local tags that were never pushed to the remote.
pub struct UnpublishedTags;

impl Examination for UnpublishedTags {
    fn name(&self) -> &'static str {
        "unpublished-tags"
    }

    fn applies(&self, ctx: &ExamContext<'_>) -> Result<bool> {
        Ok(repo::default_remote(ctx.runner)?.is_some())
    }

    fn examine(&self, ctx: &ExamContext<'_>) -> Result<Option<Finding>> {
        let Some(remote) = repo::default_remote(ctx.runner)? else {
            return Ok(None);
        };

        let local = examine::find_local_tags(ctx.runner, ctx.verbose)?;
        let published = examine::find_remote_tags(ctx.runner, &remote, ctx.verbose)?;
        let missing = examine::missing_tags(local, &published);
        if missing.is_empty() {
            return Ok(None);
        }
        Ok(Some(Finding {
            message: "local tags not present on remote".to_string(),
            supplement: "These tags should either be deleted using `git tag -d <tag>`, or \
                         synced to remote using `git push --tags`. Alternatively, to easily \
                         match remote, use `git tag -d $(git tag)` (deleting all local \
                         tags), followed by `git fetch --tags` (fetching all remote tags)."
                .to_string(),
            evidence: missing,
        }))
    }
}

/// Branches already merged into the remote's default branch.
pub struct RedundantBranches;

impl Examination for RedundantBranches {
    fn name(&self) -> &'static str {
        "redundant-branches"
    }

    fn applies(&self, ctx: &ExamContext<'_>) -> Result<bool> {
        Ok(repo::default_remote(ctx.runner)?.is_some())
    }

    fn examine(&self, ctx: &ExamContext<'_>) -> Result<Option<Finding>> {
        let Some(remote) = repo::default_remote(ctx.runner)? else {
            return Ok(None);
        };

        let (redundant, default) =
            examine::find_merged_branches(ctx.runner, &remote, ctx.verbose)?;
        if redundant.is_empty() {
            return Ok(None);
        }
        Ok(Some(Finding {
            message: format!("redundant branches; already merged with '{default}'"),
            supplement: "These branches should be deleted (both locally and remote) unless \
                         they will continue to be used and are intentionally long-running."
                .to_string(),
            evidence: redundant,
        }))
    }
}

/// Ignore rules that exist only on this machine.
///
/// A file excluded by a rule in an untracked rule file (a personal global
/// ignore, `.git/info/exclude`) is invisible to collaborators; the rule
/// probably belongs in a tracked `.gitignore` instead.
pub struct UntrackedIgnoreRules;

impl Examination for UntrackedIgnoreRules {
    fn name(&self) -> &'static str {
        "untracked-ignore-rules"
    }

    fn examine(&self, ctx: &ExamContext<'_>) -> Result<Option<Finding>> {
        let excluded = examine::find_excluded_files(ctx.runner, ctx.verbose)?;
        if excluded.is_empty() {
            return Ok(None);
        }

        let sources = examine::exclusion_sources(ctx.runner, &excluded, ctx.verbose)?;

        let mut tracked_sources: Vec<&str> = Vec::new();
        let mut untracked_sources: Vec<&str> = Vec::new();
        for source in &sources {
            let path = source.split(':').next().unwrap_or(source.as_str());
            if tracked_sources.contains(&path) || untracked_sources.contains(&path) {
                continue;
            }
            if examine::is_file_tracked(ctx.runner, path, ctx.verbose)? {
                tracked_sources.push(path);
            } else {
                untracked_sources.push(path);
            }
        }

        let evidence: Vec<String> = excluded
            .iter()
            .zip(&sources)
            .filter(|(_, source)| {
                let path = source.split(':').next().unwrap_or(source.as_str());
                untracked_sources.contains(&path)
            })
            .map(|(file, source)| format!("{file} ({source})"))
            .collect();

        if evidence.is_empty() {
            return Ok(None);
        }
        Ok(Some(Finding {
            message: "files are being excluded by untracked rules".to_string(),
            supplement: "Consider whether any of these files should also be excluded by \
                         other contributors; if so, adding any applicable rules to a \
                         tracked .gitignore file would be preferable."
                .to_string(),
            evidence,
        }))
    }
}

/// Files that are tracked despite matching an ignore rule.
pub struct UnwantedTrackedFiles;

impl Examination for UnwantedTrackedFiles {
    fn name(&self) -> &'static str {
        "unwanted-tracked-files"
    }

    fn examine(&self, ctx: &ExamContext<'_>) -> Result<Option<Finding>> {
        let unwanted = examine::find_unwanted_files(ctx.runner, ctx.verbose)?;
        if unwanted.is_empty() {
            return Ok(None);
        }

        // Resolving where each rule comes from costs one more subprocess
        // round; only worth it when the user asked to see the detail.
        let evidence = if ctx.verbose {
            let sources = examine::exclusion_sources(ctx.runner, &unwanted, ctx.verbose)?;
            unwanted
                .iter()
                .zip(&sources)
                .map(|(file, source)| format!("{file} ({source})"))
                .collect()
        } else {
            unwanted
        };

        Ok(Some(Finding {
            message: "unwanted files are being tracked".to_string(),
            supplement: "Remove unwanted files from being tracked using \
                         `git rm --cached <filename>`, or remove them completely (from the \
                         filesystem) using `git rm <filename>`."
                .to_string(),
            evidence,
        }))
    }
}

/// The fixed examination order.
pub fn examinations() -> Vec<Box<dyn Examination>> {
    vec![
        Box::new(UnreachableObjects),
        Box::new(MissingReadme),
        Box::new(UnpublishedTags),
        Box::new(RedundantBranches),
        Box::new(UntrackedIgnoreRules),
        Box::new(UnwantedTrackedFiles),
    ]
}

/// Run every applicable examination in order, reporting each finding as it
/// is produced. Returns the findings for callers that want them.
pub fn diagnose(ctx: &ExamContext<'_>) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    for exam in examinations() {
        if !exam.applies(ctx)? {
            debug!(check = exam.name(), "skipped: not applicable");
            continue;
        }
        debug!(check = exam.name(), "examining");
        if let Some(finding) = exam.examine(ctx)? {
            report::emit(&finding);
            findings.push(finding);
        }
    }
    Ok(findings)
}
