//! Publishing rewritten history: a force-with-lease push, only on request.
//!
//! Uses `std::process::Command` to shell out to the system `git` binary so the
//! user's credential store and SSH agent apply.

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::Repository;
use tracing::debug;

use crate::error::PublishError;
use crate::git::history::GitRepo;

/// Remote-tracking information for the current branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub remote: String,
    pub branch: String,
}

/// What publishing would do for the current branch.
#[derive(Debug, Clone)]
pub struct PublishPlan {
    workdir: PathBuf,
    pub branch: String,
    pub upstream: Option<Upstream>,
}

impl PublishPlan {
    /// Inspect the current branch and its configured upstream.
    pub fn detect(repo: &GitRepo) -> Result<Self, PublishError> {
        let handle = repo
            .open()
            .map_err(|e| PublishError::GitFailed(e.to_string()))?;
        let branch = get_current_branch(&handle)?;
        let upstream = match get_tracking_branch(&handle, &branch) {
            Ok(upstream) => Some(upstream),
            Err(PublishError::MissingUpstream { .. }) => None,
            Err(e) => return Err(e),
        };

        Ok(Self {
            workdir: repo.workdir().to_path_buf(),
            branch,
            upstream,
        })
    }

    /// What to push: the branch name, or `local:remote` when they differ.
    fn refspec(&self) -> String {
        match &self.upstream {
            Some(upstream) if upstream.branch != self.branch => {
                format!("{}:{}", self.branch, upstream.branch)
            }
            _ => self.branch.clone(),
        }
    }

    /// The push command, as the user would type it.
    pub fn command(&self) -> String {
        let remote = self
            .upstream
            .as_ref()
            .map(|u| u.remote.as_str())
            .unwrap_or("<remote>");
        format!("git push --force-with-lease {} {}", remote, self.refspec())
    }
}

/// Confirm-then-execute hook offered after a completed session.
#[derive(Debug)]
pub struct PublishGate {
    plan: PublishPlan,
}

impl PublishGate {
    pub fn new(plan: PublishPlan) -> Self {
        Self { plan }
    }

    /// Ask `confirm`, and push only if it returns true.
    ///
    /// Returns whether a push happened. A branch without an upstream is an
    /// error and `confirm` is never asked.
    pub fn confirm_then_execute<F>(self, confirm: F) -> Result<bool, PublishError>
    where
        F: FnOnce(&PublishPlan) -> bool,
    {
        let Some(upstream) = &self.plan.upstream else {
            return Err(PublishError::MissingUpstream {
                branch: self.plan.branch.clone(),
            });
        };

        if !confirm(&self.plan) {
            debug!("Publish declined");
            return Ok(false);
        }

        let refspec = self.plan.refspec();
        run_git(
            &self.plan.workdir,
            &["push", "--force-with-lease", &upstream.remote, &refspec],
            "push",
        )?;
        Ok(true)
    }
}

/// Get the current branch name.
fn get_current_branch(repo: &Repository) -> Result<String, PublishError> {
    let head = repo
        .head()
        .map_err(|e| PublishError::GitFailed(format!("Could not determine HEAD: {}", e)))?;

    if !head.is_branch() {
        return Err(PublishError::DetachedHead);
    }

    head.shorthand()
        .map(String::from)
        .ok_or_else(|| PublishError::GitFailed("Could not determine current branch".into()))
}

/// Resolve tracked upstream for the current branch from git config.
fn get_tracking_branch(repo: &Repository, current_branch: &str) -> Result<Upstream, PublishError> {
    let config = repo
        .config()
        .map_err(|e| PublishError::GitFailed(format!("Could not read git config: {}", e)))?;

    let missing = || PublishError::MissingUpstream {
        branch: current_branch.to_string(),
    };

    let remote = config
        .get_string(&format!("branch.{}.remote", current_branch))
        .map_err(|_| missing())?;
    let merge_ref = config
        .get_string(&format!("branch.{}.merge", current_branch))
        .map_err(|_| missing())?;

    let branch = merge_ref
        .strip_prefix("refs/heads/")
        .unwrap_or(&merge_ref)
        .to_string();

    if remote.trim().is_empty() || branch.trim().is_empty() {
        return Err(missing());
    }

    Ok(Upstream { remote, branch })
}

/// Run a git command in `workdir` and return success or a descriptive error.
fn run_git(workdir: &Path, args: &[&str], operation: &str) -> Result<(), PublishError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(workdir)
        .output()
        .map_err(|e| PublishError::GitFailed(format!("Failed to run git {}: {}", operation, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PublishError::GitFailed(format!(
            "git {} failed: {}",
            operation,
            stderr.trim()
        )));
    }

    Ok(())
}
