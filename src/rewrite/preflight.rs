//! Preflight checks run before any history is touched.

use std::path::Path;

use git2::RepositoryState;
use tracing::debug;

use crate::config::Settings;
use crate::error::{GitError, PreflightError};
use crate::git::history::{GitRepo, History};
use crate::rewrite::applier::check_cmsg_installed;

/// Everything a session needs once preflight has passed.
#[derive(Debug)]
pub struct PreflightResult {
    pub repo: GitRepo,
    pub settings: Settings,
}

/// Run all preflight checks.
///
/// Checks (in order):
/// 1. `path` is inside a git repository
/// 2. No rebase, merge or similar operation in progress
/// 3. Clean working tree (untracked files are allowed)
/// 4. `cmsg` available, unless `dry_run`
/// 5. Completion service credential present
pub fn run_checks(
    path: &Path,
    model_override: Option<&str>,
    dry_run: bool,
) -> Result<PreflightResult, PreflightError> {
    // 1. Repository
    let repo = GitRepo::discover(path).map_err(|e| match e {
        GitError::OpenRepository(e) => PreflightError::NotARepository(e),
        other => PreflightError::Git(other),
    })?;
    debug!("Using repository at {}", repo.workdir().display());

    // 2. No interrupted rewrite
    let state = repo.open()?.state();
    if state != RepositoryState::Clean {
        return Err(PreflightError::RewriteInProgress {
            state: format!("{:?}", state),
        });
    }

    // 3. Clean working tree
    if !repo.is_clean()? {
        return Err(PreflightError::DirtyWorkingTree);
    }

    // 4. Rewrite tool
    if !dry_run {
        check_cmsg_installed()?;
    }

    // 5. Credential
    let settings = Settings::from_env(model_override)?;

    Ok(PreflightResult { repo, settings })
}
