//! Read-only history queries against the live repository.
//!
//! `GitRepo` re-opens the repository on every call. The rewrite mechanism runs
//! out of process and moves refs underneath us, so nothing here may hold a
//! handle (or an identifier) across an apply.

use std::path::{Path, PathBuf};

use git2::{ErrorCode, Object, Oid, Repository, RevparseMode, Revwalk, Sort, StatusOptions};

use crate::error::GitError;
use crate::git::diff::render_commit;

/// Query collaborator for the version-control history.
#[cfg_attr(test, mockall::automock)]
pub trait History: Send + Sync {
    /// List commit identifiers oldest-first, optionally restricted to a range expression.
    fn list_commits<'a>(&self, range: Option<&'a str>) -> Result<Vec<String>, GitError>;

    /// Render one commit as metadata plus patch text.
    fn show(&self, id: &str) -> Result<String, GitError>;

    /// Whether the working tree has no staged or unstaged changes to tracked files.
    fn is_clean(&self) -> Result<bool, GitError>;
}

/// `History` backed by a git repository on disk.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Discover the repository containing `path`.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let repo = Repository::discover(path.as_ref()).map_err(GitError::OpenRepository)?;
        let path = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();
        Ok(Self { path })
    }

    /// Working directory of the repository.
    pub fn workdir(&self) -> &Path {
        &self.path
    }

    /// Open a fresh handle so refs rewritten by other processes are seen.
    pub fn open(&self) -> Result<Repository, GitError> {
        Repository::open(&self.path).map_err(GitError::OpenRepository)
    }
}

impl History for GitRepo {
    fn list_commits<'a>(&self, range: Option<&'a str>) -> Result<Vec<String>, GitError> {
        let repo = self.open()?;
        let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
        revwalk
            .set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)
            .map_err(GitError::RevwalkError)?;

        match range {
            None => {
                // push_head on an unborn branch reports a generic reference error
                match repo.head() {
                    Ok(_) => {}
                    Err(e)
                        if e.code() == ErrorCode::UnbornBranch
                            || e.code() == ErrorCode::NotFound =>
                    {
                        return Ok(Vec::new());
                    }
                    Err(e) => return Err(GitError::RevwalkError(e)),
                }
                revwalk.push_head().map_err(GitError::RevwalkError)?;
            }
            Some(expr) => push_range(&repo, &mut revwalk, expr)?,
        }

        let ids = revwalk
            .map(|oid| oid.map(|o| o.to_string()).map_err(GitError::RevwalkError))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn show(&self, id: &str) -> Result<String, GitError> {
        let repo = self.open()?;
        let oid = Oid::from_str(id).map_err(|e| GitError::CommitNotFound(id.to_string(), e))?;
        let commit = repo
            .find_commit(oid)
            .map_err(|e| GitError::CommitNotFound(id.to_string(), e))?;
        render_commit(&repo, &commit)
    }

    fn is_clean(&self) -> Result<bool, GitError> {
        let repo = self.open()?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);
        let statuses = repo.statuses(Some(&mut opts)).map_err(GitError::StatusFailed)?;
        Ok(statuses.is_empty())
    }
}

/// Push a revision expression onto a revwalk the way `git log <expr>` reads it.
///
/// Supports a single revision (all its ancestors), `a..b` and `a...b`.
fn push_range(repo: &Repository, revwalk: &mut Revwalk<'_>, expr: &str) -> Result<(), GitError> {
    let invalid = |e: git2::Error| GitError::InvalidRange(expr.to_string(), e);

    let spec = repo.revparse(expr).map_err(invalid)?;
    let from = peel_commit(spec.from(), expr)?;
    let to = peel_commit(spec.to(), expr)?;

    if spec.mode().contains(RevparseMode::SINGLE) {
        if let Some(oid) = from {
            revwalk.push(oid).map_err(GitError::RevwalkError)?;
        }
        return Ok(());
    }

    let head = || -> Result<Oid, GitError> {
        repo.head()
            .and_then(|h| h.peel_to_commit())
            .map(|c| c.id())
            .map_err(invalid)
    };
    let from = match from {
        Some(oid) => oid,
        None => head()?,
    };
    let to = match to {
        Some(oid) => oid,
        None => head()?,
    };

    revwalk.push(to).map_err(GitError::RevwalkError)?;
    if spec.mode().contains(RevparseMode::MERGE_BASE) {
        revwalk.push(from).map_err(GitError::RevwalkError)?;
        let base = repo.merge_base(from, to).map_err(invalid)?;
        revwalk.hide(base).map_err(GitError::RevwalkError)?;
    } else {
        revwalk.hide(from).map_err(GitError::RevwalkError)?;
    }

    Ok(())
}

fn peel_commit(obj: Option<&Object<'_>>, expr: &str) -> Result<Option<Oid>, GitError> {
    obj.map(|o| {
        o.peel_to_commit()
            .map(|c| c.id())
            .map_err(|e| GitError::InvalidRange(expr.to_string(), e))
    })
    .transpose()
}
