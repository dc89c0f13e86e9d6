//! Error types for git-bard modules using thiserror.

use thiserror::Error;

/// Errors from git query operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to resolve range '{0}': {1}")]
    InvalidRange(String, #[source] git2::Error),

    #[error("Failed to find commit '{0}': {1}")]
    CommitNotFound(String, #[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    RevwalkError(#[source] git2::Error),

    #[error("Failed to render diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to read working tree status: {0}")]
    StatusFailed(#[source] git2::Error),
}

/// Errors from the completion service.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Completion service returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Completion service returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("Completion service returned no text")]
    EmptyResponse,
}

/// Errors from commit message generation.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("Generated message was empty after sanitizing")]
    EmptyMessage,

    #[error("Batch reply was missing messages for COMMIT# {missing:?}")]
    IncompleteBatch { missing: Vec<usize> },

    #[error("No batched message was generated for position {0}")]
    NotInBatch(usize),

    #[error("All {attempts} attempts failed. Last error: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<GenerationError>,
    },
}

/// Errors from resolving a user range into target positions.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("No commits in the requested range could be mapped to history positions")]
    EmptyTarget,

    #[error("Could not list commits: {0}")]
    Query(#[source] GitError),
}

/// Errors from invoking the external rewrite mechanism.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("'cmsg' tool not found. Install it from https://github.com/ogpourya/cmsg")]
    NotInstalled,

    #[error("Failed to spawn cmsg: {0}")]
    SpawnFailed(#[source] std::io::Error),
}

/// Errors from environment configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing API credential. Set the {0} environment variable.")]
    MissingApiKey(&'static str),
}

/// Precondition failures detected before any mutation.
#[derive(Error, Debug)]
pub enum PreflightError {
    #[error("Not a git repository: {0}")]
    NotARepository(#[source] git2::Error),

    #[error(
        "A rebase or similar operation is already in progress ({state}). \
         Finish it with `git rebase --continue` or undo it with `git rebase --abort` first."
    )]
    RewriteInProgress { state: String },

    #[error("Working tree has uncommitted changes. Commit or stash them first.")]
    DirtyWorkingTree,

    #[error(transparent)]
    Rewriter(#[from] RewriteError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Git(#[from] GitError),
}

/// Errors from publishing rewritten history.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("HEAD is detached; cannot determine which branch to push")]
    DetachedHead,

    #[error("Branch '{branch}' has no upstream tracking branch configured")]
    MissingUpstream { branch: String },

    #[error("Git operation failed: {0}")]
    GitFailed(String),
}
