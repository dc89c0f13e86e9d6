//! git-bard - rewrite commit messages in place with AI-generated conventional commits.
//!
//! # Overview
//!
//! git-bard resolves a commit range into position-stable indices, generates one
//! conventional commit message per commit from its diff, and rewords commits
//! highest position first through the external `cmsg` tool, re-reading the
//! live history before every step.

pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod message;
pub mod rewrite;

// Re-export commonly used types
pub use config::Settings;
pub use error::{
    CompletionError, ConfigError, GenerationError, GitError, PreflightError, PublishError,
    ResolveError, RewriteError,
};
pub use git::{CommitType, GitRepo, History};
pub use message::{GeneratedMessage, GenerationMode, MessageSource};
pub use rewrite::{Orchestrator, RangeSpec, RunError, RunReport};
