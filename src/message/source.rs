//! The message-source seam shared by single and batched generation.

use std::fmt;

use async_trait::async_trait;

use crate::error::GenerationError;

/// A normalized message bound to the position it was generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMessage {
    pub text: String,
    pub position: usize,
    /// Sequence tag the batch reply used for this message.
    pub tag: Option<usize>,
}

/// How messages are produced for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// One request per commit, issued just before that commit is rewritten.
    PerCommit,
    /// One request for every planned commit, issued before any rewrite.
    Batch,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMode::PerCommit => f.write_str("per-commit"),
            GenerationMode::Batch => f.write_str("batch"),
        }
    }
}

/// Source of commit messages, selected once at session start.
#[async_trait]
pub trait MessageSource: Send {
    fn mode(&self) -> GenerationMode;

    /// Called once during planning with `(position, diff)` pairs in processing
    /// order. Only invoked for [`GenerationMode::Batch`] sources.
    async fn prepare(&mut self, _diffs: &[(usize, String)]) -> Result<(), GenerationError> {
        Ok(())
    }

    /// Sanitized, non-empty message for `position`, whose current diff is `diff`.
    async fn message_for(
        &mut self,
        position: usize,
        diff: &str,
    ) -> Result<GeneratedMessage, GenerationError>;
}
