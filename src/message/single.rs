//! Single-commit message generation.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::git::commits::conventional_type;
use crate::llm::client::{CompletionRequest, CompletionService};
use crate::llm::prompt::{SUBJECT_BUDGET, build_commit_prompt};
use crate::llm::retry::RetryPolicy;
use crate::message::sanitize::clean_reply;
use crate::message::source::{GeneratedMessage, GenerationMode, MessageSource};

/// Generates one message per commit, with retry and backoff.
pub struct MessageGenerator<C> {
    client: C,
    model: String,
    policy: RetryPolicy,
}

impl<C: CompletionService> MessageGenerator<C> {
    pub fn new(client: C, model: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            client,
            model: model.into(),
            policy,
        }
    }

    /// Generate a sanitized message for one diff.
    ///
    /// A transport error or a reply that is empty after sanitizing counts as a
    /// failed attempt. After the last attempt, returns
    /// [`GenerationError::RetriesExhausted`].
    pub async fn generate(&self, diff: &str) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            prompt: build_commit_prompt(diff),
        };

        self.policy
            .run(
                || self.try_generate(&request),
                |last, attempts| GenerationError::RetriesExhausted {
                    attempts,
                    last: Box::new(last),
                },
            )
            .await
    }

    async fn try_generate(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        let raw = self.client.complete(request).await?;
        let message = clean_reply(&raw).ok_or(GenerationError::EmptyMessage)?;
        inspect(&message);
        Ok(message)
    }
}

/// Diagnostics for messages that miss the requested shape. Never rejects.
pub(crate) fn inspect(message: &str) {
    if conventional_type(message).is_none() {
        warn!("Generated message is not a conventional commit: {}", message);
    }
    let len = message.chars().count();
    if len > SUBJECT_BUDGET {
        debug!(
            "Generated subject is {} characters (asked for under {})",
            len, SUBJECT_BUDGET
        );
    }
}

#[async_trait]
impl<C: CompletionService> MessageSource for MessageGenerator<C> {
    fn mode(&self) -> GenerationMode {
        GenerationMode::PerCommit
    }

    async fn message_for(
        &mut self,
        position: usize,
        diff: &str,
    ) -> Result<GeneratedMessage, GenerationError> {
        let text = self.generate(diff).await?;
        Ok(GeneratedMessage {
            text,
            position,
            tag: None,
        })
    }
}
