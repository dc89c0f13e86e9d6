//! Completion service access, retry policy and prompt construction.

pub mod client;
pub mod prompt;
pub mod retry;

pub use client::{CompletionRequest, CompletionService, GeminiClient};
pub use prompt::{build_batch_prompt, build_commit_prompt};
pub use retry::RetryPolicy;
