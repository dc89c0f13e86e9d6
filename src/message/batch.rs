//! Batched message generation: one request covering every planned commit.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex_lite::Regex;
use tracing::{debug, info};

use crate::error::GenerationError;
use crate::llm::client::{CompletionRequest, CompletionService};
use crate::llm::prompt::build_batch_prompt;
use crate::llm::retry::RetryPolicy;
use crate::message::sanitize::{clean_reply, is_line_separator};
use crate::message::single::inspect;
use crate::message::source::{GeneratedMessage, GenerationMode, MessageSource};

fn reply_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*COMMIT#(\d+)\s*:\s*(.*)$").expect("batch reply regex is valid")
    })
}

/// Parse `COMMIT#<n>: <message>` lines out of a batch reply.
///
/// Lines split on the same separators the sanitizer recognizes. Tags outside
/// `1..=expected` and lines whose message sanitizes to nothing
/// are ignored. The first occurrence of a tag wins.
pub fn parse_batch_reply(reply: &str, expected: usize) -> BTreeMap<usize, String> {
    let mut messages = BTreeMap::new();

    for line in reply.split(is_line_separator) {
        let Some(caps) = reply_line_regex().captures(line) else {
            continue;
        };
        let Ok(tag) = caps[1].parse::<usize>() else {
            continue;
        };
        if tag == 0 || tag > expected || messages.contains_key(&tag) {
            debug!("Ignoring batch reply line with tag {}", tag);
            continue;
        }
        if let Some(message) = clean_reply(&caps[2]) {
            messages.insert(tag, message);
        }
    }

    messages
}

fn missing_tags(messages: &BTreeMap<usize, String>, expected: usize) -> Vec<usize> {
    (1..=expected).filter(|tag| !messages.contains_key(tag)).collect()
}

/// Generates every message in one request before any rewrite starts.
///
/// A reply that lacks any expected tag fails the whole batch, which is then
/// retried as a unit under the same policy as single requests.
pub struct BatchMessageGenerator<C> {
    client: C,
    model: String,
    policy: RetryPolicy,
    messages: HashMap<usize, GeneratedMessage>,
}

impl<C: CompletionService> BatchMessageGenerator<C> {
    pub fn new(client: C, model: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            client,
            model: model.into(),
            policy,
            messages: HashMap::new(),
        }
    }

    /// Request messages for `(position, diff)` pairs, tagged 1..=n in the
    /// order given. Returns messages keyed by tag.
    pub async fn generate_all(
        &self,
        diffs: &[(usize, String)],
    ) -> Result<BTreeMap<usize, String>, GenerationError> {
        let items: Vec<(usize, &str)> = diffs
            .iter()
            .enumerate()
            .map(|(i, (_, diff))| (i + 1, diff.as_str()))
            .collect();
        let request = CompletionRequest {
            model: self.model.clone(),
            prompt: build_batch_prompt(&items),
        };
        let expected = diffs.len();

        self.policy
            .run(
                || self.try_generate_all(&request, expected),
                |last, attempts| GenerationError::RetriesExhausted {
                    attempts,
                    last: Box::new(last),
                },
            )
            .await
    }

    async fn try_generate_all(
        &self,
        request: &CompletionRequest,
        expected: usize,
    ) -> Result<BTreeMap<usize, String>, GenerationError> {
        let reply = self.client.complete(request).await?;
        let messages = parse_batch_reply(&reply, expected);

        let missing = missing_tags(&messages, expected);
        if !missing.is_empty() {
            return Err(GenerationError::IncompleteBatch { missing });
        }
        Ok(messages)
    }
}

#[async_trait]
impl<C: CompletionService> MessageSource for BatchMessageGenerator<C> {
    fn mode(&self) -> GenerationMode {
        GenerationMode::Batch
    }

    async fn prepare(&mut self, diffs: &[(usize, String)]) -> Result<(), GenerationError> {
        if diffs.is_empty() {
            return Ok(());
        }
        info!("Requesting {} messages in one batch", diffs.len());

        let mut by_tag = self.generate_all(diffs).await?;
        self.messages = diffs
            .iter()
            .enumerate()
            .filter_map(|(i, (position, _))| {
                let tag = i + 1;
                by_tag.remove(&tag).map(|text| {
                    inspect(&text);
                    (
                        *position,
                        GeneratedMessage {
                            text,
                            position: *position,
                            tag: Some(tag),
                        },
                    )
                })
            })
            .collect();
        Ok(())
    }

    async fn message_for(
        &mut self,
        position: usize,
        _diff: &str,
    ) -> Result<GeneratedMessage, GenerationError> {
        self.messages
            .remove(&position)
            .ok_or(GenerationError::NotInBatch(position))
    }
}
