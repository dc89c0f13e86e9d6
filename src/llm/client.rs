//! Completion service client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::error::CompletionError;

/// Public Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// A single prompt for a given model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
}

/// Text-generation collaborator.
///
/// This abstraction allows mocking the HTTP service in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send the prompt and return the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client for the public endpoint from resolved settings.
    pub fn new(settings: &Settings) -> Result<Self, CompletionError> {
        Self::with_base_url(settings, DEFAULT_BASE_URL)
    }

    /// Build a client against an alternative endpoint.
    pub fn with_base_url(settings: &Settings, base_url: &str) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(CompletionError::Http)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [Part {
                    text: &request.prompt,
                }],
            }],
        };

        debug!(
            "Requesting completion from {} ({} prompt chars)",
            request.model,
            request.prompt.chars().count()
        );

        let response = self
            .http
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(CompletionError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await.map_err(CompletionError::Http)?;
        parse_response(&raw)
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_response(raw: &str) -> Result<String, CompletionError> {
    let parsed: GenerateContentResponse = serde_json::from_str(raw).map_err(|e| {
        let truncated: String = raw.chars().take(200).collect();
        CompletionError::InvalidResponse(format!("{}. Response: {}", e, truncated))
    })?;

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(CompletionError::EmptyResponse);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"feat: add "},{"text":"parser"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(parse_response(raw).unwrap(), "feat: add parser");
    }

    #[test]
    fn test_parse_response_no_candidates_is_empty() {
        let raw = r#"{"candidates":[],"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(parse_response(raw), Err(CompletionError::EmptyResponse)));
    }

    #[test]
    fn test_parse_response_missing_content_is_empty() {
        let raw = r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#;
        assert!(matches!(parse_response(raw), Err(CompletionError::EmptyResponse)));
    }

    #[test]
    fn test_parse_response_invalid_json() {
        let result = parse_response("<html>bad gateway</html>");
        match result {
            Err(CompletionError::InvalidResponse(msg)) => assert!(msg.contains("bad gateway")),
            other => panic!("Expected InvalidResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: "hello" }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }
}
