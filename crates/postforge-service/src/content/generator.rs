//! HTTP client for the external text generation service.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use postforge_core::config::generator::GeneratorConfig;
use postforge_core::error::AppError;
use postforge_core::result::AppResult;

/// Chat completion request body.
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

/// Chat completion response body, reduced to the fields we read.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Client for the generation API with bounded exponential backoff.
#[derive(Debug, Clone)]
pub struct GeneratorClient {
    /// Shared HTTP client.
    http: reqwest::Client,
    /// Generator configuration.
    config: GeneratorConfig,
}

impl GeneratorClient {
    /// Creates a new generator client.
    pub fn new(config: GeneratorConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Generates blog post content for a topic.
    ///
    /// Retries transient failures (timeouts, 429, 5xx) with exponential
    /// backoff up to the configured attempt budget. Client errors other
    /// than 429 are not retried.
    pub async fn generate(&self, title: &str, topic: &str, word_count: i32) -> AppResult<String> {
        let prompt = format!(
            "Write a blog post titled \"{title}\" about the following topic: {topic}. \
             Aim for roughly {word_count} words. Use clear headings and short paragraphs."
        );

        let mut backoff = Duration::from_millis(self.config.initial_backoff_ms);
        let max_backoff = Duration::from_millis(self.config.max_backoff_ms);
        let mut last_error = None;

        for attempt in 1..=self.config.max_attempts {
            match self.request_once(&prompt).await {
                Ok(content) => return Ok(content),
                Err(RequestFailure::Permanent(e)) => return Err(e),
                Err(RequestFailure::Transient(e)) => {
                    warn!(attempt, error = %e, "Generation attempt failed");
                    last_error = Some(e);
                    if attempt < self.config.max_attempts {
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(max_backoff);
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::external_service("Generation failed with no attempts")))
    }

    async fn request_once(&self, prompt: &str) -> Result<String, RequestFailure> {
        let body = CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                RequestFailure::Transient(AppError::external_service(format!(
                    "Generation request failed: {e}"
                )))
            })?;

        let status = response.status();
        if status.is_success() {
            let parsed: CompletionResponse = response.json().await.map_err(|e| {
                RequestFailure::Permanent(AppError::external_service(format!(
                    "Malformed generation response: {e}"
                )))
            })?;
            let content = parsed
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .unwrap_or_default();
            if content.is_empty() {
                return Err(RequestFailure::Permanent(AppError::external_service(
                    "Generation response contained no content",
                )));
            }
            debug!(bytes = content.len(), "Generation succeeded");
            return Ok(content);
        }

        let err = AppError::external_service(format!("Generation service returned {status}"));
        if retryable_status(status) {
            Err(RequestFailure::Transient(err))
        } else {
            Err(RequestFailure::Permanent(err))
        }
    }
}

/// Rate limiting and server-side failures are worth retrying; other
/// client errors will fail the same way every time.
fn retryable_status(status: reqwest::StatusCode) -> bool {
    status.as_u16() == 429 || status.is_server_error()
}

/// Whether a failed request is worth retrying.
enum RequestFailure {
    Transient(AppError),
    Permanent(AppError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_retryable_statuses() {
        assert!(retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!retryable_status(StatusCode::BAD_REQUEST));
        assert!(!retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!retryable_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let max = Duration::from_millis(8000);
        let mut backoff = Duration::from_millis(500);
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(backoff.as_millis());
            backoff = (backoff * 2).min(max);
        }
        assert_eq!(seen, vec![500, 1000, 2000, 4000, 8000, 8000]);
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Hello world"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Hello world");
    }
}
