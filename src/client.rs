use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BenchmarkConfig;

/// Token budget used when a caller has no case-specific limit.
pub const DEFAULT_MAX_TOKENS: u32 = 100;

/// Sampling parameters sent with every request.
pub const TEMPERATURE: f64 = 0.7;
pub const TOP_P: f64 = 0.9;

const ERROR_BODY_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid request: {0}")]
    InvalidInput(&'static str),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("request failed ({status}) {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response contained no choices")]
    NoChoices,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub stream: bool,
}

impl<'a> ChatCompletionRequest<'a> {
    pub fn new(prompt: &'a str, max_tokens: u32) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub usage: Usage,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}

/// Outcome of one timed chat-completion round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestResult {
    pub total_time_ms: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub content: String,
}

impl RequestResult {
    pub fn tokens_per_second(&self) -> f64 {
        tokens_per_second(self.completion_tokens, self.total_time_ms)
    }

    pub fn tokens_per_second_display(&self) -> String {
        format_speed(self.tokens_per_second())
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.total_time_ms)
    }
}

/// Completion tokens per wall-clock second; zero when no time elapsed.
pub fn tokens_per_second(completion_tokens: u64, elapsed_ms: u64) -> f64 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    completion_tokens as f64 / (elapsed_ms as f64 / 1000.0)
}

/// Two-decimal rendering used everywhere a speed is shown.
pub fn format_speed(tokens_per_second: f64) -> String {
    format!("{:.2}", tokens_per_second)
}

/// A server that can answer a single chat-completion prompt.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32)
        -> Result<RequestResult, RequestError>;
}

#[derive(Clone, Debug)]
pub struct SpeedClient {
    client: Client,
    config: BenchmarkConfig,
}

impl SpeedClient {
    pub fn new(config: BenchmarkConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .context("failed to construct HTTP client")?;

        Ok(Self { client, config })
    }

    pub async fn measure_default(&self, prompt: &str) -> Result<RequestResult, RequestError> {
        self.measure(prompt, DEFAULT_MAX_TOKENS).await
    }

    /// Sends one prompt and times the exchange until the whole body has arrived.
    pub async fn measure(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<RequestResult, RequestError> {
        if prompt.is_empty() {
            return Err(RequestError::InvalidInput("prompt must not be empty"));
        }
        if max_tokens == 0 {
            return Err(RequestError::InvalidInput(
                "max_tokens must be greater than zero",
            ));
        }

        let body = ChatCompletionRequest::new(prompt, max_tokens);

        let start = Instant::now();
        let response = self
            .client
            .post(self.config.endpoint.clone())
            .headers(self.config.headers.clone())
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let total_time_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            endpoint = %self.config.endpoint,
            %status,
            total_time_ms,
            body_bytes = bytes.len(),
            "received completion response"
        );

        if !status.is_success() {
            let snippet: String = String::from_utf8_lossy(&bytes)
                .chars()
                .take(ERROR_BODY_SNIPPET_CHARS)
                .collect();
            return Err(RequestError::Status {
                status,
                body: snippet,
            });
        }

        parse_completion(&bytes, total_time_ms)
    }
}

#[async_trait]
impl CompletionBackend for SpeedClient {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<RequestResult, RequestError> {
        self.measure(prompt, max_tokens).await
    }
}

fn parse_completion(bytes: &[u8], total_time_ms: u64) -> Result<RequestResult, RequestError> {
    let response: ChatCompletionResponse = serde_json::from_slice(bytes)?;
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or(RequestError::NoChoices)?;

    Ok(RequestResult {
        total_time_ms,
        prompt_tokens: response.usage.prompt_tokens,
        completion_tokens: response.usage.completion_tokens,
        total_tokens: response.usage.total_tokens,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ENDPOINT;
    use serde_json::json;

    #[test]
    fn request_body_matches_wire_shape() {
        let body = ChatCompletionRequest::new("Write a haiku about technology.", 20);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "messages": [{"role": "user", "content": "Write a haiku about technology."}],
                "max_tokens": 20,
                "temperature": 0.7,
                "top_p": 0.9,
                "stream": false
            })
        );
    }

    #[test]
    fn parses_usage_and_first_choice() {
        let body = br#"{
            "id": "chatcmpl-1",
            "usage": {"prompt_tokens": 12, "completion_tokens": 48, "total_tokens": 60},
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "first"}},
                {"index": 1, "message": {"role": "assistant", "content": "second"}}
            ]
        }"#;
        let result = parse_completion(body, 2400).unwrap();
        assert_eq!(result.prompt_tokens, 12);
        assert_eq!(result.completion_tokens, 48);
        assert_eq!(result.total_tokens, 60);
        assert_eq!(result.content, "first");
        assert_eq!(result.total_time_ms, 2400);
        assert_eq!(result.tokens_per_second_display(), "20.00");
    }

    #[test]
    fn missing_usage_is_a_decode_error() {
        let body = br#"{"choices": [{"message": {"content": "hi"}}]}"#;
        let err = parse_completion(body, 10).unwrap_err();
        assert!(matches!(err, RequestError::Decode(_)));
    }

    #[test]
    fn empty_choices_is_an_error() {
        let body = br#"{"usage": {"prompt_tokens": 1, "completion_tokens": 2, "total_tokens": 3}, "choices": []}"#;
        let err = parse_completion(body, 10).unwrap_err();
        assert!(matches!(err, RequestError::NoChoices));
    }

    #[test]
    fn non_json_body_is_a_decode_error() {
        let err = parse_completion(b"<html>502 Bad Gateway</html>", 10).unwrap_err();
        assert!(matches!(err, RequestError::Decode(_)));
    }

    #[test]
    fn speed_is_tokens_over_seconds() {
        assert_eq!(tokens_per_second(20, 1000), 20.0);
        assert_eq!(tokens_per_second(50, 4000), 12.5);
        assert_eq!(tokens_per_second(0, 1500), 0.0);
        assert_eq!(tokens_per_second(20, 0), 0.0);

        let result = RequestResult {
            total_time_ms: 3000,
            prompt_tokens: 9,
            completion_tokens: 100,
            total_tokens: 109,
            content: String::new(),
        };
        assert_eq!(result.tokens_per_second_display(), "33.33");
        assert_eq!(result.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn rejects_invalid_input_before_sending() {
        let config = BenchmarkConfig::try_new(DEFAULT_ENDPOINT).unwrap();
        let client = SpeedClient::new(config).unwrap();

        let err = client.measure("", 20).await.unwrap_err();
        assert!(matches!(err, RequestError::InvalidInput(_)));

        let err = client.measure("hello", 0).await.unwrap_err();
        assert!(matches!(err, RequestError::InvalidInput(_)));
    }
}
