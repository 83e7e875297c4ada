//! OpenAI-compatible chat completions provider
//!
//! Works against any server that speaks the `/v1/chat/completions` protocol:
//! a llama.cpp server, vLLM, or a hosted API.

use crate::http::{block_on, build_client, read_json, send_with_retries};
use crate::prompt::{SummaryPrompt, SYSTEM_PROMPT};
use crate::{ensure_encodable, LlmError};
use condenser_domain::{GenerationParameters, InferenceProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default base URL (a local llama.cpp server)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1";

/// Key sent when the server does not check one
pub const NO_KEY: &str = "sk-no-key-required";

/// Default timeout for a single completion (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Chat completions provider
pub struct OpenAiCompatProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: usize,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatProvider {
    /// Create a provider for `model` served at `base_url`
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: NO_KEY.to_string(),
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set the bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Replace the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Summarize a segment through the chat completions endpoint
    pub async fn summarize_async(
        &self,
        segment: &str,
        params: &GenerationParameters,
    ) -> Result<String, LlmError> {
        ensure_encodable(segment)?;

        let url = format!("{}/chat/completions", self.base_url);
        let prompt = SummaryPrompt::new(segment, params).build();
        let request_body = CompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: params.max_length,
        };

        let response = send_with_retries(
            || {
                self.client
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&request_body)
            },
            self.max_retries,
            &self.model,
        )
        .await?;

        let body: CompletionResponse = read_json(response).await?;
        let summary = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("no completion content".to_string()))?;

        debug!("Completion returned {} chars", summary.len());
        Ok(summary)
    }
}

impl InferenceProvider for OpenAiCompatProvider {
    type Error = LlmError;

    fn summarize(&self, segment: &str, params: &GenerationParameters) -> Result<String, Self::Error> {
        block_on(self.summarize_async(segment, params))?
    }
}
