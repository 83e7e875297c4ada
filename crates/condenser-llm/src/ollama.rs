//! Ollama Provider Implementation
//!
//! Summarizes segments with a model served by a local Ollama instance.
//!
//! # Features
//!
//! - Output bounded through `options.num_predict`
//! - Retry logic with exponential backoff
//! - Timeout handling
//! - Model preload on `warm_up` and unload on `shutdown`
//!
//! # Examples
//!
//! ```no_run
//! use condenser_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1").unwrap();
//! ```

use crate::http::{block_on, build_client, read_json, send_with_retries};
use crate::prompt::SummaryPrompt;
use crate::{ensure_encodable, LlmError};
use condenser_domain::{GenerationParameters, InferenceProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for a single generation (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Ollama API provider for local inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<i64>,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: usize,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3.1", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new Ollama provider with a custom per-request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: build_client(timeout)?,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Create a new Ollama provider against `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.endpoint)
    }

    /// Summarize a segment using the Ollama API
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The segment is blank
    /// - Ollama is not running
    /// - Model is not available
    /// - The request times out
    /// - Response format is invalid or the summary is empty
    pub async fn summarize_async(
        &self,
        segment: &str,
        params: &GenerationParameters,
    ) -> Result<String, LlmError> {
        ensure_encodable(segment)?;

        let url = self.generate_url();
        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt: Some(SummaryPrompt::new(segment, params).build()),
            stream: false,
            options: Some(OllamaOptions {
                num_predict: params.max_length,
            }),
            keep_alive: None,
        };

        let response = send_with_retries(
            || self.client.post(&url).json(&request_body),
            self.max_retries,
            &self.model,
        )
        .await?;

        let body: OllamaGenerateResponse = read_json(response).await?;
        let summary = body.response.trim().to_string();
        if summary.is_empty() {
            return Err(LlmError::InvalidResponse("empty summary".to_string()));
        }

        debug!("Ollama returned {} chars for {} char segment", summary.len(), segment.len());
        Ok(summary)
    }

    /// Load the model into memory so the first request does not pay for it
    pub async fn preload(&self) -> Result<(), LlmError> {
        let url = self.generate_url();
        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt: None,
            stream: false,
            options: None,
            keep_alive: None,
        };

        send_with_retries(
            || self.client.post(&url).json(&request_body),
            self.max_retries,
            &self.model,
        )
        .await?;

        info!("Ollama model '{}' loaded", self.model);
        Ok(())
    }

    /// Ask Ollama to evict the model from memory
    pub async fn unload(&self) -> Result<(), LlmError> {
        let url = self.generate_url();
        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt: None,
            stream: false,
            options: None,
            keep_alive: Some(0),
        };

        send_with_retries(|| self.client.post(&url).json(&request_body), 1, &self.model).await?;

        info!("Ollama model '{}' unloaded", self.model);
        Ok(())
    }
}

impl InferenceProvider for OllamaProvider {
    type Error = LlmError;

    fn summarize(&self, segment: &str, params: &GenerationParameters) -> Result<String, Self::Error> {
        block_on(self.summarize_async(segment, params))?
    }

    fn warm_up(&self) -> Result<(), Self::Error> {
        block_on(self.preload())?
    }

    fn shutdown(&self) -> Result<(), Self::Error> {
        block_on(self.unload())?
    }
}
