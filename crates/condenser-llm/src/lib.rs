//! Condenser Inference Providers
//!
//! Implementations of the `InferenceProvider` trait from `condenser-domain`.
//! Every provider turns one segment plus its `GenerationParameters` into a
//! summary string.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic fake for testing, with scripted responses,
//!   failures and latency
//! - `OllamaProvider`: Local Ollama API integration
//! - `OpenAiCompatProvider`: Any OpenAI-style chat completions server
//!   (llama.cpp, vLLM, hosted APIs)
//!
//! # Examples
//!
//! ```
//! use condenser_llm::MockProvider;
//! use condenser_domain::{GenerationParameters, InferenceProvider};
//!
//! let provider = MockProvider::new("A short summary.");
//! let params = GenerationParameters::default();
//! let result = provider.summarize("Some long text", &params).unwrap();
//! assert_eq!(result, "A short summary.");
//! ```

#![warn(missing_docs)]

mod http;
pub mod ollama;
pub mod openai;
pub mod prompt;

use condenser_domain::{GenerationParameters, InferenceProvider};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaProvider;
pub use openai::OpenAiCompatProvider;
pub use prompt::SummaryPrompt;

/// Errors that can occur during inference
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Input could not be encoded for the model
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Generation did not finish in time
    #[error("Inference timed out")]
    Timeout,

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Reject input that no backend can summarize.
pub(crate) fn ensure_encodable(segment: &str) -> Result<(), LlmError> {
    if segment.trim().is_empty() {
        return Err(LlmError::Encoding("segment is empty".to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
enum MockBehavior {
    Fixed(String),
    Truncate,
}

#[derive(Debug, Clone)]
enum MockResponse {
    Text(String),
    Error(String),
}

/// Mock inference provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network
/// calls. Responses, failures and artificial latency can be scripted per
/// segment, which makes it the substitute for a real model in pipeline tests.
///
/// # Examples
///
/// ```
/// use condenser_llm::MockProvider;
/// use condenser_domain::{GenerationParameters, InferenceProvider};
///
/// let params = GenerationParameters::default();
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.summarize("any segment", &params).unwrap(), "Fixed response");
///
/// // Scripted responses
/// let mut provider = MockProvider::default();
/// provider.add_response("segment one", "summary one");
/// provider.add_response("segment two", "summary two");
/// assert_eq!(provider.summarize("segment one", &params).unwrap(), "summary one");
/// assert_eq!(provider.summarize("segment two", &params).unwrap(), "summary two");
///
/// // Length-bounded echo of the input
/// let provider = MockProvider::truncating();
/// let params = GenerationParameters { max_length: 5, min_length: 1, ..Default::default() };
/// assert_eq!(provider.summarize("abcdefghij", &params).unwrap(), "abcde");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    call_count: Arc<AtomicUsize>,
    warm: Arc<AtomicBool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all segments
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Fixed(response.into()))
    }

    /// Create a MockProvider that answers with the first `max_length`
    /// characters of each segment
    pub fn truncating() -> Self {
        Self::with_behavior(MockBehavior::Truncate)
    }

    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            responses: Arc::new(Mutex::new(HashMap::new())),
            delays: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
            warm: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a specific response for a given segment
    pub fn add_response(&mut self, segment: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).insert(segment.into(), MockResponse::Text(response.into()));
    }

    /// Configure to return an error for a specific segment
    pub fn add_error(&mut self, segment: impl Into<String>) {
        lock(&self.responses).insert(
            segment.into(),
            MockResponse::Error("Mock error".to_string()),
        );
    }

    /// Block for `delay` before answering a specific segment
    pub fn add_delay(&mut self, segment: impl Into<String>, delay: Duration) {
        lock(&self.delays).insert(segment.into(), delay);
    }

    /// Get the number of times summarize was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    /// True between `warm_up` and `shutdown`
    pub fn is_warm(&self) -> bool {
        self.warm.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock summary")
    }
}

impl InferenceProvider for MockProvider {
    type Error = LlmError;

    fn summarize(&self, segment: &str, params: &GenerationParameters) -> Result<String, Self::Error> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let delay = lock(&self.delays).get(segment).copied();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let scripted = lock(&self.responses).get(segment).cloned();
        match scripted {
            Some(MockResponse::Text(text)) => return Ok(text),
            Some(MockResponse::Error(message)) => return Err(LlmError::Other(message)),
            None => {}
        }

        ensure_encodable(segment)?;

        match &self.behavior {
            MockBehavior::Fixed(text) => Ok(text.clone()),
            MockBehavior::Truncate => Ok(segment
                .chars()
                .take(params.max_length)
                .collect::<String>()
                .trim()
                .to_string()),
        }
    }

    fn warm_up(&self) -> Result<(), Self::Error> {
        self.warm.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown(&self) -> Result<(), Self::Error> {
        self.warm.store(false, Ordering::SeqCst);
        Ok(())
    }
}
