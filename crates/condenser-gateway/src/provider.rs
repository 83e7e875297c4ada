//! Runtime selection of the inference backend.

use crate::config::{ProviderConfig, ProviderKind};
use condenser_domain::{GenerationParameters, InferenceProvider};
use condenser_llm::{ollama, openai, LlmError, MockProvider, OllamaProvider, OpenAiCompatProvider};
use std::time::Duration;

/// The backend chosen by the `[provider]` section
pub enum Backend {
    /// Local Ollama server
    Ollama(OllamaProvider),
    /// OpenAI-style chat completions server
    OpenAi(OpenAiCompatProvider),
    /// In-process mock
    Mock(MockProvider),
}

impl Backend {
    /// Build the configured backend
    pub fn from_config(config: &ProviderConfig) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(config.timeout_secs);

        match config.kind {
            ProviderKind::Ollama => {
                let endpoint = config.endpoint.as_deref().unwrap_or(ollama::DEFAULT_ENDPOINT);
                let provider = OllamaProvider::with_timeout(endpoint, &config.model, timeout)?
                    .with_max_retries(config.max_retries);
                Ok(Backend::Ollama(provider))
            }
            ProviderKind::OpenAi => {
                let base_url = config.endpoint.as_deref().unwrap_or(openai::DEFAULT_BASE_URL);
                let mut provider = OpenAiCompatProvider::new(base_url, &config.model)?
                    .with_timeout(timeout)?
                    .with_max_retries(config.max_retries);
                if let Some(key) = &config.api_key {
                    provider = provider.with_api_key(key);
                }
                Ok(Backend::OpenAi(provider))
            }
            ProviderKind::Mock => Ok(Backend::Mock(MockProvider::truncating())),
        }
    }

    /// Short label for logs and the health endpoint
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Ollama(_) => ProviderKind::Ollama.as_str(),
            Backend::OpenAi(_) => ProviderKind::OpenAi.as_str(),
            Backend::Mock(_) => ProviderKind::Mock.as_str(),
        }
    }
}

impl InferenceProvider for Backend {
    type Error = LlmError;

    fn summarize(&self, segment: &str, params: &GenerationParameters) -> Result<String, LlmError> {
        match self {
            Backend::Ollama(p) => p.summarize(segment, params),
            Backend::OpenAi(p) => p.summarize(segment, params),
            Backend::Mock(p) => p.summarize(segment, params),
        }
    }

    fn warm_up(&self) -> Result<(), LlmError> {
        match self {
            Backend::Ollama(p) => p.warm_up(),
            Backend::OpenAi(p) => p.warm_up(),
            Backend::Mock(p) => p.warm_up(),
        }
    }

    fn shutdown(&self) -> Result<(), LlmError> {
        match self {
            Backend::Ollama(p) => p.shutdown(),
            Backend::OpenAi(p) => p.shutdown(),
            Backend::Mock(p) => p.shutdown(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    #[test]
    fn test_build_each_kind() {
        let mut config = GatewayConfig::default_local_config().provider;
        assert_eq!(Backend::from_config(&config).unwrap().name(), "ollama");

        config.kind = ProviderKind::OpenAi;
        config.api_key = Some("sk-test".to_string());
        assert_eq!(Backend::from_config(&config).unwrap().name(), "openai");

        config.kind = ProviderKind::Mock;
        assert_eq!(Backend::from_config(&config).unwrap().name(), "mock");
    }

    #[test]
    fn test_mock_backend_dispatch() {
        let backend = Backend::Mock(MockProvider::new("dispatched"));
        assert!(backend.warm_up().is_ok());
        let summary = backend
            .summarize("some segment", &GenerationParameters::default())
            .unwrap();
        assert_eq!(summary, "dispatched");
    }
}
