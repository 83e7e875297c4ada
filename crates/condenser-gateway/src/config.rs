//! Configuration file parsing for the Gateway.
//!
//! Loads settings from TOML files: bind address, request limits, the
//! inference backend and the pipeline tuning.

use condenser_pipeline::PipelineConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Gateway configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which inference backend serves summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    Ollama,
    /// OpenAI-style chat completions server (llama.cpp, vLLM, hosted)
    OpenAi,
    /// In-process truncating mock, for dry runs
    Mock,
}

impl ProviderKind {
    /// Lowercase name as used in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Mock => "mock",
        }
    }
}

/// Inference backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Backend kind (default: ollama)
    #[serde(default = "default_kind")]
    pub kind: ProviderKind,

    /// Base URL; each backend has its own default
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Model name (e.g., "llama3.1")
    #[serde(default)]
    pub model: String,

    /// Bearer token for OpenAI-style servers
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request HTTP timeout in seconds (default: 120)
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    /// Retries for transient backend failures (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl ProviderConfig {
    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if self.kind != ProviderKind::Mock && self.model.is_empty() {
            return Err(ConfigError::MissingField(format!("{}.model", section)));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(format!(
                "{}.timeout_secs must be greater than 0",
                section
            )));
        }
        Ok(())
    }
}

/// Gateway configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 5000)
    pub bind_port: u16,

    /// Longest accepted document, in characters (default: 500 000)
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,

    /// Inference backend
    pub provider: ProviderConfig,

    /// Separate backend for the final pass (e.g. a chat model); enables
    /// the final pass when present
    #[serde(default)]
    pub final_provider: Option<ProviderConfig>,

    /// Pipeline tuning; every field is optional
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_kind() -> ProviderKind {
    ProviderKind::Ollama
}

fn default_provider_timeout() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

/// Default text limit: 500 000 characters
fn default_max_text_length() -> usize {
    500_000
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.provider.validate("provider")?;
        if let Some(final_provider) = &self.final_provider {
            final_provider.validate("final_provider")?;
        }
        if self.max_text_length == 0 {
            return Err(ConfigError::Invalid(
                "max_text_length must be greater than 0".to_string(),
            ));
        }
        self.pipeline.validate().map_err(ConfigError::Invalid)
    }

    /// Create a default configuration for a local Ollama server
    pub fn default_local_config() -> Self {
        GatewayConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 5000,
            max_text_length: default_max_text_length(),
            provider: ProviderConfig {
                kind: ProviderKind::Ollama,
                endpoint: None,
                model: "llama3.1".to_string(),
                api_key: None,
                timeout_secs: default_provider_timeout(),
                max_retries: default_max_retries(),
            },
            final_provider: None,
            pipeline: PipelineConfig::default(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
