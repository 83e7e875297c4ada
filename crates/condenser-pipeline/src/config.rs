//! Configuration for the summarization pipeline

use condenser_domain::{GenerationParameters, Preset};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// End-of-sequence markers stripped from the final summary by default
pub const DEFAULT_EOS_MARKERS: &[&str] = &[
    "<|eot_id|>",
    "<|end_of_text|>",
    "<|endoftext|>",
    "</s>",
    "<s>",
];

/// Configuration for the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum inference calls in flight at once
    pub max_concurrency: usize,

    /// Stop once the result is at most `original / ratio_divisor` characters
    pub ratio_divisor: usize,

    /// Absolute length (characters) at or under which refinement stops
    pub hard_floor_chars: usize,

    /// Maximum number of refinement rounds after the first pass
    pub max_refinement_rounds: usize,

    /// Fail with `ConvergenceExceeded` instead of returning the last result
    /// when the round limit is hit
    pub fail_on_round_cap: bool,

    /// Line width used when re-flowing recombined text
    pub wrap_width: usize,

    /// Maximum time for a single inference call (seconds)
    pub call_timeout_secs: u64,

    /// Maximum time for a whole document (seconds)
    pub request_timeout_secs: u64,

    /// Marker tokens removed from the final summary
    pub eos_markers: Vec<String>,

    /// Preset used for round 1
    pub first_pass: Preset,

    /// Preset used for every later round
    pub refinement: Preset,

    /// Optional chat-model pass over the converged text; absent means off
    pub final_pass: Option<FinalPassConfig>,
}

/// Phrase chat models tend to open a summary with
pub const DEFAULT_PREAMBLE: &str = "Here are the key events summarized:";

/// Settings for the final pass run once over the converged text
///
/// The text is split on whitespace into chunks of at most `max_words` words.
/// Each chunk is summarized, has the configured preambles removed, and the
/// results are joined with `separator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalPassConfig {
    /// Words per chunk
    pub max_words: usize,

    /// Phrases removed from every chunk summary
    pub strip_preambles: Vec<String>,

    /// Placed between chunk summaries
    pub separator: String,

    /// Parameters passed to every final-pass call
    pub generation: GenerationParameters,
}

impl Default for FinalPassConfig {
    fn default() -> Self {
        Self {
            max_words: 2_000,
            strip_preambles: vec![DEFAULT_PREAMBLE.to_string()],
            separator: "\n\n".to_string(),
            generation: GenerationParameters {
                max_length: 500,
                ..GenerationParameters::default()
            },
        }
    }
}

impl FinalPassConfig {
    /// Validate the final pass settings
    pub fn validate(&self) -> Result<(), String> {
        if self.max_words == 0 {
            return Err("final_pass.max_words must be greater than 0".to_string());
        }
        if self.strip_preambles.iter().any(|p| p.is_empty()) {
            return Err("final_pass.strip_preambles must not contain empty strings".to_string());
        }
        self.generation
            .validate()
            .map_err(|e| format!("final_pass: {}", e))
    }
}

impl PipelineConfig {
    /// Get the per-call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Get the overall request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.first_pass.validate()?;
        self.refinement.validate()?;
        if self.first_pass.chunk_size <= self.refinement.chunk_size {
            return Err(format!(
                "first_pass.chunk_size ({}) must be larger than refinement.chunk_size ({})",
                self.first_pass.chunk_size, self.refinement.chunk_size
            ));
        }
        if self.first_pass.generation != self.refinement.generation {
            return Err(
                "first_pass and refinement must use the same generation parameters".to_string(),
            );
        }
        if let Some(final_pass) = &self.final_pass {
            final_pass.validate()?;
        }
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
        }
        if self.ratio_divisor == 0 {
            return Err("ratio_divisor must be greater than 0".to_string());
        }
        if self.wrap_width == 0 {
            return Err("wrap_width must be greater than 0".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if self.eos_markers.iter().any(|m| m.is_empty()) {
            return Err("eos_markers must not contain empty strings".to_string());
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            ratio_divisor: 5,
            hard_floor_chars: 500,
            max_refinement_rounds: 5,
            fail_on_round_cap: false,
            wrap_width: 80,
            call_timeout_secs: 120,
            request_timeout_secs: 900,
            eos_markers: DEFAULT_EOS_MARKERS.iter().map(|m| m.to_string()).collect(),
            first_pass: Preset::first_pass(),
            refinement: Preset::refinement(),
            final_pass: None,
        }
    }
}

impl PipelineConfig {
    /// Fast preset: more parallelism, fewer refinement rounds, tighter timeouts
    pub fn fast() -> Self {
        Self {
            max_concurrency: 8,
            max_refinement_rounds: 2,
            hard_floor_chars: 1_000,
            call_timeout_secs: 60,
            request_timeout_secs: 300,
            ..Self::default()
        }
    }

    /// Thorough preset: more refinement rounds, longer timeouts
    pub fn thorough() -> Self {
        Self {
            max_concurrency: 2,
            max_refinement_rounds: 8,
            hard_floor_chars: 300,
            call_timeout_secs: 300,
            request_timeout_secs: 3_600,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.first_pass.chunk_size, 1_000);
        assert_eq!(config.refinement.chunk_size, 800);
        assert_eq!(config.ratio_divisor, 5);
    }

    #[test]
    fn test_fast_config_is_valid() {
        let config = PipelineConfig::fast();
        assert!(config.validate().is_ok());
        assert!(config.max_refinement_rounds < PipelineConfig::default().max_refinement_rounds);
    }

    #[test]
    fn test_thorough_config_is_valid() {
        let config = PipelineConfig::thorough();
        assert!(config.validate().is_ok());
        assert!(config.max_refinement_rounds > PipelineConfig::default().max_refinement_rounds);
    }

    #[test]
    fn test_invalid_concurrency() {
        let mut config = PipelineConfig::default();
        config.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_chunk_size() {
        let mut config = PipelineConfig::default();
        config.refinement.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_chunk_sizes_rejected() {
        let mut config = PipelineConfig::default();
        config.refinement.chunk_size = 5_000;
        let err = config.validate().unwrap_err();
        assert!(err.contains("must be larger"));

        config.refinement.chunk_size = config.first_pass.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_divergent_generation_rejected() {
        let mut config = PipelineConfig::default();
        config.refinement.generation.max_length = 900;
        config.refinement.generation.num_beams = 1;
        let err = config.validate().unwrap_err();
        assert!(err.contains("same generation parameters"));

        config.refinement.chunk_size = 5_000;
        assert!(config.validate().is_err());
        assert!(crate::ConvergenceController::new(
            std::sync::Arc::new(condenser_llm::MockProvider::default()),
            config
        )
        .is_err());
    }

    #[test]
    fn test_divergent_generation_in_toml_rejected() {
        let config = PipelineConfig::from_toml(
            r#"
            [first_pass]
            name = "first-pass"
            chunk_size = 1000

            [refinement]
            name = "refinement"
            chunk_size = 800

            [refinement.generation]
            max_length = 100
            min_length = 10
            length_penalty = 1.0
            num_beams = 2
            early_stopping = false
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_final_pass_validation() {
        let mut config = PipelineConfig::default();
        config.final_pass = Some(FinalPassConfig::default());
        assert!(config.validate().is_ok());

        config.final_pass = Some(FinalPassConfig {
            max_words: 0,
            ..FinalPassConfig::default()
        });
        assert!(config.validate().is_err());

        config.final_pass = Some(FinalPassConfig {
            strip_preambles: vec![String::new()],
            ..FinalPassConfig::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_final_pass_from_toml() {
        let config = PipelineConfig::from_toml(
            r#"
            [final_pass]
            max_words = 500
            "#,
        )
        .unwrap();

        let final_pass = config.final_pass.unwrap();
        assert_eq!(final_pass.max_words, 500);
        assert_eq!(final_pass.separator, "\n\n");
        assert_eq!(final_pass.strip_preambles, vec![DEFAULT_PREAMBLE.to_string()]);
        assert!(PipelineConfig::default().final_pass.is_none());
    }

    #[test]
    fn test_empty_marker_rejected() {
        let mut config = PipelineConfig::default();
        config.eos_markers.push(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            max_concurrency = 2
            hard_floor_chars = 250

            [refinement]
            name = "tight"
            chunk_size = 600
            "#,
        )
        .unwrap();

        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.hard_floor_chars, 250);
        assert_eq!(config.refinement.chunk_size, 600);
        assert_eq!(config.refinement.generation.max_length, 250);
        assert_eq!(config.first_pass.chunk_size, 1_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::thorough();
        let toml_str = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.max_refinement_rounds, parsed.max_refinement_rounds);
        assert_eq!(config.first_pass, parsed.first_pass);
        assert_eq!(config.eos_markers, parsed.eos_markers);
        assert!(parsed.final_pass.is_none());
    }

    #[test]
    fn test_toml_round_trip_with_final_pass() {
        let mut config = PipelineConfig::default();
        config.final_pass = Some(FinalPassConfig::default());
        let parsed = PipelineConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.final_pass, config.final_pass);
    }
}
