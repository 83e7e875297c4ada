//! Generation parameters and the named presets that pair them with a chunk size.
//!
//! The first round of a run splits the document into larger chunks; every
//! refinement round re-splits the previous output into smaller ones. Both
//! presets share the same generation bounds. Presets are immutable once a
//! round starts: a different preset only takes effect on the next round.

use serde::{Deserialize, Serialize};

/// Default upper bound on summary length per call
pub const DEFAULT_MAX_LENGTH: usize = 250;

/// Default lower bound on summary length per call
pub const DEFAULT_MIN_LENGTH: usize = 50;

/// Default length penalty (values > 1.0 favour longer beams)
pub const DEFAULT_LENGTH_PENALTY: f64 = 2.0;

/// Default beam count
pub const DEFAULT_NUM_BEAMS: u32 = 4;

/// Default first-pass chunk size (characters)
pub const FIRST_PASS_CHUNK_SIZE: usize = 1_000;

/// Default refinement chunk size (characters)
pub const REFINEMENT_CHUNK_SIZE: usize = 800;

/// Bounds and search controls for a single inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    /// Maximum output length
    pub max_length: usize,

    /// Minimum output length
    pub min_length: usize,

    /// Penalizes (< 1.0) or rewards (> 1.0) longer outputs during search
    pub length_penalty: f64,

    /// Search breadth
    pub num_beams: u32,

    /// Stop the search once every beam has produced a finished candidate
    pub early_stopping: bool,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            min_length: DEFAULT_MIN_LENGTH,
            length_penalty: DEFAULT_LENGTH_PENALTY,
            num_beams: DEFAULT_NUM_BEAMS,
            early_stopping: true,
        }
    }
}

impl GenerationParameters {
    /// Validate the parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.max_length == 0 {
            return Err("max_length must be greater than 0".to_string());
        }
        if self.min_length > self.max_length {
            return Err(format!(
                "min_length {} exceeds max_length {}",
                self.min_length, self.max_length
            ));
        }
        if self.num_beams == 0 {
            return Err("num_beams must be at least 1".to_string());
        }
        if !self.length_penalty.is_finite() {
            return Err("length_penalty must be a finite number".to_string());
        }
        Ok(())
    }
}

/// A named chunk size plus the generation parameters used with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Human-readable name, used in logs
    pub name: String,

    /// Maximum segment size for this round (characters)
    pub chunk_size: usize,

    /// Parameters passed to every inference call in the round
    #[serde(default)]
    pub generation: GenerationParameters,
}

impl Preset {
    /// Preset for the first round: larger chunks
    pub fn first_pass() -> Self {
        Self {
            name: "first-pass".to_string(),
            chunk_size: FIRST_PASS_CHUNK_SIZE,
            generation: GenerationParameters::default(),
        }
    }

    /// Preset for every round after the first: smaller chunks
    pub fn refinement() -> Self {
        Self {
            name: "refinement".to_string(),
            chunk_size: REFINEMENT_CHUNK_SIZE,
            generation: GenerationParameters::default(),
        }
    }

    /// Validate the preset
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err(format!("preset '{}': chunk_size must be greater than 0", self.name));
        }
        self.generation
            .validate()
            .map_err(|e| format!("preset '{}': {}", self.name, e))
    }
}
