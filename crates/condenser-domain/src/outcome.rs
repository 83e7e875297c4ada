//! Round results and the terminal outcome of a summarization run

use serde::{Deserialize, Serialize};
use std::fmt;

/// The recombined text produced by one chunk → summarize → join pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    /// One-based round number
    pub round: usize,

    /// Recombined, re-wrapped text
    pub text: String,

    /// Length of `text` in characters
    pub char_len: usize,

    /// Number of segments summarized in this round
    pub segment_count: usize,
}

impl RoundResult {
    /// Build a round result, measuring the text
    pub fn new(round: usize, text: String, segment_count: usize) -> Self {
        let char_len = crate::segment::char_len(&text);
        Self {
            round,
            text,
            char_len,
            segment_count,
        }
    }
}

/// Why a run stopped iterating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The result reached the target fraction of the original length
    RatioReached,
    /// The result fell under the absolute minimum length
    FloorReached,
    /// The refinement round limit was hit first
    RoundCapReached,
}

impl StopReason {
    /// Stable label for logs and API responses
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::RatioReached => "ratio_reached",
            StopReason::FloorReached => "floor_reached",
            StopReason::RoundCapReached => "round_cap_reached",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final artifact of a summarization run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOutcome {
    /// Post-processed summary text
    pub text: String,

    /// Number of rounds executed (first pass included)
    pub rounds: usize,

    /// Length of the input document in characters
    pub original_char_len: usize,

    /// How the run terminated
    pub stop_reason: StopReason,
}

impl SummaryOutcome {
    /// Length of the summary in characters
    pub fn char_len(&self) -> usize {
        crate::segment::char_len(&self.text)
    }
}
