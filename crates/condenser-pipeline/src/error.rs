//! Error types for the summarization pipeline

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while summarizing a document
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid chunk size
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// An inference call failed; the whole batch was discarded
    #[error("Inference failed for segment {index}: {message}")]
    Inference {
        /// Index of the failing segment within its round
        index: usize,
        /// Error reported by the inference backend
        message: String,
    },

    /// A round failed; wraps the underlying cause
    #[error("Round {round} failed: {source}")]
    Round {
        /// One-based round number
        round: usize,
        /// What went wrong in that round
        #[source]
        source: Box<PipelineError>,
    },

    /// The final pass over the converged text failed
    #[error("Final pass failed: {0}")]
    FinalPass(#[source] Box<PipelineError>),

    /// The refinement round limit was reached without converging
    #[error("Summary did not converge after {rounds} rounds")]
    ConvergenceExceeded {
        /// Rounds executed before giving up
        rounds: usize,
    },

    /// The overall request deadline passed
    #[error("Summarization timed out after {0:?}")]
    Timeout(Duration),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Stable snake_case label for the error kind
    ///
    /// Round failures report the kind of their cause.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Chunking(_) => "chunking_error",
            PipelineError::Inference { .. } => "inference_error",
            PipelineError::Round { source, .. } => source.kind(),
            PipelineError::FinalPass(source) => source.kind(),
            PipelineError::ConvergenceExceeded { .. } => "convergence_exceeded",
            PipelineError::Timeout(_) => "timeout",
            PipelineError::Config(_) => "config_error",
        }
    }

    /// Index of the failing segment, if the failure came from one
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            PipelineError::Inference { index, .. } => Some(*index),
            PipelineError::Round { source, .. } => source.segment_index(),
            PipelineError::FinalPass(source) => source.segment_index(),
            _ => None,
        }
    }

    /// Round in which the failure happened, if known
    pub fn round(&self) -> Option<usize> {
        match self {
            PipelineError::Round { round, .. } => Some(*round),
            _ => None,
        }
    }
}
