//! Condenser Domain Layer
//!
//! Core data model for iterative document summarization. This crate does no
//! I/O: it defines the values that flow through a summarization run and the
//! trait boundary to the inference backend.
//!
//! ## Key Concepts
//!
//! - **Segment**: a bounded, ordered slice of text summarized in one call
//! - **GenerationParameters**: length bounds and search controls for one call
//! - **Preset**: a chunk size paired with generation parameters
//! - **RoundResult**: the recombined output of one chunk → summarize → join pass
//! - **SummaryOutcome**: the final summary plus how the run terminated
//!
//! ## Architecture
//!
//! - Infrastructure (HTTP backends, mocks) lives in `condenser-llm`
//! - Orchestration (chunking, batching, convergence) lives in `condenser-pipeline`
//! - Everything here is plain data plus the [`traits::InferenceProvider`] seam

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod generation;
pub mod outcome;
pub mod segment;
pub mod traits;

// Re-exports for convenience
pub use generation::{GenerationParameters, Preset};
pub use outcome::{RoundResult, StopReason, SummaryOutcome};
pub use segment::{char_len, Segment};
pub use traits::InferenceProvider;
