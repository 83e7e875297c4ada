//! Trait definitions for external interactions
//!
//! The inference backend is the only collaborator the summarization pipeline
//! talks to. Implementations live in `condenser-llm`.

use crate::GenerationParameters;

/// Summarizes one segment of text
///
/// Implemented by the infrastructure layer (condenser-llm).
///
/// Calls are blocking and may be slow. The pipeline runs them on the blocking
/// thread pool, several at a time, so implementations must tolerate
/// concurrent invocation through a shared reference.
///
/// An implementation should honor `params.max_length` / `params.min_length`
/// as output bounds and return a non-empty summary for non-empty input. Exact
/// output need not be reproducible.
pub trait InferenceProvider {
    /// Error type for inference operations
    type Error;

    /// Summarize a single segment
    fn summarize(&self, segment: &str, params: &GenerationParameters) -> Result<String, Self::Error>;

    /// Prepare the backend (load the model, open connections)
    ///
    /// Called once before the first request is served.
    fn warm_up(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Release backend resources
    ///
    /// Called once after the last request has been served.
    fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}
