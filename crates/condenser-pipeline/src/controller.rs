//! Convergence controller
//!
//! Drives rounds of chunk → summarize → recombine until the text is short
//! enough. Round 1 uses the first-pass preset; every later round uses the
//! refinement preset on the previous round's output.
//!
//! A run stops when:
//! - the result is at most `original / ratio_divisor` characters (any round)
//! - the result is at most `hard_floor_chars` (refinement rounds only)
//! - `max_refinement_rounds` refinement rounds have run
//!
//! so every run ends after at most `1 + max_refinement_rounds` rounds.
//!
//! When `final_pass` is configured, the converged text is split into word
//! chunks and summarized once more, usually by a chat model, before the
//! output is formatted.

use crate::chunking::split_words;
use crate::config::{FinalPassConfig, PipelineConfig};
use crate::error::PipelineError;
use crate::executor::BatchExecutor;
use crate::format::{finalize, strip_preambles};
use condenser_domain::{char_len, InferenceProvider, StopReason, SummaryOutcome};
use std::fmt::Display;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Position of a run in the convergence state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No round has run yet
    Initial,
    /// Round 1, using the first-pass preset
    FirstPass,
    /// A refinement round (`round` ≥ 2), using the refinement preset
    Refinement {
        /// One-based round number
        round: usize,
    },
    /// Finished with a usable summary
    Done(StopReason),
    /// A round failed; terminal
    Failed,
}

impl ControllerState {
    /// Round number executed in this state, if it runs one
    pub fn round(&self) -> Option<usize> {
        match self {
            ControllerState::FirstPass => Some(1),
            ControllerState::Refinement { round } => Some(*round),
            _ => None,
        }
    }

    /// True for `Done` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, ControllerState::Done(_) | ControllerState::Failed)
    }
}

/// Compute the state that follows `state`, given the character length of the
/// round that just ran in it.
///
/// `round_len` is ignored for `Initial`, which always moves to `FirstPass`.
/// Terminal states map to themselves.
pub fn next_state(
    state: ControllerState,
    round_len: usize,
    original_len: usize,
    config: &PipelineConfig,
) -> ControllerState {
    let ratio_reached = round_len.saturating_mul(config.ratio_divisor) <= original_len;

    match state {
        ControllerState::Initial => ControllerState::FirstPass,
        ControllerState::FirstPass => {
            if ratio_reached {
                ControllerState::Done(StopReason::RatioReached)
            } else if config.max_refinement_rounds == 0 {
                ControllerState::Done(StopReason::RoundCapReached)
            } else {
                ControllerState::Refinement { round: 2 }
            }
        }
        ControllerState::Refinement { round } => {
            if ratio_reached {
                ControllerState::Done(StopReason::RatioReached)
            } else if round_len <= config.hard_floor_chars {
                ControllerState::Done(StopReason::FloorReached)
            } else if round.saturating_sub(1) >= config.max_refinement_rounds {
                ControllerState::Done(StopReason::RoundCapReached)
            } else {
                ControllerState::Refinement { round: round + 1 }
            }
        }
        terminal => terminal,
    }
}

/// Iteratively summarizes a document until it converges
pub struct ConvergenceController<P> {
    executor: BatchExecutor<P>,
    final_executor: Option<BatchExecutor<P>>,
    config: PipelineConfig,
}

impl<P> ConvergenceController<P>
where
    P: InferenceProvider + Send + Sync + 'static,
    P::Error: Display,
{
    /// Create a controller over a shared provider
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the configuration is invalid.
    pub fn new(provider: Arc<P>, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        let final_executor = config
            .final_pass
            .as_ref()
            .map(|_| Self::build_executor(Arc::clone(&provider), &config));
        let executor = Self::build_executor(provider, &config);

        Ok(Self {
            executor,
            final_executor,
            config,
        })
    }

    /// Run the final pass on a separate provider
    ///
    /// Enables the final pass with default settings if the configuration
    /// did not include one.
    pub fn with_final_provider(mut self, provider: Arc<P>) -> Self {
        if self.config.final_pass.is_none() {
            self.config.final_pass = Some(FinalPassConfig::default());
        }
        self.final_executor = Some(Self::build_executor(provider, &self.config));
        self
    }

    fn build_executor(provider: Arc<P>, config: &PipelineConfig) -> BatchExecutor<P> {
        BatchExecutor::new(provider, config.max_concurrency)
            .with_call_timeout(config.call_timeout())
            .with_wrap_width(config.wrap_width)
    }

    /// The configuration this controller runs with
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Summarize a whole document
    ///
    /// The run is bounded by the configured request timeout. When it
    /// expires the in-flight batch is dropped and no further calls start.
    /// Calls already running on the blocking pool are not interrupted; they
    /// finish in the background and their results are discarded.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Round`] if any round failed (the cause carries the
    ///   segment index for inference failures)
    /// - [`PipelineError::ConvergenceExceeded`] if the round cap was hit and
    ///   `fail_on_round_cap` is set
    /// - [`PipelineError::FinalPass`] if the final pass failed
    /// - [`PipelineError::Timeout`] if the request deadline passed
    pub async fn summarize(&self, document: &str) -> Result<SummaryOutcome, PipelineError> {
        let run_id = Uuid::now_v7();
        let limit = self.config.request_timeout();
        let span = info_span!("summarize", %run_id);

        async {
            match timeout(limit, self.run(document)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!("Summarization timed out after {:?}", limit);
                    Err(PipelineError::Timeout(limit))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, document: &str) -> Result<SummaryOutcome, PipelineError> {
        let original_len = char_len(document);
        info!("Summarizing document of {} chars", original_len);

        let mut state = next_state(ControllerState::Initial, 0, original_len, &self.config);
        let mut current = document.to_string();
        let mut rounds = 0;

        let stop_reason = loop {
            let (round, preset) = match state {
                ControllerState::FirstPass => (1, &self.config.first_pass),
                ControllerState::Refinement { round } => (round, &self.config.refinement),
                ControllerState::Done(reason) => break reason,
                ControllerState::Initial | ControllerState::Failed => {
                    return Err(PipelineError::Config(format!(
                        "controller reached unexpected state {:?}",
                        state
                    )))
                }
            };

            let result = match self.executor.run_round(&current, preset, round).await {
                Ok(result) => result,
                Err(e) => {
                    debug!("State {:?} -> {:?}", state, ControllerState::Failed);
                    error!("Round {} failed: {}", round, e);
                    return Err(PipelineError::Round {
                        round,
                        source: Box::new(e),
                    });
                }
            };

            let next = next_state(state, result.char_len, original_len, &self.config);
            debug!("State {:?} -> {:?} at {} chars", state, next, result.char_len);

            rounds = round;
            current = result.text;
            state = next;
        };

        if stop_reason == StopReason::RoundCapReached {
            warn!(
                "Round cap reached after {} rounds ({} chars, target {})",
                rounds,
                char_len(&current),
                original_len / self.config.ratio_divisor
            );
            if self.config.fail_on_round_cap {
                return Err(PipelineError::ConvergenceExceeded { rounds });
            }
        }

        if let (Some(executor), Some(pass)) = (&self.final_executor, &self.config.final_pass) {
            current = self
                .final_pass(executor, pass, &current)
                .await
                .map_err(|e| {
                    error!("Final pass failed: {}", e);
                    PipelineError::FinalPass(Box::new(e))
                })?;
        }

        let text = finalize(&current, &self.config.eos_markers);
        info!(
            "Finished after {} rounds ({}): {} -> {} chars",
            rounds,
            stop_reason,
            original_len,
            char_len(&text)
        );

        Ok(SummaryOutcome {
            text,
            rounds,
            original_char_len: original_len,
            stop_reason,
        })
    }

    async fn final_pass(
        &self,
        executor: &BatchExecutor<P>,
        pass: &FinalPassConfig,
        text: &str,
    ) -> Result<String, PipelineError> {
        let segments = split_words(text, pass.max_words);
        info!(
            "Final pass: {} chunks of up to {} words",
            segments.len(),
            pass.max_words
        );

        let summaries = executor.summarize_segments(segments, &pass.generation).await?;
        let cleaned: Vec<String> = summaries
            .iter()
            .map(|summary| strip_preambles(summary, &pass.strip_preambles))
            .filter(|summary| !summary.is_empty())
            .collect();

        Ok(cleaned.join(&pass.separator))
    }
}
