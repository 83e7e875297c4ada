//! Parallel batch execution of inference calls
//!
//! Every segment of a round is summarized concurrently, bounded by a
//! semaphore. The backend is synchronous, so each call runs on the blocking
//! thread pool. Results are written into a pre-sized slot vector by segment
//! index, so the output order never depends on completion order.
//!
//! A batch is all-or-nothing: the first failure drops every outstanding call
//! and the partial results with it.

use crate::chunking::TextChunker;
use crate::error::PipelineError;
use crate::format::recombine;
use condenser_domain::{
    char_len, GenerationParameters, InferenceProvider, Preset, RoundResult, Segment,
};
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info};

/// Default maximum number of inference calls in flight
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default display width for recombined text
pub const DEFAULT_WRAP_WIDTH: usize = 80;

/// Runs one round's inference calls in parallel
pub struct BatchExecutor<P> {
    provider: Arc<P>,
    max_concurrency: usize,
    call_timeout: Option<Duration>,
    wrap_width: usize,
}

impl<P> BatchExecutor<P>
where
    P: InferenceProvider + Send + Sync + 'static,
    P::Error: Display,
{
    /// Create an executor allowing `max_concurrency` calls at once
    pub fn new(provider: Arc<P>, max_concurrency: usize) -> Self {
        Self {
            provider,
            max_concurrency: max_concurrency.max(1),
            call_timeout: None,
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }

    /// Fail a call that runs longer than `limit`
    pub fn with_call_timeout(mut self, limit: Duration) -> Self {
        self.call_timeout = Some(limit);
        self
    }

    /// Set the line width used when recombining summaries
    pub fn with_wrap_width(mut self, width: usize) -> Self {
        self.wrap_width = width;
        self
    }

    /// Summarize every segment, returning summaries in segment order
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Inference`] carrying the index of the first
    /// segment observed to fail. No partial results are returned.
    pub async fn summarize_segments(
        &self,
        segments: Vec<Segment>,
        params: &GenerationParameters,
    ) -> Result<Vec<String>, PipelineError> {
        let total = segments.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let params = Arc::new(params.clone());

        let mut in_flight: FuturesUnordered<_> = segments
            .into_iter()
            .map(|segment| {
                let index = segment.index;
                let call = summarize_one(
                    Arc::clone(&self.provider),
                    Arc::clone(&semaphore),
                    segment,
                    Arc::clone(&params),
                    self.call_timeout,
                );
                async move { (index, call.await) }
            })
            .collect();

        let mut slots: Vec<Option<String>> = vec![None; total];

        while let Some((index, outcome)) = in_flight.next().await {
            match outcome {
                Ok(summary) => {
                    debug!("Segment {} summarized ({} chars)", index, char_len(&summary));
                    match slots.get_mut(index) {
                        Some(slot) => *slot = Some(summary),
                        None => {
                            return Err(PipelineError::Inference {
                                index,
                                message: format!("segment index out of range (batch of {})", total),
                            })
                        }
                    }
                }
                Err(e) => {
                    error!("Batch failed at segment {}: {}", index, e);
                    return Err(e);
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| PipelineError::Inference {
                    index,
                    message: "no summary produced".to_string(),
                })
            })
            .collect()
    }

    /// Run one full round: chunk `text` with the preset's chunk size,
    /// summarize every segment, recombine and re-wrap.
    pub async fn run_round(
        &self,
        text: &str,
        preset: &Preset,
        round: usize,
    ) -> Result<RoundResult, PipelineError> {
        let chunker = TextChunker::new(preset.chunk_size)?;
        let segments = chunker.chunk(text);
        let segment_count = segments.len();

        info!(
            "Round {} ({}): {} segments of up to {} chars",
            round, preset.name, segment_count, preset.chunk_size
        );

        let summaries = self.summarize_segments(segments, &preset.generation).await?;
        let result = RoundResult::new(round, recombine(&summaries, self.wrap_width), segment_count);

        info!("Round {} produced {} chars", round, result.char_len);
        Ok(result)
    }
}

/// Summarize a single segment under the concurrency limit.
///
/// Blank segments carry no content and are passed through as empty
/// summaries without a backend call.
async fn summarize_one<P>(
    provider: Arc<P>,
    semaphore: Arc<Semaphore>,
    segment: Segment,
    params: Arc<GenerationParameters>,
    call_timeout: Option<Duration>,
) -> Result<String, PipelineError>
where
    P: InferenceProvider + Send + Sync + 'static,
    P::Error: Display,
{
    let index = segment.index;
    if segment.text.trim().is_empty() {
        return Ok(String::new());
    }

    let permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| PipelineError::Inference {
            index,
            message: format!("worker pool closed: {}", e),
        })?;

    // The permit moves into the blocking call so the limit holds until the
    // backend actually returns, even if this future is dropped.
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        provider
            .summarize(&segment.text, &params)
            .map_err(|e| e.to_string())
    });

    let joined = match call_timeout {
        Some(limit) => timeout(limit, handle)
            .await
            .map_err(|_| PipelineError::Inference {
                index,
                message: format!("timed out after {:?}", limit),
            })?,
        None => handle.await,
    };

    match joined {
        Ok(Ok(summary)) if summary.trim().is_empty() => Err(PipelineError::Inference {
            index,
            message: "backend returned an empty summary".to_string(),
        }),
        Ok(Ok(summary)) => Ok(summary),
        Ok(Err(message)) => Err(PipelineError::Inference { index, message }),
        Err(e) => Err(PipelineError::Inference {
            index,
            message: format!("worker task failed: {}", e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use condenser_llm::{LlmError, MockProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn segments(texts: &[&str]) -> Vec<Segment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Segment::new(i, *t))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let executor = BatchExecutor::new(Arc::new(MockProvider::default()), 4);
        let result = executor
            .summarize_segments(Vec::new(), &GenerationParameters::default())
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_order_preserved_when_first_segment_is_slowest() {
        let mut provider = MockProvider::default();
        provider.add_response("aaaa", "A");
        provider.add_response("bbbb", "B");
        provider.add_response("cccc", "C");
        provider.add_delay("aaaa", Duration::from_millis(200));
        let provider = Arc::new(provider);

        let executor = BatchExecutor::new(Arc::clone(&provider), 4);
        let result = executor
            .summarize_segments(
                segments(&["aaaa", "bbbb", "cccc"]),
                &GenerationParameters::default(),
            )
            .await
            .unwrap();

        assert_eq!(result, vec!["A", "B", "C"]);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failure_reports_segment_index() {
        let mut provider = MockProvider::new("ok");
        provider.add_error("bbbb");

        let executor = BatchExecutor::new(Arc::new(provider), 2);
        let result = executor
            .summarize_segments(
                segments(&["aaaa", "bbbb", "cccc"]),
                &GenerationParameters::default(),
            )
            .await;

        match result {
            Err(PipelineError::Inference { index, message }) => {
                assert_eq!(index, 1);
                assert!(message.contains("Mock error"));
            }
            other => panic!("expected inference error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_wait_for_slow_segments() {
        let mut provider = MockProvider::new("ok");
        provider.add_delay("slow", Duration::from_secs(2));
        provider.add_error("bad");

        let executor = BatchExecutor::new(Arc::new(provider), 4);
        let start = Instant::now();
        let result = executor
            .summarize_segments(segments(&["slow", "bad"]), &GenerationParameters::default())
            .await;

        assert!(matches!(result, Err(PipelineError::Inference { index: 1, .. })));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_call_timeout() {
        let mut provider = MockProvider::new("late");
        provider.add_delay("stuck", Duration::from_millis(500));

        let executor =
            BatchExecutor::new(Arc::new(provider), 1).with_call_timeout(Duration::from_millis(50));
        let result = executor
            .summarize_segments(segments(&["stuck"]), &GenerationParameters::default())
            .await;

        match result {
            Err(PipelineError::Inference { index: 0, message }) => {
                assert!(message.contains("timed out"))
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_segments_skip_the_backend() {
        let provider = Arc::new(MockProvider::new("summary"));
        let executor = BatchExecutor::new(Arc::clone(&provider), 2);

        let result = executor
            .summarize_segments(segments(&["text", "   ", "more"]), &GenerationParameters::default())
            .await
            .unwrap();

        assert_eq!(result, vec!["summary", "", "summary"]);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_backend_answer_is_an_error() {
        let mut provider = MockProvider::new("fine");
        provider.add_response("hollow", "  ");

        let executor = BatchExecutor::new(Arc::new(provider), 2);
        let result = executor
            .summarize_segments(segments(&["fine", "hollow"]), &GenerationParameters::default())
            .await;

        assert!(matches!(result, Err(PipelineError::Inference { index: 1, .. })));
    }

    /// Records the highest number of calls observed running at once
    struct ConcurrencyGauge {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl InferenceProvider for ConcurrencyGauge {
        type Error = LlmError;

        fn summarize(&self, segment: &str, _params: &GenerationParameters) -> Result<String, LlmError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(40));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(segment.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let gauge = Arc::new(ConcurrencyGauge {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let executor = BatchExecutor::new(Arc::clone(&gauge), 2);

        let texts: Vec<String> = (0..8).map(|i| format!("segment {}", i)).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let result = executor
            .summarize_segments(segments(&refs), &GenerationParameters::default())
            .await
            .unwrap();

        assert_eq!(result[7], "SEGMENT 7");
        assert!(gauge.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_run_round_recombines_and_wraps() {
        let mut provider = MockProvider::default();
        provider.add_response("0123456789", "first part.");
        provider.add_response("abcdefghij", "second part.");

        let executor = BatchExecutor::new(Arc::new(provider), 2).with_wrap_width(12);
        let preset = Preset {
            name: "test".to_string(),
            chunk_size: 10,
            generation: GenerationParameters::default(),
        };

        let result = executor
            .run_round("0123456789abcdefghij", &preset, 1)
            .await
            .unwrap();

        assert_eq!(result.round, 1);
        assert_eq!(result.segment_count, 2);
        assert_eq!(result.text, "first part.\nsecond part.");
        assert_eq!(result.char_len, 24);
    }

    #[tokio::test]
    async fn test_run_round_rejects_zero_chunk_size() {
        let executor = BatchExecutor::new(Arc::new(MockProvider::default()), 2);
        let preset = Preset {
            chunk_size: 0,
            ..Preset::first_pass()
        };
        let result = executor.run_round("text", &preset, 1).await;
        assert!(matches!(result, Err(PipelineError::Chunking(_))));
    }
}
