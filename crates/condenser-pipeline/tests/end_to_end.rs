//! End-to-end tests for the summarization pipeline
//!
//! These drive the public API only, with in-process providers standing in
//! for a model server.

use condenser_domain::{GenerationParameters, InferenceProvider, Preset, Segment, StopReason};
use condenser_llm::{LlmError, MockProvider};
use condenser_pipeline::{
    BatchExecutor, ConvergenceController, PipelineConfig, PipelineError, TextChunker,
};
use std::sync::Arc;
use std::time::Duration;

/// Echoes a segment's label, sleeping longer for earlier segments so that
/// completion order is the reverse of input order.
struct ReverseLatencyProvider;

impl InferenceProvider for ReverseLatencyProvider {
    type Error = LlmError;

    fn summarize(&self, segment: &str, _params: &GenerationParameters) -> Result<String, LlmError> {
        let label: usize = segment
            .trim()
            .parse()
            .map_err(|_| LlmError::InvalidResponse(format!("not a label: {}", segment)))?;
        std::thread::sleep(Duration::from_millis(10 * (10 - label as u64)));
        Ok(format!("s{}", label))
    }
}

#[tokio::test]
async fn test_batch_order_independent_of_completion_order() {
    let executor = BatchExecutor::new(Arc::new(ReverseLatencyProvider), 10);
    let segments: Vec<Segment> = (0..10).map(|i| Segment::new(i, i.to_string())).collect();

    let summaries = executor
        .summarize_segments(segments, &GenerationParameters::default())
        .await
        .unwrap();

    let expected: Vec<String> = (0..10).map(|i| format!("s{}", i)).collect();
    assert_eq!(summaries, expected);
}

#[tokio::test]
async fn test_chunker_feeds_executor_in_order() {
    let chunker = TextChunker::new(1).unwrap();
    let segments = chunker.chunk("0123456789");
    assert_eq!(segments.len(), 10);

    let executor = BatchExecutor::new(Arc::new(ReverseLatencyProvider), 3);
    let summaries = executor
        .summarize_segments(segments, &GenerationParameters::default())
        .await
        .unwrap();

    assert_eq!(summaries.join(" "), "s0 s1 s2 s3 s4 s5 s6 s7 s8 s9");
}

#[tokio::test]
async fn test_twelve_thousand_char_document() {
    let document = "alpha beta gamma delta ".repeat(522);
    let document: String = document.chars().take(12_000).collect();
    let provider = Arc::new(MockProvider::truncating());
    let controller =
        ConvergenceController::new(Arc::clone(&provider), PipelineConfig::default()).unwrap();

    let outcome = controller.summarize(&document).await.unwrap();

    assert_eq!(outcome.original_char_len, 12_000);
    assert_eq!(outcome.stop_reason, StopReason::RatioReached);
    assert_eq!(outcome.rounds, 2);
    assert!(outcome.char_len() <= 2_400);
}

#[tokio::test]
async fn test_error_reports_round_and_segment() {
    let mut provider = MockProvider::new("fine");
    provider.add_error("bad!");

    let mut config = PipelineConfig::default();
    config.first_pass = Preset {
        chunk_size: 4,
        ..Preset::first_pass()
    };
    config.refinement = Preset {
        chunk_size: 2,
        ..Preset::refinement()
    };
    let controller = ConvergenceController::new(Arc::new(provider), config).unwrap();

    let err = controller.summarize("goodgoodbad!good").await.unwrap_err();

    assert_eq!(err.round(), Some(1));
    assert_eq!(err.segment_index(), Some(2));
    assert!(err.to_string().contains("Round 1 failed"));
    assert!(matches!(err, PipelineError::Round { .. }));
}

#[tokio::test]
async fn test_termination_on_stubborn_backend() {
    let provider = Arc::new(MockProvider::new("This answer never gets any shorter at all. ".repeat(20)));
    let mut config = PipelineConfig::default();
    config.hard_floor_chars = 100;
    config.max_refinement_rounds = 2;
    let controller = ConvergenceController::new(Arc::clone(&provider), config).unwrap();

    let outcome = controller.summarize(&"q".repeat(2_000)).await.unwrap();

    assert_eq!(outcome.rounds, 3);
    assert_eq!(outcome.stop_reason, StopReason::RoundCapReached);
}
