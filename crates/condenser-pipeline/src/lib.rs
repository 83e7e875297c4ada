//! Condenser Pipeline
//!
//! Iterative, parallel, convergence-bounded summarization of long documents.
//!
//! # Overview
//!
//! A document is cut into fixed-size segments, every segment is summarized
//! concurrently through an [`InferenceProvider`], and the summaries are joined
//! back together in their original order. The joined text becomes the input
//! of the next round until it is short enough.
//!
//! # Architecture
//!
//! ```text
//! Document → TextChunker → BatchExecutor → recombine → ConvergenceController
//!                ↑                                            │
//!                └──────────────── next round ────────────────┘
//! ```
//!
//! # Key Features
//!
//! - **Fixed-width chunking**: segments of exactly `chunk_size` characters
//! - **Bounded parallelism**: at most `max_concurrency` calls in flight
//! - **Order preservation**: results are collected by segment index
//! - **Fail-fast batches**: one failed call fails the round, never a partial join
//! - **Guaranteed termination**: ratio test, hard floor and round cap
//!
//! # Example Usage
//!
//! ```
//! use condenser_llm::MockProvider;
//! use condenser_pipeline::{ConvergenceController, PipelineConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(MockProvider::truncating());
//! let controller = ConvergenceController::new(provider, PipelineConfig::default())?;
//!
//! let outcome = controller.summarize(&"Some long text. ".repeat(1_000)).await?;
//!
//! println!("{} rounds, stopped on {}", outcome.rounds, outcome.stop_reason);
//! println!("{}", outcome.text);
//! # Ok(())
//! # }
//! ```
//!
//! [`InferenceProvider`]: condenser_domain::InferenceProvider

#![warn(missing_docs)]

pub mod chunking;
pub mod config;
pub mod controller;
pub mod error;
pub mod executor;
pub mod format;


pub use chunking::{split_words, TextChunker};
pub use config::{FinalPassConfig, PipelineConfig, DEFAULT_EOS_MARKERS, DEFAULT_PREAMBLE};
pub use controller::{next_state, ControllerState, ConvergenceController};
pub use error::PipelineError;
pub use executor::BatchExecutor;
pub use format::{finalize, recombine, strip_preambles, wrap_text};
