//! Fixed-width text chunking
//!
//! Splits text into consecutive segments of exactly `max_chunk_size`
//! characters (the last may be shorter). No attempt is made to respect
//! sentence or word boundaries; the segments concatenate back to the input.

use crate::error::PipelineError;
use condenser_domain::Segment;

/// Splits text into bounded, ordered segments
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    max_chunk_size: usize,
}

impl TextChunker {
    /// Create a new text chunker
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Chunking`] if `max_chunk_size` is 0.
    pub fn new(max_chunk_size: usize) -> Result<Self, PipelineError> {
        if max_chunk_size == 0 {
            return Err(PipelineError::Chunking(
                "max chunk size must be greater than 0".to_string(),
            ));
        }
        Ok(Self { max_chunk_size })
    }

    /// Maximum segment length in characters
    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Chunk the given text
    pub fn chunk(&self, text: &str) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(text.len() / self.max_chunk_size + 1);
        let mut start = 0;
        let mut count = 0;

        for (byte_idx, _) in text.char_indices() {
            if count == self.max_chunk_size {
                segments.push(Segment::new(segments.len(), &text[start..byte_idx]));
                start = byte_idx;
                count = 0;
            }
            count += 1;
        }

        if start < text.len() {
            segments.push(Segment::new(segments.len(), &text[start..]));
        }

        segments
    }
}

/// Split text into segments of at most `max_words` whitespace-separated
/// words, each rejoined with single spaces.
///
/// Used by the final pass, where chat models are limited by tokens rather
/// than characters. `max_words` of 0 is treated as 1.
pub fn split_words(text: &str, max_words: usize) -> Vec<Segment> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(max_words.max(1))
        .enumerate()
        .map(|(index, chunk)| Segment::new(index, chunk.join(" ")))
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: segments concatenate back to the input exactly
        #[test]
        fn test_chunks_reconstruct_input(text in "\\PC{0,400}", max in 1usize..64) {
            let chunker = TextChunker::new(max).unwrap();
            let rebuilt: String = chunker.chunk(&text).into_iter().map(|s| s.text).collect();
            prop_assert_eq!(rebuilt, text);
        }

        /// Property: every segment but the last is exactly `max` characters,
        /// the last is between 1 and `max`
        #[test]
        fn test_chunk_sizes(text in "\\PC{0,400}", max in 1usize..64) {
            let chunker = TextChunker::new(max).unwrap();
            let chunks = chunker.chunk(&text);

            if let Some((last, rest)) = chunks.split_last() {
                for segment in rest {
                    prop_assert_eq!(segment.char_len(), max);
                }
                prop_assert!(last.char_len() >= 1 && last.char_len() <= max);
            } else {
                prop_assert!(text.is_empty());
            }
        }

        /// Property: segment indices are 0..n in order
        #[test]
        fn test_chunk_indices_sequential(text in "\\PC{0,200}", max in 1usize..16) {
            let chunker = TextChunker::new(max).unwrap();
            for (expected, segment) in chunker.chunk(&text).iter().enumerate() {
                prop_assert_eq!(segment.index, expected);
            }
        }
    }
}
