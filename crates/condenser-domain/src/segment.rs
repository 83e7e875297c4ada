//! Segments: ordered, bounded slices of a document.
//!
//! A segment carries its position in the pass that produced it. The index is
//! what lets parallel summarization write results back in input order no
//! matter which call finishes first.

use serde::{Deserialize, Serialize};

/// Number of characters (Unicode scalar values) in `text`.
///
/// All lengths in Condenser are measured this way, never in bytes.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// A contiguous slice of the text being summarized in the current round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Zero-based position within its splitting pass
    pub index: usize,

    /// The segment text
    pub text: String,
}

impl Segment {
    /// Create a new segment
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Length of the segment in characters
    pub fn char_len(&self) -> usize {
        char_len(&self.text)
    }

    /// True if the segment holds no text
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_len_counts_scalars_not_bytes() {
        assert_eq!(char_len("abc"), 3);
        assert_eq!(char_len("héllo"), 5);
        assert_eq!("héllo".len(), 6);
        assert_eq!(char_len(""), 0);
    }

    #[test]
    fn test_segment_accessors() {
        let segment = Segment::new(3, "naïve");
        assert_eq!(segment.index, 3);
        assert_eq!(segment.char_len(), 5);
        assert!(!segment.is_empty());
        assert!(Segment::new(0, "").is_empty());
    }
}
