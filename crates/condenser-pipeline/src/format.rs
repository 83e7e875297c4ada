//! Text recombination and final output formatting

use condenser_domain::char_len;

/// Join per-segment summaries with a space and re-flow them to `width`.
pub fn recombine(summaries: &[String], width: usize) -> String {
    wrap_text(&summaries.join(" "), width)
}

/// Re-flow text into lines of at most `width` characters.
///
/// Whitespace (including existing line breaks) collapses to single spaces
/// between words. Lines are filled greedily. A word is split only when it is
/// longer than `width` on its own, in which case it starts on a fresh line
/// and is hard-broken into `width`-sized pieces.
pub fn wrap_text(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = char_len(word);

        if word_len > width {
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(width).map(|piece| piece.iter().collect::<String>());
            let mut last = pieces.next().unwrap_or_default();
            for piece in pieces {
                lines.push(std::mem::replace(&mut last, piece));
            }
            line_len = char_len(&last);
            line = last;
            continue;
        }

        if line_len == 0 {
            line.push_str(word);
            line_len = word_len;
        } else if line_len + 1 + word_len <= width {
            line.push(' ');
            line.push_str(word);
            line_len += 1 + word_len;
        } else {
            lines.push(std::mem::replace(&mut line, word.to_string()));
            line_len = word_len;
        }
    }

    if line_len > 0 {
        lines.push(line);
    }

    lines.join("\n")
}

/// Remove every occurrence of the given markers, repeating until none remain
/// (removing one marker can bring the halves of another together).
pub fn strip_markers<S: AsRef<str>>(text: &str, markers: &[S]) -> String {
    let mut result = text.to_string();
    loop {
        let mut changed = false;
        for marker in markers.iter().map(AsRef::as_ref).filter(|m| !m.is_empty()) {
            if result.contains(marker) {
                result = result.replace(marker, "");
                changed = true;
            }
        }
        if !changed {
            return result;
        }
    }
}

/// Remove every occurrence of the given phrases, then trim.
///
/// Chat models often open with a stock preamble such as
/// "Here are the key events summarized:".
pub fn strip_preambles<S: AsRef<str>>(text: &str, phrases: &[S]) -> String {
    phrases
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.is_empty())
        .fold(text.to_string(), |acc, phrase| acc.replace(phrase, ""))
        .trim()
        .to_string()
}

/// Final post-processing applied once to the converged summary:
/// strip end-of-sequence markers, break the line after every ". ", trim.
///
/// Applying it twice yields the same text as applying it once.
pub fn finalize<S: AsRef<str>>(text: &str, markers: &[S]) -> String {
    strip_markers(text, markers)
        .replace(". ", ".\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EOS_MARKERS;

    #[test]
    fn test_wrap_respects_width() {
        let wrapped = wrap_text("the quick brown fox jumps over the lazy dog", 10);
        assert_eq!(wrapped, "the quick\nbrown fox\njumps over\nthe lazy\ndog");
    }

    #[test]
    fn test_wrap_collapses_whitespace() {
        assert_eq!(wrap_text("  a \n\n b\tc  ", 80), "a b c");
        assert_eq!(wrap_text("", 80), "");
        assert_eq!(wrap_text("   ", 80), "");
    }

    #[test]
    fn test_wrap_breaks_only_overlong_words() {
        let wrapped = wrap_text("ab abcdefghij cd", 4);
        assert_eq!(wrapped, "ab\nabcd\nefgh\nij\ncd");
    }

    #[test]
    fn test_recombine_joins_in_order() {
        let summaries = vec!["first.".to_string(), "second.".to_string(), "third.".to_string()];
        assert_eq!(recombine(&summaries, 80), "first. second. third.");
        assert_eq!(recombine(&[], 80), "");
    }

    #[test]
    fn test_strip_markers_nested() {
        let text = "done<|eot<|eot_id|>_id|>";
        assert_eq!(strip_markers(text, DEFAULT_EOS_MARKERS), "done");
    }

    #[test]
    fn test_strip_preambles() {
        let phrases = ["Here are the key events summarized:"];
        assert_eq!(
            strip_preambles("Here are the key events summarized:\n\nThe vote passed.", &phrases),
            "The vote passed."
        );
        assert_eq!(strip_preambles("  Nothing to strip. ", &phrases), "Nothing to strip.");
        assert_eq!(strip_preambles("Keep me.", &[] as &[&str]), "Keep me.");
    }

    #[test]
    fn test_finalize() {
        let text = "  The meeting ended. Votes were cast.<|eot_id|> Results follow. ";
        assert_eq!(
            finalize(text, DEFAULT_EOS_MARKERS),
            "The meeting ended.\nVotes were cast.\nResults follow."
        );
    }

    #[test]
    fn test_finalize_is_idempotent_on_example() {
        let once = finalize("A. B.</s> C. ", DEFAULT_EOS_MARKERS);
        assert_eq!(finalize(&once, DEFAULT_EOS_MARKERS), once);
    }
}
