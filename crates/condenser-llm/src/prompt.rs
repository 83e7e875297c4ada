//! Prompt construction for chat-style summarization backends
//!
//! Seq2seq summarizers take length bounds directly; instruction-tuned chat
//! models need them spelled out. Beam count and length penalty are search
//! controls these backends cannot express, so only the length bounds make it
//! into the prompt.

use condenser_domain::GenerationParameters;

/// System message sent ahead of every summarization request
pub const SYSTEM_PROMPT: &str = "You condense documents. You write faithful, \
compact summaries that keep the key events and facts and never quote the source \
verbatim.";

/// Builds the user message for one segment
pub struct SummaryPrompt<'a> {
    text: &'a str,
    params: &'a GenerationParameters,
}

impl<'a> SummaryPrompt<'a> {
    /// Create a prompt for `text` bounded by `params`
    pub fn new(text: &'a str, params: &'a GenerationParameters) -> Self {
        Self { text, params }
    }

    /// Render the prompt
    pub fn build(&self) -> String {
        format!(
            "Summarize the following text in {} to {} words. \
Keep only the key events and facts, do not include direct quotes, \
and reply with the summary alone.\n\nText:\n{}",
            self.params.min_length, self.params.max_length, self.text
        )
    }
}
