//! Request/response types for the generative text service
//!
//! These model the Anthropic Messages API closely enough for a single-turn
//! prompt, which is all the roadmap pipeline ever sends.

use tracing::debug;

/// Smallest reasoning budget the Messages API accepts
pub const MIN_THINKING_BUDGET: u32 = 1024;

/// One request to the service, built fresh for every stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Fully rendered prompt text
    pub prompt: String,

    /// Model identifier
    pub model: String,

    /// Max tokens for the response
    pub max_tokens: u32,

    /// Whether the response should arrive as incremental fragments
    pub stream: bool,

    /// Extended reasoning budget, if the stage wants one
    pub thinking_budget: Option<u32>,
}

impl GenerationRequest {
    /// Create a request without a reasoning budget
    pub fn new(prompt: impl Into<String>, model: impl Into<String>, max_tokens: u32, stream: bool) -> Self {
        let prompt = prompt.into();
        debug!(prompt_len = prompt.len(), %max_tokens, %stream, "GenerationRequest::new: called");
        Self {
            prompt,
            model: model.into(),
            max_tokens,
            stream,
            thinking_budget: None,
        }
    }

    /// Attach a reasoning budget (0 means none)
    pub fn with_thinking(mut self, budget: u32) -> Self {
        debug!(%budget, "GenerationRequest::with_thinking: called");
        self.thinking_budget = if budget == 0 { None } else { Some(budget) };
        self
    }

    /// The reasoning budget that can actually be sent.
    ///
    /// The API rejects budgets below the minimum or at/above `max_tokens`,
    /// so those are dropped rather than turned into a failed call.
    pub fn effective_thinking_budget(&self) -> Option<u32> {
        match self.thinking_budget {
            Some(budget) if (MIN_THINKING_BUDGET..self.max_tokens).contains(&budget) => Some(budget),
            Some(budget) => {
                debug!(%budget, max_tokens = %self.max_tokens, "effective_thinking_budget: out of range, dropping");
                None
            }
            None => None,
        }
    }
}

/// Response from a single-shot completion
#[derive(Debug, Clone)]
pub struct Completion {
    /// Concatenated text blocks
    pub text: String,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage
    pub usage: TokenUsage,
}

/// What a streaming call reports once every fragment has been sent
#[derive(Debug, Clone, Default)]
pub struct StreamSummary {
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StopReason {
    #[default]
    EndTurn,
    MaxTokens,
    StopSequence,
}

impl StopReason {
    /// Parse from Anthropic API stop_reason string
    pub fn from_anthropic(s: &str) -> Self {
        debug!(%s, "StopReason::from_anthropic: called");
        match s {
            "end_turn" => StopReason::EndTurn,
            "max_tokens" => {
                debug!("StopReason::from_anthropic: MaxTokens");
                StopReason::MaxTokens
            }
            "stop_sequence" => StopReason::StopSequence,
            _ => {
                debug!("StopReason::from_anthropic: unknown, defaulting to EndTurn");
                StopReason::EndTurn
            }
        }
    }
}

/// Token usage reported by the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Incremental piece of a streamed response
#[derive(Debug, Clone)]
pub enum StreamChunk {
    /// Message started with input token count
    MessageStart { input_tokens: u64 },

    /// Text fragment, in arrival order
    TextDelta(String),

    /// Message complete with final stats
    MessageDone { stop_reason: StopReason, usage: TokenUsage },

    /// Error during streaming
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_new_has_no_thinking() {
        let req = GenerationRequest::new("hello", "claude-3-7-sonnet-20250219", 16000, true);
        assert_eq!(req.prompt, "hello");
        assert!(req.stream);
        assert_eq!(req.thinking_budget, None);
    }

    #[test]
    fn test_with_thinking_zero_disables() {
        let req = GenerationRequest::new("p", "m", 16000, false).with_thinking(0);
        assert_eq!(req.thinking_budget, None);
    }

    #[test]
    fn test_effective_thinking_budget() {
        let req = GenerationRequest::new("p", "m", 16000, false).with_thinking(10000);
        assert_eq!(req.effective_thinking_budget(), Some(10000));

        // Budget must stay below max_tokens
        let req = GenerationRequest::new("p", "m", 10000, false).with_thinking(10000);
        assert_eq!(req.effective_thinking_budget(), None);

        // And above the API minimum
        let req = GenerationRequest::new("p", "m", 16000, false).with_thinking(512);
        assert_eq!(req.effective_thinking_budget(), None);
    }

    #[test]
    fn test_stop_reason_from_anthropic() {
        assert_eq!(StopReason::from_anthropic("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_anthropic("max_tokens"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_anthropic("stop_sequence"), StopReason::StopSequence);
        assert_eq!(StopReason::from_anthropic("refusal"), StopReason::EndTurn);
    }
}
