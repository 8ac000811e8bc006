//! Generative text service boundary
//!
//! Provides the client trait, the Anthropic implementation, and `generate`,
//! which hides the single-shot vs. streamed response shapes from the stages.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

mod anthropic;
pub mod client;
mod error;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use types::{
    Completion, GenerationRequest, MIN_THINKING_BUDGET, StopReason, StreamChunk, StreamSummary, TokenUsage,
};

use crate::config::LlmConfig;

/// Capacity of the fragment channel used while streaming
const STREAM_CHANNEL_CAPACITY: usize = 256;

/// Create an LLM client based on the provider specified in config
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "anthropic" => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::InvalidResponse(format!(
                "Unknown LLM provider: '{}'. Supported: anthropic",
                other
            )))
        }
    }
}

/// Run one request to completion and return the full text
///
/// Streamed responses are drained concurrently with the call and joined in
/// arrival order, so callers never observe a partial response.
pub async fn generate(llm: &dyn LlmClient, request: &GenerationRequest) -> Result<String, LlmError> {
    debug!(stream = %request.stream, max_tokens = %request.max_tokens, "generate: called");
    let (text, stop_reason) = if request.stream {
        let (chunk_tx, chunk_rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let (summary, text) = tokio::join!(llm.stream(request, chunk_tx), assemble(chunk_rx));
        (text, summary?.stop_reason)
    } else {
        let completion = llm.complete(request).await?;
        (completion.text, completion.stop_reason)
    };

    if stop_reason == StopReason::MaxTokens {
        warn!(max_tokens = %request.max_tokens, "generate: response truncated at max_tokens");
    }

    if text.trim().is_empty() {
        debug!("generate: empty response");
        return Err(LlmError::EmptyResponse);
    }

    debug!(text_len = text.len(), "generate: complete");
    Ok(text)
}

/// Concatenate text fragments until the sender side closes
async fn assemble(mut chunk_rx: mpsc::Receiver<StreamChunk>) -> String {
    let mut text = String::new();
    let mut fragments = 0usize;
    while let Some(chunk) = chunk_rx.recv().await {
        match chunk {
            StreamChunk::TextDelta(fragment) => {
                fragments += 1;
                text.push_str(&fragment);
            }
            StreamChunk::MessageStart { input_tokens } => {
                debug!(%input_tokens, "assemble: message started");
            }
            StreamChunk::MessageDone { stop_reason, usage } => {
                debug!(?stop_reason, output_tokens = %usage.output_tokens, "assemble: message done");
            }
            StreamChunk::Error(e) => {
                debug!(error = %e, "assemble: stream reported error");
            }
        }
    }
    debug!(%fragments, text_len = text.len(), "assemble: channel closed");
    text
}
