//! LlmClient trait definition

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Completion, GenerationRequest, LlmError, StreamChunk, StreamSummary};

/// Stateless client for the generative text service
///
/// One long-lived instance is shared by every stage of a run. Each call is
/// independent; no conversation state is kept between calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a request and wait for the whole response
    async fn complete(&self, request: &GenerationRequest) -> Result<Completion, LlmError>;

    /// Send a request and forward text fragments as they arrive
    ///
    /// Fragments go to `chunk_tx` in arrival order. The returned summary
    /// carries only the stop reason and usage; callers assemble the text.
    async fn stream(
        &self,
        request: &GenerationRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<StreamSummary, LlmError>;
}
