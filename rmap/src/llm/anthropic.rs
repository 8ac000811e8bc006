//! Anthropic Claude API client implementation
//!
//! Implements the LlmClient trait for Anthropic's Messages API with
//! support for both blocking and streaming responses.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use super::{Completion, GenerationRequest, LlmClient, LlmError, StopReason, StreamChunk, StreamSummary, TokenUsage};
use crate::config::LlmConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Fallback wait when a 429 carries no retry-after header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Anthropic Claude API client
pub struct AnthropicClient {
    api_key: String,
    base_url: String,
    http: Client,
    timeout: Option<Duration>,
}

impl AnthropicClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the key file or environment variable named in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(base_url = %config.base_url, timeout_ms = ?config.timeout_ms, "from_config: called");
        let api_key = config.get_api_key()?;

        let timeout = config.timeout_ms.map(Duration::from_millis);
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            debug!(?timeout, "from_config: applying request timeout");
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(LlmError::Network)?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    /// Build the request body for the Anthropic API
    fn build_request_body(&self, request: &GenerationRequest) -> serde_json::Value {
        debug!(model = %request.model, %request.max_tokens, "build_request_body: called");
        let mut body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "messages": [
                { "role": "user", "content": request.prompt }
            ],
        });

        if let Some(budget) = request.effective_thinking_budget() {
            debug!(%budget, "build_request_body: enabling extended thinking");
            body["thinking"] = serde_json::json!({
                "type": "enabled",
                "budget_tokens": budget,
            });
        } else if request.thinking_budget.is_some() {
            tracing::warn!(
                budget = ?request.thinking_budget,
                max_tokens = %request.max_tokens,
                "build_request_body: thinking budget out of range, sending without it"
            );
        }

        if request.stream {
            body["stream"] = serde_json::json!(true);
        }

        body
    }

    fn post(&self, body: &serde_json::Value) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.clone())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        match self.timeout {
            Some(timeout) if e.is_timeout() => LlmError::Timeout(timeout),
            _ => LlmError::Network(e),
        }
    }

    /// Parse the Anthropic API response
    fn parse_response(&self, api_response: AnthropicResponse) -> Completion {
        debug!(?api_response.stop_reason, "parse_response: called");
        let text = api_response
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => {
                    debug!("parse_response: skipping non-text block");
                    None
                }
            })
            .collect::<String>();

        Completion {
            text,
            stop_reason: StopReason::from_anthropic(api_response.stop_reason.as_deref().unwrap_or("end_turn")),
            usage: TokenUsage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<Completion, LlmError> {
        debug!(model = %request.model, %request.max_tokens, "complete: called");
        let mut body = self.build_request_body(request);
        body["stream"] = serde_json::json!(false);

        let response = self.post(&body).send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status().as_u16();

        if status == 429 {
            debug!("complete: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !response.status().is_success() {
            debug!(%status, "complete: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        debug!("complete: success");
        let api_response: AnthropicResponse = response.json().await?;
        Ok(self.parse_response(api_response))
    }

    async fn stream(
        &self,
        request: &GenerationRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<StreamSummary, LlmError> {
        debug!(model = %request.model, %request.max_tokens, "stream: called");
        let mut body = self.build_request_body(request);
        body["stream"] = serde_json::json!(true);

        let mut es = EventSource::new(self.post(&body)).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let mut summary = StreamSummary::default();

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!("stream: Event::Open");
                }
                Ok(Event::Message(msg)) => {
                    let data: serde_json::Value = serde_json::from_str(&msg.data).map_err(LlmError::Json)?;

                    match data["type"].as_str() {
                        Some("message_start") => {
                            debug!("stream: message_start");
                            if let Some(u) = data["message"].get("usage") {
                                summary.usage.input_tokens = u["input_tokens"].as_u64().unwrap_or(0);
                                let _ = chunk_tx
                                    .send(StreamChunk::MessageStart {
                                        input_tokens: summary.usage.input_tokens,
                                    })
                                    .await;
                            }
                        }
                        Some("content_block_delta") => {
                            // Only text deltas form the document; thinking deltas are dropped
                            if data["delta"]["type"] == "text_delta"
                                && let Some(text) = data["delta"]["text"].as_str()
                            {
                                let _ = chunk_tx.send(StreamChunk::TextDelta(text.to_string())).await;
                            }
                        }
                        Some("message_delta") => {
                            debug!("stream: message_delta");
                            if let Some(sr) = data["delta"]["stop_reason"].as_str() {
                                summary.stop_reason = StopReason::from_anthropic(sr);
                            }
                            if let Some(u) = data.get("usage") {
                                summary.usage.output_tokens = u["output_tokens"].as_u64().unwrap_or(0);
                            }
                        }
                        Some("message_stop") => {
                            debug!("stream: message_stop");
                            break;
                        }
                        Some("error") => {
                            let message = data["error"]["message"].as_str().unwrap_or("unknown error").to_string();
                            debug!(%message, "stream: error event");
                            let _ = chunk_tx.send(StreamChunk::Error(message.clone())).await;
                            es.close();
                            return Err(LlmError::InvalidResponse(message));
                        }
                        _ => {
                            debug!(event_type = ?data["type"].as_str(), "stream: ignoring event");
                        }
                    }
                }
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                    let status = status.as_u16();
                    debug!(%status, "stream: HTTP error status");
                    es.close();
                    if status == 429 {
                        return Err(LlmError::RateLimited {
                            retry_after: Duration::from_secs(DEFAULT_RETRY_AFTER_SECS),
                        });
                    }
                    let message = response.text().await.unwrap_or_default();
                    return Err(LlmError::ApiError { status, message });
                }
                Err(reqwest_eventsource::Error::Transport(e)) => {
                    debug!(error = %e, "stream: transport error");
                    es.close();
                    return Err(self.map_send_error(e));
                }
                Err(e) => {
                    debug!(%e, "stream: Event error");
                    es.close();
                    let _ = chunk_tx.send(StreamChunk::Error(e.to_string())).await;
                    return Err(LlmError::InvalidResponse(e.to_string()));
                }
            }
        }

        es.close();
        debug!(stop_reason = ?summary.stop_reason, "stream: complete");
        let _ = chunk_tx
            .send(StreamChunk::MessageDone {
                stop_reason: summary.stop_reason.clone(),
                usage: summary.usage,
            })
            .await;

        Ok(summary)
    }
}

// Anthropic API response types

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}
