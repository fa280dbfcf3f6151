//! Gemini REST implementation of the model gateway.
//!
//! - insight / fact: `POST {base}/models/{model}:generateContent`
//! - chat turn: `POST {base}/models/{model}:streamGenerateContent?alt=sse`
//!
//! The chat handle keeps the alternating user/model history client-side and
//! resends it with every turn.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use guide_core::config::{FactsConfig, ModelConfig};
use guide_core::UploadedArtifact;

use crate::error::GatewayError;
use crate::sse::SseDecoder;
use crate::{ChatSession, ChunkStream, ModelGateway};

// =============================================================================
// Configuration
// =============================================================================

/// Connection and prompt settings for the Gemini gateway.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub request_timeout: Duration,
    pub guide_persona: Option<String>,
    pub fact_prompt: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>, model: &ModelConfig, facts: &FactsConfig) -> Self {
        let persona = model.guide_persona.trim();
        Self {
            api_key: api_key.into(),
            model: model.name.clone(),
            api_base: model.api_base.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(model.request_timeout_secs),
            guide_persona: (!persona.is_empty()).then(|| persona.to_string()),
            fact_prompt: facts.prompt.clone(),
        }
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.api_base, self.model, method)
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }

    fn model(text: String) -> Self {
        Self {
            role: Some("model".to_string()),
            parts: vec![Part::Text { text }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: Blob },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }

    /// Explain why a complete response carried no text.
    fn missing_text_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return format!("response was blocked ({})", reason);
        }
        match self
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            Some(reason) => format!("response contained no text (finish reason: {})", reason),
            None => "response contained no text".to_string(),
        }
    }
}

/// Map a non-success HTTP response to a gateway error.
fn map_http_error(status: reqwest::StatusCode, body: &str) -> GatewayError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    let exhausted = parsed
        .as_ref()
        .is_some_and(|e| e.error.status == "RESOURCE_EXHAUSTED");

    if status.as_u16() == 429 || exhausted {
        GatewayError::QuotaExceeded(message)
    } else {
        GatewayError::Service(format!("HTTP {}: {}", status.as_u16(), message))
    }
}

/// Interpret one streamed payload: reply text, nothing, or an in-band error.
fn parse_stream_payload(data: &str) -> Result<Option<String>, GatewayError> {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(data) {
        return Err(if envelope.error.status == "RESOURCE_EXHAUSTED" {
            GatewayError::QuotaExceeded(envelope.error.message)
        } else {
            GatewayError::Service(envelope.error.message)
        });
    }
    let chunk: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|e| GatewayError::Service(format!("malformed stream chunk: {}", e)))?;
    if let Some(reason) = chunk
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(GatewayError::Service(format!(
            "response was blocked ({})",
            reason
        )));
    }
    Ok(chunk.text())
}

// =============================================================================
// Gateway
// =============================================================================

/// Gateway backed by the Gemini generative language API.
#[derive(Clone)]
pub struct GeminiGateway {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiGateway {
    pub fn new(config: GeminiConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Service(format!("failed to build HTTP client: {}", e)))?;
        tracing::info!(model = %config.model, "Gemini gateway ready");
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn generate(&self, contents: Vec<Content>) -> Result<String, GatewayError> {
        let request = GenerateContentRequest {
            contents,
            system_instruction: None,
        };
        let response = self
            .client
            .post(self.config.endpoint("generateContent"))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }

        let completion: GenerateContentResponse = response.json().await?;
        completion
            .text()
            .ok_or_else(|| GatewayError::Service(completion.missing_text_reason()))
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    async fn generate_insight(&self, artifact: &UploadedArtifact) -> Result<String, GatewayError> {
        let mut parts = Vec::with_capacity(2);
        if let Some(question) = &artifact.question {
            parts.push(Part::Text {
                text: question.clone(),
            });
        }
        parts.push(Part::InlineData {
            inline_data: Blob {
                mime_type: artifact.format.mime_type().to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(&artifact.image),
            },
        });

        tracing::debug!(
            image_bytes = artifact.image.len(),
            has_question = artifact.question.is_some(),
            "Requesting artifact insight"
        );
        self.generate(vec![Content::user(parts)]).await
    }

    async fn generate_fact(&self) -> Result<String, GatewayError> {
        let parts = vec![Part::Text {
            text: self.config.fact_prompt.clone(),
        }];
        self.generate(vec![Content::user(parts)]).await
    }

    fn start_chat(&self) -> Box<dyn ChatSession> {
        Box::new(GeminiChat {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            history: Arc::new(Mutex::new(Vec::new())),
        })
    }
}

// =============================================================================
// Chat handle
// =============================================================================

/// Stateful chat handle; history is shared with in-flight reply streams.
pub struct GeminiChat {
    client: Client,
    config: Arc<GeminiConfig>,
    history: Arc<Mutex<Vec<Content>>>,
}

#[async_trait]
impl ChatSession for GeminiChat {
    async fn send_turn(&mut self, message: &str) -> Result<ChunkStream, GatewayError> {
        let user_turn = Content::user(vec![Part::Text {
            text: message.to_string(),
        }]);

        let mut contents = self
            .history
            .lock()
            .map_err(|e| GatewayError::Service(format!("chat history lock poisoned: {}", e)))?
            .clone();
        contents.push(user_turn.clone());

        let request = GenerateContentRequest {
            contents,
            system_instruction: self.config.guide_persona.as_ref().map(|p| Content {
                role: None,
                parts: vec![Part::Text { text: p.clone() }],
            }),
        };

        let response = self
            .client
            .post(self.config.endpoint("streamGenerateContent"))
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }

        self.history
            .lock()
            .map_err(|e| GatewayError::Service(format!("chat history lock poisoned: {}", e)))?
            .push(user_turn);

        let recorder = ReplyRecorder {
            history: Arc::clone(&self.history),
            reply: String::new(),
        };
        Ok(Box::pin(reply_stream(
            Box::pin(response.bytes_stream()),
            recorder,
        )))
    }

    fn history_len(&self) -> usize {
        self.history.lock().map(|h| h.len()).unwrap_or(0)
    }
}

/// Commits the model turn when the reply stream ends or is dropped.
///
/// Only the text received so far is recorded. A reply that produced no text
/// leaves the user turn standing on its own.
struct ReplyRecorder {
    history: Arc<Mutex<Vec<Content>>>,
    reply: String,
}

impl Drop for ReplyRecorder {
    fn drop(&mut self) {
        if self.reply.is_empty() {
            return;
        }
        if let Ok(mut history) = self.history.lock() {
            history.push(Content::model(std::mem::take(&mut self.reply)));
        }
    }
}

struct StreamState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: std::collections::VecDeque<String>,
    recorder: ReplyRecorder,
    done: bool,
}

/// Decode SSE bytes into reply fragments, recording them as they pass.
fn reply_stream<S>(
    bytes: S,
    recorder: ReplyRecorder,
) -> impl Stream<Item = Result<String, GatewayError>> + Send
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    let state = StreamState {
        bytes,
        decoder: SseDecoder::new(),
        pending: std::collections::VecDeque::new(),
        recorder,
        done: false,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(data) = state.pending.pop_front() {
                match parse_stream_payload(&data) {
                    Ok(Some(text)) => {
                        state.recorder.reply.push_str(&text);
                        return Some((Ok(text), state));
                    }
                    Ok(None) => continue,
                    Err(e) => {
                        state.done = true;
                        state.pending.clear();
                        return Some((Err(e), state));
                    }
                }
            }

            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    state.pending.extend(events);
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((
                        Err(GatewayError::Service(format!("stream read error: {}", e))),
                        state,
                    ));
                }
                None => {
                    state.done = true;
                    if let Some(tail) = state.decoder.finish() {
                        state.pending.push_back(tail);
                    }
                }
            }
        }
    })
}

// =============================================================================
// Tests
// =============================================================================
