//! Model gateway for the museum guide.
//!
//! Wraps two logical model handles behind traits: a vision-capable one-shot
//! completion endpoint ([`ModelGateway`]) and a stateful multi-turn chat
//! handle ([`ChatSession`]). [`GeminiGateway`] talks to the Gemini REST API;
//! [`ScriptedGateway`] replays canned results for tests.

pub mod error;
pub mod gemini;
pub mod scripted;
pub mod sse;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use guide_core::UploadedArtifact;

pub use error::GatewayError;
pub use gemini::{GeminiConfig, GeminiGateway};
pub use scripted::{ScriptedChat, ScriptedGateway};

/// Lazy, finite, non-restartable sequence of reply fragments.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, GatewayError>> + Send>>;

/// One-shot completions plus a factory for chat handles.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Describe an artifact image, answering the attached question if any.
    async fn generate_insight(&self, artifact: &UploadedArtifact) -> Result<String, GatewayError>;

    /// Stateless single-turn completion with the fixed fact prompt.
    async fn generate_fact(&self) -> Result<String, GatewayError>;

    /// Open a fresh chat handle with an empty turn history.
    fn start_chat(&self) -> Box<dyn ChatSession>;
}

/// Opaque handle to a multi-turn dialogue.
///
/// The turn history is only ever changed by sending a new turn.
#[async_trait]
pub trait ChatSession: Send {
    /// Record `message` as the next user turn and stream the reply.
    ///
    /// The reply must be consumed to the end to obtain the full text. The
    /// user turn is recorded once this returns `Ok`, however much of the
    /// stream is read afterwards.
    async fn send_turn(&mut self, message: &str) -> Result<ChunkStream, GatewayError>;

    /// Number of committed turns (user and model) in the history.
    fn history_len(&self) -> usize;
}
