//! Interaction controller: per-feature orchestration.
//!
//! Each operation validates its input, calls the model gateway, renders
//! progress and results through a [`DisplaySink`], and appends to the tour
//! log only after the whole response is known. Failures are rendered and
//! returned as [`InteractionOutcome::Failed`]; they never reach the caller
//! as errors and never touch the log.

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::StreamExt;

use guide_core::{GuideConfig, Speaker, UploadedArtifact};
use guide_gateway::ModelGateway;
use guide_speech::{Recording, SpeechToText};

use crate::display::{DisplayItem, DisplaySink};
use crate::error::InteractionError;
use crate::facts::{FactDeduplicator, FactOutcome};
use crate::log::TourView;
use crate::session::GuideSession;

pub const INSIGHT_BANNER: &str = "Here's what Gemini says:";
pub const FACT_BANNER: &str = "Did You Know?";

/// How an interaction ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// Completed; this many entries were appended to the log.
    Logged(usize),
    /// Fun fact loop ran out of attempts without a fresh fact.
    NothingNew,
    /// Failed and was reported to the visitor.
    Failed(InteractionError),
}

impl InteractionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, InteractionOutcome::Failed(_))
    }
}

/// Drives the four feature areas against a session.
pub struct InteractionController {
    gateway: Arc<dyn ModelGateway>,
    speech: Arc<dyn SpeechToText>,
    facts: FactDeduplicator,
    audio_path: PathBuf,
}

impl InteractionController {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        speech: Arc<dyn SpeechToText>,
        config: &GuideConfig,
    ) -> Self {
        Self {
            gateway,
            speech,
            facts: FactDeduplicator::new(config.facts.max_attempts),
            audio_path: PathBuf::from(&config.voice.audio_path),
        }
    }

    pub fn gateway(&self) -> &dyn ModelGateway {
        self.gateway.as_ref()
    }

    /// Open a new session against this controller's gateway.
    pub fn start_session(&self) -> GuideSession {
        GuideSession::start(self.gateway.as_ref())
    }

    pub fn reset_session(&self, session: &mut GuideSession) {
        session.reset(self.gateway.as_ref());
    }

    // =========================================================================
    // Artifact analysis
    // =========================================================================

    pub async fn analyze_artifact(
        &self,
        session: &mut GuideSession,
        artifact: Option<UploadedArtifact>,
        display: &mut dyn DisplaySink,
    ) -> InteractionOutcome {
        let result = self.try_analyze(session, artifact, display).await;
        conclude("artifact_analysis", result, display)
    }

    async fn try_analyze(
        &self,
        session: &mut GuideSession,
        artifact: Option<UploadedArtifact>,
        display: &mut dyn DisplaySink,
    ) -> Result<InteractionOutcome, InteractionError> {
        let artifact = artifact.ok_or(InteractionError::MissingImage)?;
        display.render(DisplayItem::Progress("Gemini is analyzing...".into()));

        let insight = self.gateway.generate_insight(&artifact).await?;

        display.render(DisplayItem::Success(INSIGHT_BANNER.into()));
        display.render(DisplayItem::Text(insight.clone()));
        session.log.append(Speaker::ArtifactInsight, insight);
        Ok(InteractionOutcome::Logged(1))
    }

    // =========================================================================
    // Chat
    // =========================================================================

    /// Send a typed question to the guide.
    pub async fn ask_guide(
        &self,
        session: &mut GuideSession,
        message: &str,
        display: &mut dyn DisplaySink,
    ) -> InteractionOutcome {
        let result = self.chat_turn(session, Speaker::User, message, display).await;
        conclude("chat", result, display)
    }

    /// Transcribe a captured utterance, then send it to the guide.
    pub async fn ask_guide_by_voice(
        &self,
        session: &mut GuideSession,
        wav: &[u8],
        display: &mut dyn DisplaySink,
    ) -> InteractionOutcome {
        let result = self.try_voice(session, wav, display).await;
        conclude("voice", result, display)
    }

    async fn try_voice(
        &self,
        session: &mut GuideSession,
        wav: &[u8],
        display: &mut dyn DisplaySink,
    ) -> Result<InteractionOutcome, InteractionError> {
        display.render(DisplayItem::Progress("Recognizing your speech...".into()));

        let path = self.audio_path.clone();
        let bytes = wav.to_vec();
        let recording = tokio::task::spawn_blocking(move || Recording::store_and_decode(&path, &bytes))
            .await
            .map_err(|e| InteractionError::Service(format!("audio task failed: {}", e)))??;

        let transcript = self
            .speech
            .transcribe(&recording.samples, recording.sample_rate)
            .await?;
        display.render(DisplayItem::Text(format!("You said: {}", transcript.text)));

        self.chat_turn(session, Speaker::UserVoice, &transcript.text, display)
            .await
    }

    async fn chat_turn(
        &self,
        session: &mut GuideSession,
        speaker: Speaker,
        message: &str,
        display: &mut dyn DisplaySink,
    ) -> Result<InteractionOutcome, InteractionError> {
        if message.trim().is_empty() {
            return Err(InteractionError::EmptyMessage);
        }
        display.render(DisplayItem::Progress("Thinking...".into()));

        let mut stream = session.chat.send_turn(message).await?;
        let mut reply = String::new();
        let mut chunks = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            display.render(DisplayItem::Chunk(chunk.clone()));
            reply.push_str(&chunk);
            reply.push(' ');
            chunks += 1;
        }
        drop(stream);

        tracing::debug!(chunks, reply_len = reply.len(), "Chat reply complete");
        session.log.append_chat_turn(speaker, message, reply);
        Ok(InteractionOutcome::Logged(2))
    }

    // =========================================================================
    // Fun facts
    // =========================================================================

    pub async fn generate_fun_fact(
        &self,
        session: &mut GuideSession,
        display: &mut dyn DisplaySink,
    ) -> InteractionOutcome {
        let result = self.try_fact(session, display).await;
        conclude("fun_fact", result, display)
    }

    async fn try_fact(
        &self,
        session: &mut GuideSession,
        display: &mut dyn DisplaySink,
    ) -> Result<InteractionOutcome, InteractionError> {
        display.render(DisplayItem::Progress("Generating fact...".into()));

        match self
            .facts
            .next_fact(self.gateway.as_ref(), &mut session.facts)
            .await?
        {
            FactOutcome::Accepted { fact, .. } => {
                display.render(DisplayItem::Success(FACT_BANNER.into()));
                display.render(DisplayItem::Text(fact.clone()));
                session.log.append(Speaker::FunFact, fact);
                Ok(InteractionOutcome::Logged(1))
            }
            // Nothing is shown when every attempt was a repeat.
            FactOutcome::Exhausted { .. } => Ok(InteractionOutcome::NothingNew),
        }
    }

    // =========================================================================
    // Tour log
    // =========================================================================

    /// Render the log; never mutates the session.
    pub fn show_tour_log(&self, session: &GuideSession, display: &mut dyn DisplaySink) -> TourView {
        let view = session.log.tour_view();
        match &view {
            TourView::Empty { placeholder } => display.render(DisplayItem::Info(placeholder.clone())),
            TourView::Lines { lines } => {
                for line in lines {
                    display.render(DisplayItem::Text(line.clone()));
                }
            }
        }
        view
    }
}

/// Report a failed interaction to the visitor; pass successes through.
fn conclude(
    feature: &'static str,
    result: Result<InteractionOutcome, InteractionError>,
    display: &mut dyn DisplaySink,
) -> InteractionOutcome {
    match result {
        Ok(outcome) => {
            tracing::info!(feature, outcome = ?outcome, "Interaction finished");
            outcome
        }
        Err(err) => {
            if err.is_quota() {
                tracing::warn!(feature, error = %err, "Provider quota exceeded");
            } else {
                tracing::error!(feature, error = %err, "Interaction failed");
            }
            display.render(DisplayItem::Error(err.user_message()));
            InteractionOutcome::Failed(err)
        }
    }
}
