//! Route handler functions for all API endpoints.
//!
//! Interaction handlers validate the request, then hand the work to a task
//! that locks the session and runs the controller. Everything the controller
//! renders is forwarded as one SSE event per display call, followed by a
//! final `done` event carrying the outcome.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use guide_core::{ImageFormat, Speaker, UploadedArtifact};
use guide_session::{
    ChannelDisplay, DisplayItem, GuideSession, InteractionController, InteractionOutcome,
    TourView,
};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub session_id: Uuid,
    pub log_entries: usize,
}

/// One tour log line for GET /log.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogEntryResponse {
    pub id: Uuid,
    pub speaker: Speaker,
    pub label: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Response for GET /log.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogResponse {
    pub session_id: Uuid,
    pub entries: Vec<LogEntryResponse>,
    /// Set only while the log is empty.
    pub placeholder: Option<String>,
}

/// Response for POST /session/reset.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub session_id: Uuid,
}

/// Payload of the closing `done` event.
#[derive(Debug, Serialize, Deserialize)]
pub struct DoneEvent {
    pub kind: String,
    pub outcome: String,
    pub entries_added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&InteractionOutcome> for DoneEvent {
    fn from(outcome: &InteractionOutcome) -> Self {
        let (name, entries_added, error) = match outcome {
            InteractionOutcome::Logged(n) => ("logged", *n, None),
            InteractionOutcome::NothingNew => ("nothing_new", 0, None),
            InteractionOutcome::Failed(err) => ("failed", 0, Some(err.to_string())),
        };
        Self {
            kind: "done".to_string(),
            outcome: name.to_string(),
            entries_added,
            error,
        }
    }
}

// =============================================================================
// Streaming helper
// =============================================================================

/// A feature request, validated and ready to run against the session.
#[derive(Debug)]
enum Interaction {
    AnalyzeArtifact(Option<UploadedArtifact>),
    Chat(String),
    Voice(Bytes),
    FunFact,
}

impl Interaction {
    async fn run(
        self,
        controller: &InteractionController,
        session: &mut GuideSession,
        display: &mut ChannelDisplay,
    ) -> InteractionOutcome {
        match self {
            Interaction::AnalyzeArtifact(artifact) => {
                controller.analyze_artifact(session, artifact, display).await
            }
            Interaction::Chat(message) => controller.ask_guide(session, &message, display).await,
            Interaction::Voice(wav) => controller.ask_guide_by_voice(session, &wav, display).await,
            Interaction::FunFact => controller.generate_fun_fact(session, display).await,
        }
    }
}

fn display_event(item: DisplayItem) -> Event {
    let data = serde_json::to_string(&item).unwrap_or_default();
    Event::default().event(item.kind()).data(data)
}

fn done_event(outcome: Result<InteractionOutcome, oneshot::error::RecvError>) -> Event {
    let body = match outcome {
        Ok(outcome) => DoneEvent::from(&outcome),
        Err(_) => {
            tracing::error!("Interaction task ended without an outcome");
            DoneEvent {
                kind: "done".to_string(),
                outcome: "aborted".to_string(),
                entries_added: 0,
                error: None,
            }
        }
    };
    Event::default()
        .event("done")
        .data(serde_json::to_string(&body).unwrap_or_default())
}

/// Run `interaction` against the session in its own task and stream what it
/// renders.
///
/// The task runs to completion even if the client disconnects.
fn stream_interaction(
    state: AppState,
    interaction: Interaction,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    let (tx, rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(async move {
        let mut display = ChannelDisplay::new(tx);
        let mut session = state.session.lock().await;
        let outcome = interaction
            .run(&state.controller, &mut session, &mut display)
            .await;
        let _ = done_tx.send(outcome);
    });

    let items =
        UnboundedReceiverStream::new(rx).map(|item| Ok::<_, Infallible>(display_event(item)));
    let done = futures_util::stream::once(async move { Ok(done_event(done_rx.await)) });

    Sse::new(items.chain(done)).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

// =============================================================================
// Interaction endpoints
// =============================================================================

/// POST /artifact/analyze - multipart `image` plus optional `question`.
pub async fn analyze_artifact(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut image: Option<Vec<u8>> = None;
    let mut question: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    image = Some(bytes.to_vec());
                }
            }
            Some("question") => question = Some(field.text().await?),
            _ => {}
        }
    }

    let artifact = match image {
        Some(bytes) => {
            if ImageFormat::sniff(&bytes).is_none() {
                return Err(ApiError::BadRequest(
                    "image must be a JPEG or PNG file".to_string(),
                ));
            }
            UploadedArtifact::new(bytes, question)
        }
        None => None,
    };

    tracing::info!(has_image = artifact.is_some(), "Artifact analysis requested");
    Ok(stream_interaction(
        state,
        Interaction::AnalyzeArtifact(artifact),
    ))
}

/// POST /chat - typed question for the guide.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    tracing::info!(message_len = req.message.len(), "Chat turn requested");
    stream_interaction(state, Interaction::Chat(req.message))
}

/// POST /voice - one utterance as a WAV body.
pub async fn voice(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest(
            "request body must contain a WAV recording".to_string(),
        ));
    }
    tracing::info!(bytes = body.len(), "Voice turn requested");
    Ok(stream_interaction(state, Interaction::Voice(body)))
}

/// POST /facts - generate a fun fact not seen this session.
pub async fn facts(State(state): State<AppState>) -> impl IntoResponse {
    tracing::info!("Fun fact requested");
    stream_interaction(state, Interaction::FunFact)
}

// =============================================================================
// Session endpoints
// =============================================================================

/// GET /log - the tour log.
pub async fn tour_log(State(state): State<AppState>) -> Json<LogResponse> {
    let session = state.session.lock().await;
    let placeholder = match session.log().tour_view() {
        TourView::Empty { placeholder } => Some(placeholder),
        TourView::Lines { .. } => None,
    };
    let entries = session
        .log()
        .entries()
        .iter()
        .map(|e| LogEntryResponse {
            id: e.id(),
            speaker: e.speaker(),
            label: e.speaker().label().to_string(),
            text: e.text().to_string(),
            created_at: e.created_at(),
        })
        .collect();

    Json(LogResponse {
        session_id: session.id(),
        entries,
        placeholder,
    })
}

/// POST /session/reset - start a new session.
pub async fn reset_session(State(state): State<AppState>) -> Json<ResetResponse> {
    let mut session = state.session.lock().await;
    state.controller.reset_session(&mut session);
    Json(ResetResponse {
        session_id: session.id(),
    })
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let session = state.session.lock().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        session_id: session.id(),
        log_entries: session.log().len(),
    })
}

/// GET / - the guide page.
pub async fn index() -> impl IntoResponse {
    Html(guide_ui::GUIDE_HTML)
}
