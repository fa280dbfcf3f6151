//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use guide_core::GuideConfig;
use guide_gateway::ModelGateway;
use guide_session::{GuideSession, InteractionController};
use guide_speech::SpeechToText;

/// Shared application state.
///
/// The session sits behind an async mutex: an interaction holds it for its
/// whole duration, including a streamed reply, so interactions run one at a
/// time.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GuideConfig>,
    pub controller: Arc<InteractionController>,
    pub session: Arc<Mutex<GuideSession>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: GuideConfig,
        gateway: Arc<dyn ModelGateway>,
        speech: Arc<dyn SpeechToText>,
    ) -> Self {
        let controller = InteractionController::new(gateway, speech, &config);
        let session = controller.start_session();
        Self {
            config: Arc::new(config),
            controller: Arc::new(controller),
            session: Arc::new(Mutex::new(session)),
            start_time: Instant::now(),
        }
    }
}
