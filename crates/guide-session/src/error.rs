//! Error types for guide interactions.

use guide_gateway::GatewayError;
use guide_speech::SpeechError;

/// Every failure an interaction can end with.
///
/// All of them are caught at the controller boundary, shown to the visitor
/// and leave the tour log untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InteractionError {
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("service error: {0}")]
    Service(String),
    #[error("speech could not be understood")]
    UnrecognizedSpeech,
    #[error("transcription service error: {0}")]
    TranscriptionService(String),
    #[error("an artifact image is required")]
    MissingImage,
    #[error("message cannot be empty")]
    EmptyMessage,
}

impl InteractionError {
    /// Text shown to the visitor.
    pub fn user_message(&self) -> String {
        match self {
            InteractionError::QuotaExceeded(_) => {
                "Quota exceeded. Please wait a moment and try again.".to_string()
            }
            InteractionError::Service(detail) => format!("An error occurred: {}", detail),
            InteractionError::UnrecognizedSpeech => {
                "Could not understand audio. Please try speaking more clearly.".to_string()
            }
            InteractionError::TranscriptionService(detail) => {
                format!("Speech recognition service error: {}", detail)
            }
            InteractionError::MissingImage => {
                "Please upload an image of the artifact first.".to_string()
            }
            InteractionError::EmptyMessage => "Please enter a question first.".to_string(),
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, InteractionError::QuotaExceeded(_))
    }
}

impl From<GatewayError> for InteractionError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::QuotaExceeded(detail) => InteractionError::QuotaExceeded(detail),
            GatewayError::Service(detail) => InteractionError::Service(detail),
        }
    }
}

impl From<SpeechError> for InteractionError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::UnrecognizedSpeech => InteractionError::UnrecognizedSpeech,
            SpeechError::Service(detail) => InteractionError::TranscriptionService(detail),
            // A capture that cannot be read is a generic failure.
            other @ SpeechError::Audio(_) => InteractionError::Service(other.to_string()),
        }
    }
}
