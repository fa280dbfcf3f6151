//! Guide speech crate - voice capture decoding and speech-to-text.
//!
//! Provides a trait-based abstraction for transcription, a Google
//! Speech-to-Text backed implementation, WAV decoding for captured
//! utterances, and a mock recognizer for tests.

pub mod audio;
pub mod error;
pub mod google;

use async_trait::async_trait;

pub use audio::Recording;
pub use error::SpeechError;
pub use google::GoogleSpeechRecognizer;

// =============================================================================
// Result types
// =============================================================================

/// Text recognized from one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Best transcription alternative, trimmed.
    pub text: String,
    /// Recognizer confidence for the chosen alternative, when reported.
    pub confidence: Option<f32>,
    /// Length of the submitted audio in seconds.
    pub duration_secs: f32,
}

// =============================================================================
// Trait
// =============================================================================

/// Service turning captured audio into text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe mono PCM samples in [-1.0, 1.0].
    ///
    /// Returns [`SpeechError::UnrecognizedSpeech`] when the audio contains
    /// no intelligible speech.
    async fn transcribe(&self, samples: &[f32], sample_rate: u32)
        -> Result<Transcript, SpeechError>;
}

fn validate_input(samples: &[f32], sample_rate: u32) -> Result<(), SpeechError> {
    if samples.is_empty() {
        return Err(SpeechError::Audio("recording contains no samples".into()));
    }
    if sample_rate == 0 {
        return Err(SpeechError::Audio("sample rate must be greater than 0".into()));
    }
    Ok(())
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Recognizer that returns a fixed transcription.
///
/// `None` simulates audio the recognizer could not understand.
#[derive(Debug, Clone, Default)]
pub struct MockRecognizer {
    text: Option<String>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn unintelligible() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl SpeechToText for MockRecognizer {
    async fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<Transcript, SpeechError> {
        validate_input(samples, sample_rate)?;

        let duration_secs = samples.len() as f32 / sample_rate as f32;
        tracing::debug!(duration_secs, sample_rate, "Mock transcription generated");

        match &self.text {
            Some(text) => Ok(Transcript {
                text: text.clone(),
                confidence: Some(0.95),
                duration_secs,
            }),
            None => Err(SpeechError::UnrecognizedSpeech),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
