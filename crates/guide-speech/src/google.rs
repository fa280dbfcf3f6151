//! Google Cloud Speech-to-Text (v1 `speech:recognize`) recognizer.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use guide_core::config::VoiceConfig;

use crate::audio::Recording;
use crate::error::SpeechError;
use crate::{validate_input, SpeechToText, Transcript};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: String,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    #[serde(default)]
    message: String,
}

/// Recognizer backed by the Google Speech-to-Text REST API.
pub struct GoogleSpeechRecognizer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    language: String,
}

impl GoogleSpeechRecognizer {
    pub fn new(config: &VoiceConfig, api_key: impl Into<String>) -> Result<Self, SpeechError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SpeechError::Service(format!("failed to build HTTP client: {}", e)))?;
        tracing::info!(language = %config.language, "Speech recognizer ready");
        Ok(Self {
            client,
            api_base: config.speech_api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            language: config.language.clone(),
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[async_trait]
impl SpeechToText for GoogleSpeechRecognizer {
    async fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<Transcript, SpeechError> {
        validate_input(samples, sample_rate)?;

        let recording = Recording {
            samples: samples.to_vec(),
            sample_rate,
        };
        let duration_secs = recording.duration_secs();
        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: sample_rate,
                language_code: self.language.clone(),
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(recording.to_linear16()),
            },
        };

        tracing::debug!(duration_secs, sample_rate, "Sending audio to speech recognizer");

        let response = self
            .client
            .post(format!("{}/speech:recognize", self.api_base))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| body.trim().to_string());
            return Err(SpeechError::Service(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        let parsed: RecognizeResponse = response.json().await?;
        best_alternative(parsed, duration_secs)
    }
}

/// Join the top alternative of every result segment.
fn best_alternative(
    response: RecognizeResponse,
    duration_secs: f32,
) -> Result<Transcript, SpeechError> {
    let mut text = String::new();
    let mut confidence = None;
    for result in response.results {
        if let Some(alt) = result.alternatives.into_iter().next() {
            let piece = alt.transcript.trim();
            if piece.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(piece);
            confidence = confidence.or(alt.confidence);
        }
    }

    if text.is_empty() {
        return Err(SpeechError::UnrecognizedSpeech);
    }
    Ok(Transcript {
        text,
        confidence,
        duration_secs,
    })
}
