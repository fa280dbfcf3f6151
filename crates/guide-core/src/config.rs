use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GuideError, Result};

/// Prompt sent for every fun-fact attempt.
pub const DEFAULT_FACT_PROMPT: &str = "Give me a fascinating, short historical or cultural fact suitable for a museum visitor that I haven't heard before.";

/// System instruction carried by the chat model.
pub const DEFAULT_GUIDE_PERSONA: &str = "You are a friendly, knowledgeable museum guide. Answer questions about art, artifacts, history and culture in an engaging way, as if walking a visitor through the galleries.";

/// Top-level configuration for the museum guide.
///
/// Loaded from `museum-guide.toml` by default. Each section corresponds to a
/// bounded context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuideConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub facts: FactsConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
}

impl GuideConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GuideConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is missing or
    /// cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| GuideError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Interface the HTTP server binds to.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            log_level: "info".to_string(),
        }
    }
}

/// Multimodal model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model used for both the vision and the chat handle.
    pub name: String,
    /// Base URL of the generative language API.
    pub api_base: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// System instruction for the chat handle.
    pub guide_persona: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-1.5-flash-latest".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            request_timeout_secs: 60,
            guide_persona: DEFAULT_GUIDE_PERSONA.to_string(),
        }
    }
}

/// Fun-fact generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactsConfig {
    /// Upper bound on generation attempts per request.
    pub max_attempts: u32,
    /// Fixed single-turn prompt.
    pub prompt: String,
}

impl Default for FactsConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            prompt: DEFAULT_FACT_PROMPT.to_string(),
        }
    }
}

/// Voice guide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Reusable file the captured utterance is written to before transcription.
    pub audio_path: String,
    /// BCP-47 language code for recognition.
    pub language: String,
    /// Base URL of the speech-to-text API.
    pub speech_api_base: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            audio_path: "audio.wav".to_string(),
            language: "en-US".to_string(),
            speech_api_base: "https://speech.googleapis.com/v1".to_string(),
        }
    }
}

/// Secret store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// TOML file holding credentials.
    pub path: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            path: "secrets.toml".to_string(),
        }
    }
}
