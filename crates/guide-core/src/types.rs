use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Who produced a tour log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// A typed chat message.
    User,
    /// A chat message obtained by transcribing the visitor's voice.
    UserVoice,
    /// A reply from the chat model.
    Guide,
    /// The result of analyzing an uploaded artifact image.
    ArtifactInsight,
    /// An accepted fun fact.
    FunFact,
}

impl Speaker {
    /// Label used when rendering the tour log.
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "You",
            Speaker::UserVoice => "You (Voice)",
            Speaker::Guide => "Guide",
            Speaker::ArtifactInsight => "Artifact Insight",
            Speaker::FunFact => "Fun Fact",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepted upload image formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Detect the format from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
        const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
        if bytes.starts_with(PNG_MAGIC) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(JPEG_MAGIC) {
            Some(ImageFormat::Jpeg)
        } else {
            None
        }
    }

    /// MIME type sent alongside the image data.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

// =============================================================================
// Structs
// =============================================================================

/// One completed interaction (or one side of it) in the tour log.
///
/// Entries are immutable once created; the log only ever appends them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    id: Uuid,
    speaker: Speaker,
    text: String,
    created_at: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl fmt::Display for ConversationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker, self.text)
    }
}

/// An uploaded image plus the optional question asked about it.
///
/// Exists only for the duration of one analysis request.
#[derive(Clone, Debug)]
pub struct UploadedArtifact {
    pub image: Vec<u8>,
    pub format: ImageFormat,
    pub question: Option<String>,
}

impl UploadedArtifact {
    /// Wrap raw bytes, rejecting anything that is not JPEG or PNG.
    ///
    /// A blank question is treated as no question.
    pub fn new(image: Vec<u8>, question: Option<String>) -> Option<Self> {
        let format = ImageFormat::sniff(&image)?;
        let question = question
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        Some(Self {
            image,
            format,
            question,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
