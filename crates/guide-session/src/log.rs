//! Append-only tour log.

use serde::Serialize;

use guide_core::{ConversationEntry, Speaker};

/// Shown in place of the tour log while it is empty.
pub const EMPTY_LOG_PLACEHOLDER: &str = "No conversation history yet.";

/// Ordered record of completed interactions for one session.
///
/// Entries are only ever appended; there is no removal or rewriting.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    entries: Vec<ConversationEntry>,
}

/// Read-only projection of the log for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TourView {
    Empty { placeholder: String },
    Lines { lines: Vec<String> },
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) -> &ConversationEntry {
        let entry = ConversationEntry::new(speaker, text);
        tracing::debug!(speaker = %speaker, position = self.entries.len(), "Log entry appended");
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Record both sides of a chat turn, user first.
    pub fn append_chat_turn(&mut self, speaker: Speaker, message: &str, reply: String) {
        self.entries.reserve(2);
        self.append(speaker, message);
        self.append(Speaker::Guide, reply);
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render every entry as `"{speaker}: {text}"` in insertion order.
    pub fn tour_view(&self) -> TourView {
        if self.entries.is_empty() {
            return TourView::Empty {
                placeholder: EMPTY_LOG_PLACEHOLDER.to_string(),
            };
        }
        TourView::Lines {
            lines: self.entries.iter().map(ToString::to_string).collect(),
        }
    }
}
