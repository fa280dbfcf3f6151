//! Session boundary: owns all per-visitor state.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use guide_gateway::{ChatSession, ModelGateway};

use crate::facts::FactHistory;
use crate::log::ConversationLog;

/// State for one visitor session.
///
/// Created by [`GuideSession::start`] with an empty log, an empty fact
/// history and a fresh chat handle. Every interaction borrows it mutably, so
/// at most one interaction touches it at a time.
pub struct GuideSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    pub(crate) log: ConversationLog,
    pub(crate) facts: FactHistory,
    pub(crate) chat: Box<dyn ChatSession>,
}

impl GuideSession {
    pub fn start(gateway: &dyn ModelGateway) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            log: ConversationLog::new(),
            facts: FactHistory::new(),
            chat: gateway.start_chat(),
        };
        tracing::info!(session_id = %session.id, "Guide session started");
        session
    }

    /// Discard all state and start over.
    pub fn reset(&mut self, gateway: &dyn ModelGateway) {
        let previous = self.id;
        *self = Self::start(gateway);
        tracing::info!(previous = %previous, session_id = %self.id, "Guide session reset");
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn fact_history(&self) -> &FactHistory {
        &self.facts
    }

    /// Seed the fact history, e.g. when restoring a visitor's earlier facts.
    pub fn remember_fact(&mut self, fact: impl Into<String>) -> bool {
        self.facts.insert(fact)
    }

    pub fn chat_history_len(&self) -> usize {
        self.chat.history_len()
    }
}

impl std::fmt::Debug for GuideSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuideSession")
            .field("id", &self.id)
            .field("started_at", &self.started_at)
            .field("log_entries", &self.log.len())
            .field("facts", &self.facts.len())
            .finish_non_exhaustive()
    }
}
