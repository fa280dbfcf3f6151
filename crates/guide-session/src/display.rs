//! Display contract between the controller and whatever renders output.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// One render call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum DisplayItem {
    /// A long-running step has started.
    Progress(String),
    /// Plain body text.
    Text(String),
    /// One streamed fragment of a chat reply.
    Chunk(String),
    /// A success banner.
    Success(String),
    /// A user-facing failure.
    Error(String),
    /// Informational notice.
    Info(String),
}

impl DisplayItem {
    pub fn kind(&self) -> &'static str {
        match self {
            DisplayItem::Progress(_) => "progress",
            DisplayItem::Text(_) => "text",
            DisplayItem::Chunk(_) => "chunk",
            DisplayItem::Success(_) => "success",
            DisplayItem::Error(_) => "error",
            DisplayItem::Info(_) => "info",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DisplayItem::Progress(t)
            | DisplayItem::Text(t)
            | DisplayItem::Chunk(t)
            | DisplayItem::Success(t)
            | DisplayItem::Error(t)
            | DisplayItem::Info(t) => t,
        }
    }
}

/// Receives render calls in the order they are made.
pub trait DisplaySink: Send {
    fn render(&mut self, item: DisplayItem);
}

/// Collects everything rendered; used by tests and for buffered replies.
impl DisplaySink for Vec<DisplayItem> {
    fn render(&mut self, item: DisplayItem) {
        self.push(item);
    }
}

/// Forwards render calls to a channel, e.g. an SSE response body.
#[derive(Debug, Clone)]
pub struct ChannelDisplay {
    tx: UnboundedSender<DisplayItem>,
}

impl ChannelDisplay {
    pub fn new(tx: UnboundedSender<DisplayItem>) -> Self {
        Self { tx }
    }
}

impl DisplaySink for ChannelDisplay {
    fn render(&mut self, item: DisplayItem) {
        // The receiver is gone once the client disconnects.
        if self.tx.send(item).is_err() {
            tracing::debug!("Display receiver dropped; output discarded");
        }
    }
}
