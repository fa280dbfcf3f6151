//! The museum guide page.
//!
//! Five tabbed views: Artifact Explorer, Smart Tour Chatbot, Voice Guide,
//! Cultural Fun Fact and Tour Log. Interaction endpoints answer with
//! `text/event-stream`; the page reads each response body incrementally and
//! renders every event as it arrives, so chat replies appear chunk by chunk.

/// Title shown in the browser tab and page header.
pub const PAGE_TITLE: &str = "Gemini Museum Guide Pro";

/// The complete self-contained page.
///
/// No CDN links and no build step. Voice capture uses `MediaRecorder`, and
/// the recording is re-encoded in the browser as 16-bit PCM WAV before upload.
pub const GUIDE_HTML: &str = include_str!("../assets/guide.html");
