//! Session model for the museum guide.
//!
//! Holds the per-visitor tour log and fun fact history, the duplicate-avoiding
//! fact loop, and the controller that runs each feature against a session.

pub mod controller;
pub mod display;
pub mod error;
pub mod facts;
pub mod log;
pub mod session;

pub use controller::{InteractionController, InteractionOutcome, FACT_BANNER, INSIGHT_BANNER};
pub use display::{ChannelDisplay, DisplayItem, DisplaySink};
pub use error::InteractionError;
pub use facts::{FactDeduplicator, FactHistory, FactOutcome};
pub use log::{ConversationLog, TourView, EMPTY_LOG_PLACEHOLDER};
pub use session::GuideSession;
