//! Application layer for Securibot.
//!
//! Coordinates the identity provider and the chat API to implement the chat
//! screen's use cases: loading a conversation, sending messages, listing
//! history.

pub mod history;
pub mod session;

pub use history::ConversationHistory;
pub use session::{ConversationSession, Persistence, SendOutcome, SessionPhase, SessionState};
