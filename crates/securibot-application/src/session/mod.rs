//! Conversation session controller.
//!
//! This module contains the controller that owns one chat screen's message
//! list and conversation identity, and the state types it publishes.

mod controller;
mod state;

pub use controller::ConversationSession;
pub use state::{Persistence, SendOutcome, SessionPhase, SessionState};
