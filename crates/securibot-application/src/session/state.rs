//! Session state owned by the conversation controller.

use securibot_core::{Conversation, Message, SecuribotError};

/// Lifecycle phase of a chat screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// New conversation with nothing loaded.
    Empty,
    /// A transcript fetch is in flight.
    Loading,
    /// Messages are present (loaded or sent). A send in flight is the
    /// `Sending` sub-phase, flagged by `is_busy`.
    Ready,
}

/// Snapshot of one chat screen's state.
///
/// Never persisted locally: the remote store is the source of truth across
/// sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Display and transcript order. Never reordered.
    pub messages: Vec<Message>,
    /// Set once, on the first successful save or on load.
    pub conversation_id: Option<String>,
    /// Gate allowing a single outstanding send.
    pub is_busy: bool,
    pub phase: SessionPhase,
    /// Bumped on every reset or invalidation. In-flight operations compare it
    /// after each suspension and drop their results on mismatch.
    pub generation: u64,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self {
            messages: Vec::new(),
            conversation_id: None,
            is_busy: false,
            phase: SessionPhase::Empty,
            generation: 0,
        }
    }

    /// True while a send is in flight.
    pub fn is_sending(&self) -> bool {
        self.phase == SessionPhase::Ready && self.is_busy
    }

    /// Number of in-flight reply placeholders. At most one.
    pub fn placeholder_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_loading).count()
    }

    /// The transcript as a conversation, without the reply placeholder.
    pub fn conversation(&self) -> Conversation {
        Conversation {
            id: self.conversation_id.clone(),
            messages: self.context(),
        }
    }

    /// Messages sent to the reply endpoint as context.
    pub(crate) fn context(&self) -> Vec<Message> {
        self.messages.iter().filter(|m| !m.is_loading).cloned().collect()
    }

    /// Replaces the message with `id` in place. Returns false if it is gone.
    pub(crate) fn replace_message(&mut self, id: &str, replacement: Message) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(slot) => {
                *slot = replacement;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_message(&mut self, id: &str) {
        self.messages.retain(|m| m.id != id);
        if self.messages.is_empty() && self.conversation_id.is_none() {
            self.phase = SessionPhase::Empty;
        }
    }

    /// Clears the transcript for a brand-new conversation. `is_busy` is left
    /// to the operation that holds it.
    pub(crate) fn reset(&mut self) {
        self.messages.clear();
        self.conversation_id = None;
        self.phase = SessionPhase::Empty;
        self.generation += 1;
    }
}

/// Result of a successful [`send`](super::ConversationSession::send).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// The bot reply now shown in place of the placeholder.
    pub reply: Message,
    pub persistence: Persistence,
}

/// What happened when the updated transcript was saved.
///
/// Failures do not roll back the in-memory transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    Saved {
        conversation_id: String,
        /// True when this save assigned the conversation its id.
        newly_assigned: bool,
    },
    Failed(SecuribotError),
}

impl Persistence {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}
