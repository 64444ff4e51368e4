//! Conversation domain model.

use crate::message::Message;
use serde::{Deserialize, Serialize};

/// A conversation transcript as known to this client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// `None` until the remote store assigns an id on first save.
    pub id: Option<String>,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Entry in the user's conversation history listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
}

/// Result of persisting a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedConversation {
    pub conversation_id: String,
}
