//! Chat message types.
//!
//! Messages are kept in insertion order; that order is both the display order
//! and the transcript order sent to the remote API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Text shown by the placeholder while a reply is being generated.
pub const PLACEHOLDER_TEXT: &str = "Thinking...";

/// Fallback text for an error-flavored reply with no description.
pub const DEFAULT_ERROR_TEXT: &str = "Sorry, I encountered an error trying to respond.";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Message typed by the signed-in user.
    User,
    /// Message produced by the assistant.
    Bot,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within a session.
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    /// True only for the in-flight bot reply placeholder.
    #[serde(default)]
    pub is_loading: bool,
    /// True for a bot message that reports a failed reply generation.
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    /// Creates a message authored by the user.
    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, text, Sender::User)
    }

    /// Creates a complete bot reply.
    pub fn bot(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, text, Sender::Bot)
    }

    /// Creates the transient placeholder shown while a reply is generated.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            is_loading: true,
            ..Self::new(id, PLACEHOLDER_TEXT, Sender::Bot)
        }
    }

    /// Creates an error-flavored bot message carrying a failure description.
    pub fn bot_error(id: impl Into<String>, description: &str) -> Self {
        let text = if description.trim().is_empty() {
            DEFAULT_ERROR_TEXT
        } else {
            description
        };
        Self {
            is_error: true,
            ..Self::new(id, text, Sender::Bot)
        }
    }

    fn new(id: impl Into<String>, text: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            is_loading: false,
            is_error: false,
        }
    }

    /// Overrides the timestamp after construction.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates message ids of the form `{prefix}-{unix_millis}-{seq}`.
///
/// The sequence number comes from a process-wide counter, so two ids created
/// within the same millisecond still differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageIdGenerator;

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Returns a fresh id with the given prefix.
    pub fn next_id(&self, prefix: &str) -> String {
        let seq = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_unique_within_same_millisecond() {
        let ids = MessageIdGenerator::new();
        let generated: HashSet<String> = (0..1000).map(|_| ids.next_id("user")).collect();
        assert_eq!(generated.len(), 1000);
    }

    #[test]
    fn test_generated_id_keeps_prefix() {
        let id = MessageIdGenerator::new().next_id("bot-loading");
        assert!(id.starts_with("bot-loading-"));
    }

    #[test]
    fn test_placeholder_is_loading_bot() {
        let msg = Message::placeholder("p1");
        assert!(msg.is_loading);
        assert_eq!(msg.sender, Sender::Bot);
        assert_eq!(msg.text, PLACEHOLDER_TEXT);
    }

    #[test]
    fn test_bot_error_falls_back_to_default_text() {
        let msg = Message::bot_error("e1", "  ");
        assert!(msg.is_error);
        assert!(!msg.is_loading);
        assert_eq!(msg.text, DEFAULT_ERROR_TEXT);

        let msg = Message::bot_error("e2", "Generation error: empty");
        assert_eq!(msg.text, "Generation error: empty");
    }

    #[test]
    fn test_sender_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sender::Bot).unwrap(), "\"bot\"");
        assert_eq!(
            serde_json::from_str::<Sender>("\"user\"").unwrap(),
            Sender::User
        );
    }
}
