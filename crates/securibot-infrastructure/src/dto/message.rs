//! Wire representation of chat messages.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use securibot_core::{Message, SecuribotError, Sender};
use serde::{Deserialize, Serialize};

/// A message as exchanged with the API (timestamps as ISO-8601 strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiChatMessage {
    pub sender: Sender,
    pub text: String,
    pub timestamp: String,
}

impl From<&Message> for ApiChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            sender: message.sender,
            text: message.text.clone(),
            timestamp: format_timestamp(&message.timestamp),
        }
    }
}

impl ApiChatMessage {
    /// Rebuilds a domain message with an id synthesized as
    /// `{conversation_id}-msg-{index}-{unix_millis}`.
    pub fn into_message(
        self,
        conversation_id: &str,
        index: usize,
        operation: &str,
    ) -> Result<Message, SecuribotError> {
        let timestamp = parse_timestamp(&self.timestamp).ok_or_else(|| {
            SecuribotError::shape(
                operation,
                format!("invalid timestamp '{}' at message {}", self.timestamp, index),
            )
        })?;

        Ok(Message {
            id: format!(
                "{}-msg-{}-{}",
                conversation_id,
                index,
                timestamp.timestamp_millis()
            ),
            text: self.text,
            sender: self.sender,
            timestamp,
            is_loading: false,
            is_error: false,
        })
    }
}

/// Formats like `Date.prototype.toISOString`: millisecond precision, `Z` suffix.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses RFC 3339, or an ISO-8601 local time without offset (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_ISO_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

const NAIVE_ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Converts a transcript to its wire form, preserving order.
pub fn to_wire(messages: &[Message]) -> Vec<ApiChatMessage> {
    messages.iter().map(ApiChatMessage::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_matches_iso_string_format() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-05-01T12:30:00.000Z");
    }

    #[test]
    fn test_into_message_synthesizes_id() {
        let wire = ApiChatMessage {
            sender: Sender::Bot,
            text: "Phishing is...".to_string(),
            timestamp: "2024-05-01T12:30:00.000Z".to_string(),
        };
        let msg = wire.into_message("conv1", 3, "loadConversation").unwrap();
        assert_eq!(msg.id, "conv1-msg-3-1714566600000");
        assert_eq!(msg.sender, Sender::Bot);
        assert!(!msg.is_loading);
    }

    #[test]
    fn test_into_message_rejects_bad_timestamp() {
        let wire = ApiChatMessage {
            sender: Sender::User,
            text: "hi".to_string(),
            timestamp: "yesterday".to_string(),
        };
        let err = wire.into_message("conv1", 0, "loadConversation").unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn test_into_message_accepts_timestamp_without_offset() {
        for (raw, millis) in [
            ("2024-05-01T12:30:00.123456", 1_714_566_600_123),
            ("2024-05-01T12:30:00", 1_714_566_600_000),
        ] {
            let wire = ApiChatMessage {
                sender: Sender::User,
                text: "hi".to_string(),
                timestamp: raw.to_string(),
            };
            let msg = wire.into_message("conv1", 0, "loadConversation").unwrap();
            assert_eq!(msg.timestamp.timestamp_millis(), millis, "{raw}");
        }
    }

    #[test]
    fn test_sub_second_precision_is_truncated_to_millis_but_ordered() {
        let first = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let second = Utc.timestamp_opt(1_700_000_000, 123_900_000).unwrap();
        let a = parse_timestamp(&format_timestamp(&first)).unwrap();
        let b = parse_timestamp(&format_timestamp(&second)).unwrap();
        assert_eq!(a.timestamp_subsec_millis(), 123);
        assert!(a <= b);
    }
}
