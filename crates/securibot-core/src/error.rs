//! Error types for the Securibot client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Securibot client.
///
/// Every failure surfaced to the presentation layer is one of these variants.
/// None of them are fatal: a failed operation degrades the current screen and
/// leaves the session controller usable.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecuribotError {
    /// No principal was signed in when one was required.
    ///
    /// The caller is expected to redirect to a sign-in flow.
    #[error("Not authenticated: please sign in to continue")]
    Unauthenticated,

    /// Network failure or non-2xx status from the remote API.
    #[error("Transport error during {operation}: {}", describe_transport(.status, .body))]
    Transport {
        operation: String,
        status: Option<u16>,
        body: String,
    },

    /// The response was received but did not match the expected structure.
    #[error("Unexpected response shape from {operation}: {message}")]
    Shape { operation: String, message: String },

    /// The reply endpoint returned a well-formed but unusable payload.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out during {operation} after {after_secs}s")]
    Timeout { operation: String, after_secs: u64 },

    /// Another send or load is already in flight for this session.
    #[error("A request is already in progress for this conversation")]
    Busy,

    /// The operation was abandoned by its caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// The session was reset or the principal signed out while the operation
    /// was in flight; its results were discarded.
    #[error("Session was invalidated while the request was in flight")]
    SessionInvalidated,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },
}

fn describe_transport(status: &Option<u16>, body: &str) -> String {
    match (status, body.trim()) {
        (Some(code), "") => format!("HTTP {code}"),
        (Some(code), body) => format!("HTTP {code} {body}"),
        (None, "") => "network failure".to_string(),
        (None, body) => body.to_string(),
    }
}

impl SecuribotError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error for a non-2xx status.
    pub fn status(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            status: Some(status),
            body: body.into(),
        }
    }

    /// Creates a Transport error for a request that never produced a status.
    pub fn network(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            status: None,
            body: message.into(),
        }
    }

    /// Creates a Shape error
    pub fn shape(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Shape {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a Generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, Self::Shape { .. })
    }

    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the HTTP status carried by a Transport error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Short title for a user-visible notification about this error.
    pub fn user_title(&self) -> &'static str {
        match self {
            Self::Unauthenticated | Self::SessionInvalidated => "Not Authenticated",
            Self::Generation(_) => "AI Error",
            Self::Transport { .. } | Self::Timeout { .. } => "Network Error",
            Self::Shape { .. } => "Unexpected Server Response",
            Self::Busy => "Please Wait",
            Self::Cancelled => "Cancelled",
            Self::Config(_) | Self::Io { .. } | Self::Serialization { .. } => "Configuration Error",
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for SecuribotError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for SecuribotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SecuribotError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, SecuribotError>`.
pub type Result<T> = std::result::Result<T, SecuribotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_includes_status_and_body() {
        let err = SecuribotError::status("saveConversation", 500, "boom");
        assert_eq!(
            err.to_string(),
            "Transport error during saveConversation: HTTP 500 boom"
        );
        assert_eq!(err.status_code(), Some(500));
        assert!(err.is_transport());
    }

    #[test]
    fn test_network_error_has_no_status() {
        let err = SecuribotError::network("generateReply", "connection refused");
        assert_eq!(err.status_code(), None);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_shape_and_transport_are_distinguishable() {
        let shape = SecuribotError::shape("listConversations", "missing field `conversations`");
        let transport = SecuribotError::status("listConversations", 404, "");

        assert!(shape.is_shape());
        assert!(!shape.is_transport());
        assert_ne!(shape.user_title(), transport.user_title());
        assert!(shape.to_string().starts_with("Unexpected response shape"));
        assert!(transport.to_string().starts_with("Transport error"));
    }

    #[test]
    fn test_user_titles() {
        assert_eq!(SecuribotError::Unauthenticated.user_title(), "Not Authenticated");
        assert_eq!(SecuribotError::generation("empty").user_title(), "AI Error");
    }

    #[test]
    fn test_from_serde_json_error() {
        let err: SecuribotError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, SecuribotError::Serialization { ref format, .. } if format == "JSON"));
    }
}
