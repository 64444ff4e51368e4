//! Domain layer for the Securibot chat client.
//!
//! Holds the message and conversation model, the error taxonomy, and the two
//! capabilities the application layer is built against: [`IdentityProvider`]
//! and [`ChatApi`].

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod identity;
pub mod message;
pub mod prompts;

// Re-export common types
pub use api::ChatApi;
pub use conversation::{Conversation, ConversationSummary, SavedConversation};
pub use error::{Result, SecuribotError};
pub use identity::{AuthSubscription, IdentityProvider, Principal};
pub use message::{Message, MessageIdGenerator, Sender};
