//! Remote chat API contract.

use crate::conversation::{ConversationSummary, SavedConversation};
use crate::error::Result;
use crate::message::Message;
use async_trait::async_trait;

/// The four request/response exchanges with the remote chat service.
///
/// Implementations perform exactly one exchange per call. There is no retry
/// and no backoff: failures propagate to the caller immediately.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Persists a transcript.
    ///
    /// When `conversation_id` is `None` the remote store assigns a new id and
    /// returns it.
    async fn save_conversation(
        &self,
        conversation_id: Option<&str>,
        messages: &[Message],
    ) -> Result<SavedConversation>;

    /// Lists the signed-in user's conversations.
    ///
    /// Returns an empty list without any network traffic when nobody is
    /// signed in.
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>>;

    /// Fetches a full transcript, with message ids synthesized from the
    /// conversation id, the message index and its timestamp.
    async fn load_conversation(&self, conversation_id: &str) -> Result<Vec<Message>>;

    /// Requests a generated reply for `prompt` given prior messages as context.
    async fn generate_reply(&self, prompt: &str, context: &[Message]) -> Result<String>;
}
