//! Conversation history use case (sidebar listing).

use securibot_core::{ChatApi, ConversationSummary, Result};
use std::sync::Arc;

/// Lists the signed-in user's past conversations.
pub struct ConversationHistory {
    api: Arc<dyn ChatApi>,
}

impl ConversationHistory {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self { api }
    }

    /// Returns the user's conversations, empty when nobody is signed in.
    pub async fn list(&self) -> Result<Vec<ConversationSummary>> {
        let conversations = self.api.list_conversations().await.inspect_err(|err| {
            tracing::error!(error = %err, "Failed to fetch user conversations");
        })?;
        tracing::debug!(count = conversations.len(), "Fetched conversation history");
        Ok(conversations)
    }
}
