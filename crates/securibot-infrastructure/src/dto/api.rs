//! Request and response bodies for the chat API endpoints.

use super::message::ApiChatMessage;
use securibot_core::ConversationSummary;
use serde::{Deserialize, Serialize};

// ============================================================================
// POST /currentConvo
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SaveConversationRequest {
    pub uid: String,
    /// Serialized as a two-element array: `[{conversationId}, {conversation}]`.
    #[serde(rename = "conversationData")]
    pub conversation_data: (ConversationIdEntry, ConversationEntry),
}

impl SaveConversationRequest {
    pub fn new(uid: String, conversation_id: Option<String>, messages: Vec<ApiChatMessage>) -> Self {
        Self {
            uid,
            conversation_data: (
                ConversationIdEntry { conversation_id },
                ConversationEntry {
                    conversation: TranscriptDto { messages },
                },
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationIdEntry {
    #[serde(rename = "conversationId")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationEntry {
    pub conversation: TranscriptDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptDto {
    pub messages: Vec<ApiChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveConversationResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
}

// ============================================================================
// POST /getUserConvos
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ListConversationsRequest {
    pub uid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListConversationsResponse {
    #[serde(default)]
    pub conversations: Vec<ConversationSummaryDto>,
}

/// The backend has been seen emitting `conversationId` instead of `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationSummaryDto {
    #[serde(alias = "conversationId")]
    pub id: String,
    #[serde(default = "untitled")]
    pub title: String,
}

fn untitled() -> String {
    "Untitled".to_string()
}

impl From<ConversationSummaryDto> for ConversationSummary {
    fn from(dto: ConversationSummaryDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
        }
    }
}

// ============================================================================
// POST /getFullConvo
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct FullConversationRequest {
    pub uid: String,
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FullConversationResponse {
    pub conversation: TranscriptDto,
}

// ============================================================================
// POST /generate
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub context: Vec<ApiChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: AssistantResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantResponse {
    #[serde(default)]
    pub role: Option<String>,
    pub content: Vec<ContentItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl AssistantResponse {
    /// Returns the reply text when the content is exactly one text item.
    pub fn single_text(self) -> Result<String, String> {
        let mut content = self.content;
        if content.len() != 1 {
            return Err(format!(
                "expected exactly one text content item, got {}",
                content.len()
            ));
        }
        let item = content.remove(0);
        match (item.kind.as_str(), item.text) {
            ("text", Some(text)) => Ok(text),
            ("text", None) => Err("text content item has no text".to_string()),
            (other, _) => Err(format!("unsupported content type '{other}'")),
        }
    }
}
