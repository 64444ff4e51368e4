//! HttpChatApi - REST client for the Securibot chat service.
//!
//! Every call is a single POST with a JSON body. A bearer token is attached
//! when the identity provider can supply one; otherwise the `Authorization`
//! header is omitted and the server decides.
//!
//! Failures are reported in two layers: transport (network error, timeout or
//! non-2xx status) and shape (2xx body that does not match the expected record).

use crate::dto::{
    FullConversationRequest, FullConversationResponse, GenerateRequest, GenerateResponse,
    ListConversationsRequest, ListConversationsResponse, SaveConversationRequest,
    SaveConversationResponse, to_wire,
};
use async_trait::async_trait;
use reqwest::Client;
use securibot_core::config::ClientConfig;
use securibot_core::{
    ChatApi, ConversationSummary, IdentityProvider, Message, Result, SavedConversation,
    SecuribotError,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

const SAVE_CONVERSATION: &str = "saveConversation";
const LIST_CONVERSATIONS: &str = "listConversations";
const LOAD_CONVERSATION: &str = "loadConversation";
const GENERATE_REPLY: &str = "generateReply";

/// Chat API client that talks to the remote service over HTTP.
#[derive(Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: String,
    timeout: Duration,
    identity: Arc<dyn IdentityProvider>,
}

impl HttpChatApi {
    /// Creates a client for `base_url` (e.g. `https://host/api`).
    pub fn new(base_url: impl Into<String>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(securibot_core::config::DEFAULT_REQUEST_TIMEOUT_SECS),
            identity,
        }
    }

    /// Builds a client from the loaded configuration.
    pub fn from_config(config: &ClientConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        Self::new(config.api_base_url.clone(), identity)
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn require_uid(&self) -> Result<String> {
        self.identity
            .current_principal()
            .map(|principal| principal.uid)
            .ok_or(SecuribotError::Unauthenticated)
    }

    async fn post<B, R>(&self, operation: &'static str, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let mut request = self.client.post(&url).timeout(self.timeout).json(body);

        match self.identity.current_token().await {
            Some(token) => request = request.bearer_auth(token),
            None => tracing::debug!(operation, "No token available, sending unauthenticated"),
        }

        tracing::debug!(operation, %url, "Sending request");

        let response = request
            .send()
            .await
            .map_err(|err| self.map_reqwest_error(operation, err))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|err| self.map_reqwest_error(operation, err))?;

        if !status.is_success() {
            tracing::error!(operation, status = status.as_u16(), body = %body_text, "API error");
            return Err(SecuribotError::status(operation, status.as_u16(), body_text));
        }

        serde_json::from_str(&body_text).map_err(|err| {
            tracing::error!(operation, error = %err, "Failed to parse server response");
            SecuribotError::shape(operation, err.to_string())
        })
    }

    fn map_reqwest_error(&self, operation: &str, err: reqwest::Error) -> SecuribotError {
        if err.is_timeout() {
            tracing::error!(operation, timeout_secs = self.timeout.as_secs(), "Request timed out");
            return SecuribotError::Timeout {
                operation: operation.to_string(),
                after_secs: self.timeout.as_secs(),
            };
        }
        tracing::error!(operation, error = %err, "Request failed");
        SecuribotError::network(operation, err.to_string())
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn save_conversation(
        &self,
        conversation_id: Option<&str>,
        messages: &[Message],
    ) -> Result<SavedConversation> {
        let uid = self.require_uid()?;
        let request = SaveConversationRequest::new(
            uid,
            conversation_id.map(str::to_string),
            to_wire(messages),
        );

        let response: SaveConversationResponse = self
            .post(SAVE_CONVERSATION, "currentConvo", &request)
            .await?;

        tracing::debug!(
            conversation_id = %response.conversation_id,
            status = response.status.as_deref().unwrap_or(""),
            "Conversation saved"
        );

        Ok(SavedConversation {
            conversation_id: response.conversation_id,
        })
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let Some(principal) = self.identity.current_principal() else {
            return Ok(Vec::new());
        };

        let request = ListConversationsRequest { uid: principal.uid };
        let response: ListConversationsResponse = self
            .post(LIST_CONVERSATIONS, "getUserConvos", &request)
            .await?;

        Ok(response.conversations.into_iter().map(Into::into).collect())
    }

    async fn load_conversation(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let uid = self.require_uid()?;
        let request = FullConversationRequest {
            uid,
            conversation_id: conversation_id.to_string(),
        };

        let response: FullConversationResponse = self
            .post(LOAD_CONVERSATION, "getFullConvo", &request)
            .await?;

        response
            .conversation
            .messages
            .into_iter()
            .enumerate()
            .map(|(index, msg)| msg.into_message(conversation_id, index, LOAD_CONVERSATION))
            .collect()
    }

    async fn generate_reply(&self, prompt: &str, context: &[Message]) -> Result<String> {
        let request = GenerateRequest {
            prompt: prompt.to_string(),
            context: to_wire(context),
        };

        let response: GenerateResponse = self.post(GENERATE_REPLY, "generate", &request).await?;

        if let Some(role) = response.response.role.as_deref()
            && role != "assistant"
        {
            tracing::warn!(role, "Unexpected role in generate response");
        }

        response.response.single_text().map_err(|reason| {
            tracing::error!(%reason, "Invalid response format from generate API");
            SecuribotError::generation(format!("Invalid response format from generate API: {reason}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_identity::LocalIdentityProvider;
    use securibot_core::{Principal, Sender};
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn signed_in() -> Arc<LocalIdentityProvider> {
        Arc::new(LocalIdentityProvider::signed_in(
            Principal::new("uid-1"),
            Some("token-abc".to_string()),
        ))
    }

    fn api(server: &MockServer, identity: Arc<LocalIdentityProvider>) -> HttpChatApi {
        HttpChatApi::new(format!("{}/api", server.uri()), identity)
    }

    fn generate_body(text: &str) -> Value {
        json!({"response": {"role": "assistant", "content": [{"type": "text", "text": text}]}})
    }

    #[tokio::test]
    async fn test_generate_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(header("authorization", "Bearer token-abc"))
            .and(body_partial_json(json!({"prompt": "What is phishing?", "context": []})))
            .respond_with(ResponseTemplate::new(200).set_body_json(generate_body("Phishing is...")))
            .expect(1)
            .mount(&server)
            .await;

        let reply = api(&server, signed_in())
            .generate_reply("What is phishing?", &[])
            .await
            .unwrap();
        assert_eq!(reply, "Phishing is...");
    }

    #[tokio::test]
    async fn test_missing_token_omits_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(generate_body("ok")))
            .mount(&server)
            .await;

        let identity = Arc::new(LocalIdentityProvider::signed_in(Principal::new("uid-1"), None));
        api(&server, identity).generate_reply("hi", &[]).await.unwrap();

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_generate_empty_content_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": {"role": "assistant", "content": []}})),
            )
            .mount(&server)
            .await;

        let err = api(&server, signed_in())
            .generate_reply("hi", &[])
            .await
            .unwrap_err();
        assert!(err.is_generation(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_non_2xx_is_transport_error_with_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid or expired token"))
            .mount(&server)
            .await;

        let err = api(&server, signed_in())
            .generate_reply("hi", &[])
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        match err {
            SecuribotError::Transport { body, .. } => assert_eq!(body, "Invalid or expired token"),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_shape_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/getUserConvos"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = api(&server, signed_in()).list_conversations().await.unwrap_err();
        assert!(err.is_shape());
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_list_without_principal_issues_no_request() {
        let server = MockServer::start().await;
        let identity = Arc::new(LocalIdentityProvider::new());

        let result = api(&server, identity).list_conversations().await.unwrap();

        assert!(result.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_conversations_maps_summaries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/getUserConvos"))
            .and(body_partial_json(json!({"uid": "uid-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "conversations": [{"id": "c1", "title": "Phishing"}, {"conversationId": "c2", "title": "Wi-Fi"}]
            })))
            .mount(&server)
            .await;

        let list = api(&server, signed_in()).list_conversations().await.unwrap();
        assert_eq!(
            list,
            vec![
                ConversationSummary { id: "c1".into(), title: "Phishing".into() },
                ConversationSummary { id: "c2".into(), title: "Wi-Fi".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_load_requires_principal() {
        let server = MockServer::start().await;
        let err = api(&server, Arc::new(LocalIdentityProvider::new()))
            .load_conversation("c1")
            .await
            .unwrap_err();
        assert!(err.is_unauthenticated());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_conversation_field_is_shape_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/getFullConvo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let err = api(&server, signed_in()).load_conversation("c1").await.unwrap_err();
        assert!(err.is_shape());
    }

    #[tokio::test]
    async fn test_timeout_is_reported_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(generate_body("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = api(&server, signed_in())
            .with_timeout(Duration::from_millis(50))
            .generate_reply("hi", &[])
            .await
            .unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips_sender_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/currentConvo"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "success", "conversationId": "conv-9"})),
            )
            .mount(&server)
            .await;

        let client = api(&server, signed_in());
        let transcript = vec![
            Message::user("u-1", "What is phishing?"),
            Message::bot("b-1", "Phishing is..."),
        ];
        let saved = client.save_conversation(None, &transcript).await.unwrap();
        assert_eq!(saved.conversation_id, "conv-9");

        // Replay what the server received as the stored transcript.
        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["uid"], "uid-1");
        assert_eq!(body["conversationData"][0]["conversationId"], Value::Null);
        let stored = body["conversationData"][1]["conversation"].clone();

        Mock::given(method("POST"))
            .and(path("/api/getFullConvo"))
            .and(body_partial_json(json!({"uid": "uid-1", "conversationId": "conv-9"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"conversation": stored})))
            .mount(&server)
            .await;

        let loaded = client.load_conversation("conv-9").await.unwrap();
        let pairs: Vec<(Sender, &str)> = loaded.iter().map(|m| (m.sender, m.text.as_str())).collect();
        assert_eq!(
            pairs,
            vec![(Sender::User, "What is phishing?"), (Sender::Bot, "Phishing is...")]
        );
        assert!(loaded[0].timestamp <= loaded[1].timestamp);
        assert_ne!(loaded[0].id, loaded[1].id);
        assert!(loaded[0].id.starts_with("conv-9-msg-0-"));
    }
}
