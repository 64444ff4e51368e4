use std::sync::Arc;

use anyhow::{Context, Result};
use securibot_application::{ConversationHistory, ConversationSession};
use securibot_core::config::ClientConfig;
use securibot_core::{ChatApi, IdentityProvider};
use securibot_infrastructure::{CredentialStorage, HttpChatApi, LocalIdentityProvider};

/// Wired-up services shared by all commands.
pub struct App {
    pub config: ClientConfig,
    pub identity: Arc<LocalIdentityProvider>,
    pub api: Arc<dyn ChatApi>,
    pub credentials: CredentialStorage,
}

impl App {
    /// Loads credentials and builds the API client from `config`.
    ///
    /// `api_url` overrides the configured base URL.
    pub fn bootstrap(mut config: ClientConfig, api_url: Option<String>) -> Result<Self> {
        if let Some(url) = api_url {
            config.api_base_url = url;
        }

        let credentials = CredentialStorage::new().context("Failed to resolve credentials path")?;
        let stored = credentials
            .load_with_env()
            .with_context(|| format!("Failed to read {}", credentials.path().display()))?;

        let identity = Arc::new(LocalIdentityProvider::from_credentials(stored));
        let provider: Arc<dyn IdentityProvider> = identity.clone();
        let api: Arc<dyn ChatApi> = Arc::new(HttpChatApi::from_config(&config, provider));

        tracing::debug!(api_base_url = %config.api_base_url, "[Bootstrap] Client configured");

        Ok(Self {
            config,
            identity,
            api,
            credentials,
        })
    }

    pub fn session(&self) -> Arc<ConversationSession> {
        Arc::new(ConversationSession::new(
            self.api.clone(),
            self.identity.clone(),
        ))
    }

    pub fn history(&self) -> ConversationHistory {
        ConversationHistory::new(self.api.clone())
    }
}
