//! Infrastructure layer for Securibot: HTTP API client, identity backend,
//! configuration and credential files.

pub mod config_service;
pub mod credential_storage;
pub mod dto;
pub mod http_chat_api;
pub mod local_identity;
pub mod paths;

pub use crate::config_service::ConfigService;
pub use crate::credential_storage::CredentialStorage;
pub use crate::http_chat_api::HttpChatApi;
pub use crate::local_identity::LocalIdentityProvider;
pub use crate::paths::SecuribotPaths;
