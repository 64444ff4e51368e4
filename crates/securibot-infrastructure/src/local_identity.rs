//! Local identity provider.
//!
//! Holds the signed-in principal and its bearer token in memory and publishes
//! every sign-in/sign-out through a watch channel.

use async_trait::async_trait;
use securibot_core::config::CredentialsConfig;
use securibot_core::{AuthSubscription, IdentityProvider, Principal};
use std::sync::{PoisonError, RwLock};
use tokio::sync::watch;

/// Identity backend driven by explicit sign-in/sign-out calls.
///
/// # Example
///
/// ```
/// use securibot_core::{IdentityProvider, Principal};
/// use securibot_infrastructure::LocalIdentityProvider;
///
/// let identity = LocalIdentityProvider::new();
/// assert!(identity.current_principal().is_none());
///
/// identity.sign_in(Principal::new("uid-1"), Some("token".to_string()));
/// assert_eq!(identity.current_principal().unwrap().uid, "uid-1");
/// ```
pub struct LocalIdentityProvider {
    principal: watch::Sender<Option<Principal>>,
    token: RwLock<Option<String>>,
}

impl LocalIdentityProvider {
    /// Creates a provider with nobody signed in.
    pub fn new() -> Self {
        let (principal, _) = watch::channel(None);
        Self {
            principal,
            token: RwLock::new(None),
        }
    }

    /// Creates a provider that starts signed in.
    pub fn signed_in(principal: Principal, token: Option<String>) -> Self {
        let provider = Self::new();
        provider.sign_in(principal, token);
        provider
    }

    /// Creates a provider from stored credentials, signed out when `None`.
    pub fn from_credentials(credentials: Option<CredentialsConfig>) -> Self {
        match credentials {
            Some(creds) => Self::signed_in(
                Principal {
                    uid: creds.uid,
                    email: creds.email,
                    display_name: creds.display_name,
                },
                creds.id_token,
            ),
            None => Self::new(),
        }
    }

    /// Signs a principal in and notifies subscribers.
    pub fn sign_in(&self, principal: Principal, token: Option<String>) {
        tracing::info!(uid = %principal.uid, "Signed in");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
        self.principal.send_replace(Some(principal));
    }

    /// Signs out and notifies subscribers.
    pub fn sign_out(&self) {
        tracing::info!("Signed out");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.principal.send_replace(None);
    }

    /// Replaces the bearer token without changing the principal.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn current_principal(&self) -> Option<Principal> {
        self.principal.borrow().clone()
    }

    async fn current_token(&self) -> Option<String> {
        if self.principal.borrow().is_none() {
            return None;
        }
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.principal.subscribe())
    }
}
