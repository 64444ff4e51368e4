//! Identity provider abstraction.
//!
//! The identity provider is an injected capability: the session controller and
//! the API client receive it explicitly instead of reading ambient auth state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// The authenticated identity of the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Principal {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }
}

/// Source of the signed-in principal and its bearer token.
///
/// # Implementation Notes
///
/// - `current_token` fails soft: any refresh failure is reported as `None`,
///   and callers send the request unauthenticated.
/// - `subscribe` must yield the current state first, then every later
///   sign-in/sign-out transition.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Best-effort read of the locally cached signed-in identity.
    fn current_principal(&self) -> Option<Principal>;

    /// Returns a bearer token for the current principal, if one can be obtained.
    async fn current_token(&self) -> Option<String>;

    /// Subscribes to auth-state changes. Dropping the subscription unsubscribes.
    fn subscribe(&self) -> AuthSubscription;
}

/// A stream of auth-state changes backed by a watch channel.
///
/// The first call to [`AuthSubscription::next`] returns the state at the time
/// of subscription. Later calls wait for a change. Consecutive identical states
/// may be delivered and must be handled idempotently.
pub struct AuthSubscription {
    receiver: watch::Receiver<Option<Principal>>,
    delivered_initial: bool,
}

impl AuthSubscription {
    pub fn new(receiver: watch::Receiver<Option<Principal>>) -> Self {
        Self {
            receiver,
            delivered_initial: false,
        }
    }

    /// Waits for the next auth state.
    ///
    /// Returns `None` once the provider has been dropped.
    pub async fn next(&mut self) -> Option<Option<Principal>> {
        if !self.delivered_initial {
            self.delivered_initial = true;
            return Some(self.receiver.borrow_and_update().clone());
        }
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// The latest known state without waiting.
    pub fn latest(&self) -> Option<Principal> {
        self.receiver.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscription_yields_initial_state_then_changes() {
        let (tx, rx) = watch::channel(None);
        let mut sub = AuthSubscription::new(rx);

        assert_eq!(sub.next().await, Some(None));

        tx.send_replace(Some(Principal::new("u1")));
        assert_eq!(sub.next().await, Some(Some(Principal::new("u1"))));

        drop(tx);
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_latest_does_not_consume() {
        let (_tx, rx) = watch::channel(Some(Principal::new("u2")));
        let mut sub = AuthSubscription::new(rx);
        assert_eq!(sub.latest(), Some(Principal::new("u2")));
        assert_eq!(sub.next().await, Some(Some(Principal::new("u2"))));
    }
}
