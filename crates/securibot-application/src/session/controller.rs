use std::sync::{Arc, Weak};

use securibot_core::{
    AuthSubscription, ChatApi, IdentityProvider, Message, MessageIdGenerator, Result,
    SecuribotError, prompts,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::state::{Persistence, SendOutcome, SessionPhase, SessionState};

/// Controller for a single chat screen.
///
/// `ConversationSession` is responsible for:
/// - Loading an existing conversation's transcript
/// - Appending user messages and requesting generated replies
/// - Persisting the transcript after each successful reply
/// - Discarding in-flight results after a reset or sign-out
///
/// State is published through a watch channel; every mutation is visible to
/// [`subscribe`](Self::subscribe) receivers.
pub struct ConversationSession {
    api: Arc<dyn ChatApi>,
    identity: Arc<dyn IdentityProvider>,
    ids: MessageIdGenerator,
    state: watch::Sender<SessionState>,
}

/// Clears `is_busy` when dropped, on every exit path of a send, including the
/// send future being dropped mid-flight. A placeholder still shown at that
/// point is removed.
struct BusyGuard<'a> {
    state: &'a watch::Sender<SessionState>,
    placeholder_id: String,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let placeholder_id = self.placeholder_id.as_str();
        self.state.send_modify(|s| {
            if s
                .messages
                .iter()
                .any(|m| m.is_loading && m.id == placeholder_id)
            {
                s.remove_message(placeholder_id);
            }
            s.is_busy = false;
        });
    }
}

/// Leaves the `Loading` phase when a load ends without a result, restoring the
/// phase it started from. Does nothing once the session has moved on.
struct LoadGuard<'a> {
    state: &'a watch::Sender<SessionState>,
    generation: u64,
    prior_phase: SessionPhase,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|s| {
            if s.generation != self.generation || s.phase != SessionPhase::Loading {
                return false;
            }
            s.phase = self.prior_phase;
            true
        });
    }
}

impl ConversationSession {
    /// Creates an empty session for a new conversation.
    pub fn new(api: Arc<dyn ChatApi>, identity: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(SessionState::new());
        Self {
            api,
            identity,
            ids: MessageIdGenerator::new(),
            state,
        }
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes for re-rendering.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Starter prompts, offered only while the conversation is empty.
    pub fn suggestions(&self) -> &'static [&'static str] {
        if self.state.borrow().phase == SessionPhase::Empty {
            prompts::suggested_prompts()
        } else {
            &[]
        }
    }

    /// Resets to an empty, unsaved conversation.
    ///
    /// Results of operations still in flight are discarded when they complete.
    pub fn new_conversation(&self) {
        self.state.send_modify(SessionState::reset);
        tracing::debug!("Started new conversation");
    }

    /// Marks the session invalid after a sign-out.
    pub fn invalidate(&self) {
        self.state.send_modify(SessionState::reset);
        tracing::info!("Session invalidated");
    }

    /// Replaces the session with the transcript of `conversation_id`.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if nobody is signed in (caller should redirect to sign-in)
    /// - `Busy` if a send or another load is in flight
    /// - `Cancelled` if `cancel` fired; the previously shown conversation is
    ///   kept as it was
    /// - `SessionInvalidated` if the session was reset mid-flight
    /// - any API error; the session is reset to `Empty` and not retried
    pub async fn load(&self, conversation_id: &str, cancel: &CancellationToken) -> Result<()> {
        if self.identity.current_principal().is_none() {
            return Err(SecuribotError::Unauthenticated);
        }

        let mut already_loaded = false;
        let mut generation = 0;
        let mut prior_phase = SessionPhase::Empty;
        let acquired = self.state.send_if_modified(|s| {
            if s.phase == SessionPhase::Ready
                && !s.is_busy
                && s.conversation_id.as_deref() == Some(conversation_id)
            {
                already_loaded = true;
                return false;
            }
            if s.is_busy || s.phase == SessionPhase::Loading {
                return false;
            }
            prior_phase = s.phase;
            s.phase = SessionPhase::Loading;
            generation = s.generation;
            true
        });

        if already_loaded {
            tracing::debug!(conversation_id, "Conversation already loaded");
            return Ok(());
        }
        if !acquired {
            return Err(SecuribotError::Busy);
        }

        let _loading = LoadGuard {
            state: &self.state,
            generation,
            prior_phase,
        };

        tracing::debug!(conversation_id, "Loading conversation");

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(conversation_id, "Load cancelled");
                return Err(SecuribotError::Cancelled);
            }
            result = self.api.load_conversation(conversation_id) => result,
        };

        let mut current = false;
        let mut failure = None;
        self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            current = true;
            match fetched {
                Ok(messages) => {
                    s.messages = messages;
                    s.conversation_id = Some(conversation_id.to_string());
                    s.phase = SessionPhase::Ready;
                }
                Err(err) => {
                    s.messages.clear();
                    s.conversation_id = None;
                    s.phase = SessionPhase::Empty;
                    failure = Some(err);
                }
            }
            true
        });

        if let Some(err) = failure {
            tracing::warn!(conversation_id, error = %err, "Failed to load conversation");
            return Err(err);
        }
        if !current {
            return Err(SecuribotError::SessionInvalidated);
        }
        Ok(())
    }

    /// Sends a user message and appends the generated reply.
    ///
    /// On success the updated transcript is saved; a save failure is reported
    /// in [`SendOutcome::persistence`] and does not roll back the reply.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if nobody is signed in; state is untouched and no
    ///   request is made
    /// - `Busy` if a send or load is already in flight
    /// - `Cancelled` if `cancel` fired; the placeholder is removed
    /// - `SessionInvalidated` if the session was reset mid-flight
    /// - the reply error, after the placeholder has been replaced by an
    ///   error-flavored bot message
    pub async fn send(&self, text: &str, cancel: &CancellationToken) -> Result<SendOutcome> {
        if self.identity.current_principal().is_none() {
            return Err(SecuribotError::Unauthenticated);
        }
        if cancel.is_cancelled() {
            return Err(SecuribotError::Cancelled);
        }

        let placeholder_id = self.ids.next_id("bot-loading");
        let mut generation = 0;
        let acquired = self.state.send_if_modified(|s| {
            if s.is_busy || s.phase == SessionPhase::Loading {
                return false;
            }
            s.is_busy = true;
            generation = s.generation;
            true
        });
        if !acquired {
            return Err(SecuribotError::Busy);
        }
        let _busy = BusyGuard {
            state: &self.state,
            placeholder_id: placeholder_id.clone(),
        };

        let user_message = Message::user(self.ids.next_id("user"), text);
        self.state.send_modify(|s| {
            s.messages.push(user_message);
            s.phase = SessionPhase::Ready;
        });

        let mut context = Vec::new();
        self.state.send_modify(|s| {
            context = s.context();
            s.messages.push(Message::placeholder(placeholder_id.clone()));
        });

        tracing::debug!(context_len = context.len(), "Requesting reply");

        let generated = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SecuribotError::Cancelled),
            result = self.api.generate_reply(text, &context) => result,
        };

        if self.current_generation() != generation {
            return Err(SecuribotError::SessionInvalidated);
        }
        if cancel.is_cancelled() {
            return Err(SecuribotError::Cancelled);
        }

        let reply_text = match generated {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, "Error getting answer");
                let error_message =
                    Message::bot_error(self.ids.next_id("bot-error"), &err.to_string());
                self.replace_if_current(generation, &placeholder_id, error_message)?;
                return Err(err);
            }
        };

        let reply = Message::bot(self.ids.next_id("bot"), reply_text);
        self.replace_if_current(generation, &placeholder_id, reply.clone())?;

        if cancel.is_cancelled() {
            return Err(SecuribotError::Cancelled);
        }

        let (conversation_id, transcript) = {
            let s = self.state.borrow();
            (s.conversation_id.clone(), s.context())
        };

        let saved = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SecuribotError::Cancelled),
            result = self.api.save_conversation(conversation_id.as_deref(), &transcript) => result,
        };

        let persistence = match saved {
            Ok(saved) => {
                let mut newly_assigned = false;
                let mut current = false;
                self.state.send_if_modified(|s| {
                    if s.generation != generation {
                        return false;
                    }
                    current = true;
                    if s.conversation_id.is_none() {
                        s.conversation_id = Some(saved.conversation_id.clone());
                        newly_assigned = true;
                        return true;
                    }
                    false
                });
                if !current {
                    return Err(SecuribotError::SessionInvalidated);
                }
                if newly_assigned {
                    tracing::info!(conversation_id = %saved.conversation_id, "Conversation created");
                }
                Persistence::Saved {
                    conversation_id: saved.conversation_id,
                    newly_assigned,
                }
            }
            Err(_) if self.current_generation() != generation => {
                return Err(SecuribotError::SessionInvalidated);
            }
            Err(err) => {
                tracing::warn!(error = %err, "Error saving conversation, transcript is not persisted");
                Persistence::Failed(err)
            }
        };

        Ok(SendOutcome { reply, persistence })
    }

    /// Spawns a task that invalidates this session when the principal signs
    /// out or changes.
    ///
    /// The task holds only a weak reference and ends when the session or the
    /// identity provider is dropped.
    pub fn spawn_identity_watch(self: &Arc<Self>) -> JoinHandle<()> {
        let initial_uid = self.identity.current_principal().map(|p| p.uid);
        let subscription = self.identity.subscribe();
        let session = Arc::downgrade(self);
        tokio::spawn(watch_identity(session, subscription, initial_uid))
    }

    fn current_generation(&self) -> u64 {
        self.state.borrow().generation
    }

    fn replace_if_current(&self, generation: u64, id: &str, replacement: Message) -> Result<()> {
        let mut current = false;
        self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            current = true;
            s.replace_message(id, replacement)
        });
        if current {
            Ok(())
        } else {
            Err(SecuribotError::SessionInvalidated)
        }
    }
}

async fn watch_identity(
    session: Weak<ConversationSession>,
    mut subscription: AuthSubscription,
    mut last_uid: Option<String>,
) {
    while let Some(principal) = subscription.next().await {
        let Some(session) = session.upgrade() else {
            break;
        };
        let uid = principal.map(|p| p.uid);
        // Duplicate notifications carry the same uid and are ignored.
        if last_uid.is_some() && uid != last_uid {
            session.invalidate();
        }
        last_uid = uid;
    }
}
