use anyhow::Result;
use colored::Colorize;
use securibot_core::{IdentityProvider, SecuribotError};
use tokio_util::sync::CancellationToken;

use crate::app::App;
use crate::render;

/// Prints the signed-in user's conversations.
pub async fn list(app: &App) -> Result<()> {
    if app.identity.current_principal().is_none() {
        render::notify_error(&SecuribotError::Unauthenticated);
        return Ok(());
    }

    let conversations = match app.history().list().await {
        Ok(conversations) => conversations,
        Err(err) => {
            render::notify_error(&err);
            return Ok(());
        }
    };

    if conversations.is_empty() {
        println!("{}", "No conversations yet.".bright_black());
        return Ok(());
    }

    println!("{}", "Conversations:".bold());
    for summary in conversations {
        println!("  {}  {}", summary.id.bright_cyan(), summary.title);
    }
    Ok(())
}

/// Loads a conversation and prints its transcript.
pub async fn show(app: &App, conversation_id: &str) -> Result<()> {
    let session = app.session();
    let cancel = CancellationToken::new();
    match session.load(conversation_id, &cancel).await {
        Ok(()) => {
            let conversation = session.snapshot().conversation();
            if conversation.messages.is_empty() {
                println!("{}", "This conversation has no messages.".bright_black());
            }
            render::print_transcript(&conversation.messages);
            Ok(())
        }
        Err(err) => {
            render::notify_error(&err);
            Err(err.into())
        }
    }
}
