use anyhow::{Result, bail};
use colored::Colorize;
use securibot_application::Persistence;

use crate::app::App;
use crate::render;

/// Sends one question in a fresh conversation and prints the reply.
pub async fn run(app: &App, text: &str) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        bail!("Nothing to ask");
    }

    let session = app.session();
    let cancel = tokio_util::sync::CancellationToken::new();
    let listener = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            listener.cancel();
        }
    });

    let result = session.send(text, &cancel).await;
    ctrl_c.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            render::notify_error(&err);
            return Err(err.into());
        }
    };

    println!("{}", outcome.reply.text);
    match outcome.persistence {
        Persistence::Saved {
            conversation_id, ..
        } => eprintln!(
            "{}",
            format!("Saved as conversation {conversation_id}").bright_black()
        ),
        Persistence::Failed(err) => eprintln!(
            "{} {}",
            "Error Saving Chat:".red().bold(),
            format!("{err}. Your messages are not persisted.").red()
        ),
    }
    Ok(())
}
