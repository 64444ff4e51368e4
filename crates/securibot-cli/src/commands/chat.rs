use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use securibot_application::{ConversationSession, Persistence};
use securibot_core::prompts::suggested_prompts;
use tokio_util::sync::CancellationToken;

use super::login::{self, LoginArgs};
use crate::app::App;
use crate::render;

/// What the loop does after a line has been handled.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

const COMMANDS: [&str; 8] = [
    "/new", "/open", "/history", "/suggest", "/whoami", "/login", "/logout", "/quit",
];

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct ChatHelper {
    commands: Vec<String>,
}

impl ChatHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ChatHelper {}

/// Runs the interactive chat loop.
///
/// Ctrl-C while a request is pending cancels it; at the prompt it only prints
/// a hint.
pub async fn run(app: &App, conversation_id: Option<String>) -> Result<()> {
    let session = app.session();
    let watcher = session.spawn_identity_watch();

    println!("{}", "=== Securibot ===".bright_magenta().bold());
    println!(
        "{}",
        "Type a question, /new for a new chat, /open <id> to resume, or /quit to exit.".bright_black()
    );
    println!();

    match conversation_id {
        Some(id) => open(&session, &id).await,
        None => render::print_suggestions(session.suggestions()),
    }

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ChatHelper::new()));

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        if dispatch(app, &session, trimmed).await? == Flow::Quit {
            break;
        }
    }

    watcher.abort();
    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

async fn dispatch(app: &App, session: &Arc<ConversationSession>, line: &str) -> Result<Flow> {
    let (command, argument) = match line.split_once(' ') {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };

    match command {
        "/quit" | "/exit" | "quit" | "exit" => return Ok(Flow::Quit),
        "/new" => {
            session.new_conversation();
            render::print_suggestions(session.suggestions());
        }
        "/open" if !argument.is_empty() => open(session, argument).await,
        "/open" => println!("{}", "Usage: /open <conversation id>".yellow()),
        "/history" => super::history::list(app).await?,
        "/suggest" => match argument
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| suggested_prompts().get(i))
        {
            Some(prompt) => send(session, prompt).await,
            None => render::print_suggestions(suggested_prompts()),
        },
        "/whoami" => whoami(app),
        "/login" => match LoginArgs::parse_repl(argument) {
            Ok(args) => {
                if let Err(err) = login::login(app, args) {
                    eprintln!("{}", format!("{err:#}").red());
                }
            }
            Err(_) => println!(
                "{}",
                "Usage: /login --uid <UID> [--token <TOKEN>] [--email <EMAIL>] [--name <NAME>]"
                    .yellow()
            ),
        },
        // Signing out resets the session through its identity watch.
        "/logout" => {
            if let Err(err) = login::logout(app) {
                eprintln!("{}", format!("{err:#}").red());
            }
        }
        _ if command.starts_with('/') => {
            println!("{}", format!("Unknown command: {command}").bright_black());
        }
        _ => send(session, line).await,
    }
    Ok(Flow::Continue)
}

async fn open(session: &Arc<ConversationSession>, conversation_id: &str) {
    let cancel = cancel_on_ctrl_c();
    match session.load(conversation_id, &cancel).await {
        Ok(()) => {
            println!(
                "{}",
                format!("Resumed conversation {conversation_id}").bright_black()
            );
            render::print_transcript(&session.snapshot().messages);
        }
        Err(err) => {
            render::notify_error(&err);
            render::print_suggestions(session.suggestions());
        }
    }
    cancel.cancel();
}

async fn send(session: &Arc<ConversationSession>, text: &str) {
    println!("{}", "Thinking...".bright_black());
    let cancel = cancel_on_ctrl_c();

    match session.send(text, &cancel).await {
        Ok(outcome) => {
            render::print_message(&outcome.reply);
            match outcome.persistence {
                Persistence::Saved {
                    conversation_id,
                    newly_assigned: true,
                } => println!(
                    "{}",
                    format!("Saved as conversation {conversation_id}").bright_black()
                ),
                Persistence::Saved { .. } => {}
                Persistence::Failed(err) => {
                    eprintln!(
                        "{} {}",
                        "Error Saving Chat:".red().bold(),
                        format!("{err}. Your messages are not persisted.").red()
                    );
                }
            }
        }
        Err(err) => {
            if let Some(last) = session.snapshot().messages.last()
                && last.is_error
            {
                render::print_message(last);
            }
            render::notify_error(&err);
        }
    }
    cancel.cancel();
}

/// Returns a token cancelled by Ctrl-C. Cancel it when the request is done to
/// stop the listener.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let listener = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = listener.cancelled() => {}
            _ = tokio::signal::ctrl_c() => listener.cancel(),
        }
    });
    cancel
}

fn whoami(app: &App) {
    use securibot_core::IdentityProvider;

    match app.identity.current_principal() {
        Some(principal) => {
            let name = principal
                .display_name
                .or(principal.email)
                .unwrap_or_else(|| principal.uid.clone());
            println!("Signed in as {} ({})", name.bold(), principal.uid);
        }
        None => println!("{}", "Not signed in".yellow()),
    }
    println!("API: {}", app.config.api_base_url);
}
