use anyhow::{Context, Result};
use clap::{Args, Parser};
use colored::Colorize;
use securibot_core::Principal;
use securibot_core::config::CredentialsConfig;

use crate::app::App;

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LoginArgs {
    #[arg(long)]
    pub uid: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    /// Bearer token sent with every request
    #[arg(long)]
    pub token: Option<String>,
}

/// `/login` as typed inside the chat loop.
#[derive(Parser, Debug)]
#[command(name = "/login", no_binary_name = true)]
struct ReplLogin {
    #[command(flatten)]
    args: LoginArgs,
}

impl LoginArgs {
    /// Parses the arguments following `/login`.
    pub fn parse_repl(argument: &str) -> Result<Self, clap::Error> {
        ReplLogin::try_parse_from(argument.split_whitespace()).map(|repl| repl.args)
    }
}

/// Stores the identity and token used for subsequent requests.
pub fn login(app: &App, args: LoginArgs) -> Result<()> {
    let credentials = CredentialsConfig {
        uid: args.uid.clone(),
        email: args.email.clone(),
        display_name: args.name.clone(),
        id_token: args.token.clone(),
    };
    app.credentials
        .save(&credentials)
        .with_context(|| format!("Failed to write {}", app.credentials.path().display()))?;

    let principal = Principal {
        uid: args.uid,
        email: args.email,
        display_name: args.name,
    };
    app.identity.sign_in(principal, args.token);

    tracing::info!(path = %app.credentials.path().display(), "[Login] Credentials saved");
    println!("{}", "Signed in.".bright_green());
    Ok(())
}

/// Forgets the stored identity. Sessions watching the identity are reset.
pub fn logout(app: &App) -> Result<()> {
    app.credentials
        .clear()
        .with_context(|| format!("Failed to remove {}", app.credentials.path().display()))?;
    app.identity.sign_out();
    println!("{}", "Signed out.".bright_green());
    Ok(())
}
