use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use securibot_infrastructure::ConfigService;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod render;

use app::App;

#[derive(Parser)]
#[command(name = "securibot")]
#[command(about = "Securibot - ask cybersecurity questions from the terminal", long_about = None)]
struct Cli {
    /// Override the API base URL (e.g. http://127.0.0.1:5000/api)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat, optionally resuming a conversation
    Chat {
        /// Conversation id to resume
        #[arg(long)]
        id: Option<String>,
    },
    /// Ask a single question and print the reply
    Ask {
        /// The question to ask
        text: Vec<String>,
    },
    /// List your past conversations
    History,
    /// Print the transcript of a conversation
    Show {
        /// Conversation id
        id: String,
    },
    /// Print the suggested starter prompts
    Prompts,
    /// Store the identity used for requests
    Login(commands::login::LoginArgs),
    /// Forget the stored identity
    Logout,
}

/// Logs go to stderr so they never interleave with chat output.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("SECURIBOT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigService::new()
        .and_then(|service| service.get_config())
        .context("Failed to load configuration")?;
    init_tracing(&config.log_level);
    let app = App::bootstrap(config, cli.api_url)?;

    match cli.command {
        Commands::Chat { id } => commands::chat::run(&app, id).await?,
        Commands::Ask { text } => commands::ask::run(&app, &text.join(" ")).await?,
        Commands::History => commands::history::list(&app).await?,
        Commands::Show { id } => commands::history::show(&app, &id).await?,
        Commands::Prompts => commands::prompts::print(),
        Commands::Login(args) => commands::login::login(&app, args)?,
        Commands::Logout => commands::login::logout(&app)?,
    }

    Ok(())
}
