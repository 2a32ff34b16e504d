//! Rapport CLI, the main entry point.
//!
//! Commands:
//! - `onboard`  Write the default config
//! - `chat`     Interactive chat or single-message mode
//! - `history`  Print recent turns
//! - `profile`  Print the derived user profile
//! - `doctor`   Check config, storage and the completion service

use clap::{Parser, Subcommand};

mod commands;
mod view;

#[derive(Parser)]
#[command(
    name = "rapport",
    about = "Rapport: a chat companion that keeps a running profile of its user",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Act as this user instead of chat.user_id from the config
    #[arg(short, long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config directory and a default config file
    Onboard,

    /// Chat with the model
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show the most recent turns, oldest first
    History {
        /// How many turns to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Show the stored profile
    Profile,

    /// Diagnose configuration, storage and connectivity
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let user = cli.user.as_deref();
    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat { message } => commands::chat::run(user, message).await?,
        Commands::History { limit } => commands::history::run(user, limit).await?,
        Commands::Profile => commands::profile::run(user).await?,
        Commands::Doctor => commands::doctor::run(user).await?,
    }

    Ok(())
}
