//! `rapport chat`: interactive or single-message chat mode.

use rapport_config::AppConfig;
use rapport_core::event::{DomainEvent, EventBus};
use rapport_pipeline::{ConversationPipeline, ProfileRefresh};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use super::{load_config, open_stores};
use crate::view::TerminalView;

pub async fn run(user: Option<&str>, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(user)?;

    let client = match rapport_providers::build_from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!();
            eprintln!("  ERROR: {e}");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    DASHSCOPE_API_KEY = 'sk-...'   (default provider)");
            eprintln!("    OPENAI_API_KEY    = 'sk-...'   (with provider = \"openai\")");
            eprintln!("    RAPPORT_API_KEY   = '...'      (generic)");
            eprintln!();
            eprintln!("  Or add it to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            return Err("No usable completion service. See above for setup instructions.".into());
        }
    };

    let stores = open_stores(&config).await?;
    let user_id = config.chat.user_id.clone();
    let interactive = message.is_none();

    let pipeline = ConversationPipeline::new(Arc::new(client), stores.chat, stores.profiles, &config.model)
        .with_history_window(config.chat.history_window)
        .with_view(Arc::new(TerminalView::new(!interactive)));
    spawn_failure_reporter(pipeline.event_bus());

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let exchange = pipeline.submit_user_message(&user_id, &msg).await;
        eprint!("\r              \r");
        if let Some(exchange) = exchange? {
            exchange.refresh.wait().await;
        }
        return Ok(());
    }

    println!();
    println!("  Rapport: Interactive Mode");
    println!();
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", config.model);
    println!("  User:      {user_id}");
    println!("  Store:     {}", config.store.backend);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    if let Err(e) = pipeline.load_recent(&user_id, config.chat.history_window).await {
        eprintln!("  [Error] could not load history: {e}");
    }

    let mut pending: Vec<ProfileRefresh> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input == "exit" || input == "quit" {
            break;
        }

        if !input.is_empty() {
            eprint!("  ...");
            let result = pipeline.submit_user_message(&user_id, input).await;
            eprint!("\r     \r");
            match result {
                Ok(Some(exchange)) => pending.push(exchange.refresh),
                Ok(None) => {}
                Err(e) => {
                    eprintln!("  [Error] {e}");
                    println!();
                }
            }
            pending.retain(|refresh| !refresh.is_finished());
        }

        prompt()?;
    }

    if !pending.is_empty() {
        eprintln!("  Saving profile...");
        for refresh in pending {
            refresh.wait().await;
        }
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

/// Surface background refresh failures that would otherwise only reach the log.
fn spawn_failure_reporter(event_bus: &EventBus) {
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let DomainEvent::ProfileRefreshFailed { error_message, .. } = event.as_ref() {
                        eprintln!("  [Profile] refresh failed: {error_message}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
