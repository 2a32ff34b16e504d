//! `rapport history`: print recent turns, oldest first.

use rapport_core::turn::Window;

use super::{load_config, open_stores};

pub async fn run(user: Option<&str>, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(user)?;
    let stores = open_stores(&config).await?;
    let user_id = &config.chat.user_id;

    let window = Window::from_recent(stores.chat.recent_turns(user_id, limit).await?);
    if window.is_empty() {
        println!("  No turns stored for '{user_id}'.");
        return Ok(());
    }

    let total = stores.chat.count(user_id).await?;
    println!("  Showing {} of {total} turns for '{user_id}'\n", window.len());
    for turn in window.turns() {
        println!(
            "  [{}] {:>7} > {}",
            turn.created_at.format("%Y-%m-%d %H:%M"),
            turn.speaker,
            turn.text
        );
    }

    Ok(())
}
