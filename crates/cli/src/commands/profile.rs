//! `rapport profile`: show what the model has inferred about the user.

use super::{load_config, open_stores};

pub async fn run(user: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(user)?;
    let stores = open_stores(&config).await?;
    let user_id = &config.chat.user_id;

    let Some(profile) = stores.profiles.get(user_id).await? else {
        println!("  No profile for '{user_id}' yet. Chat a little first.");
        return Ok(());
    };

    println!("Profile: {user_id}");
    println!("==========={}\n", "=".repeat(user_id.chars().count()));
    println!("  Updated:      {}", profile.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Recent chat:  {}", profile.chat_history_summary);
    println!("  Personality:  {}", profile.personality_summary);
    println!("  Worldview:    {}", profile.worldview_summary);

    Ok(())
}
