pub mod chat;
pub mod doctor;
pub mod history;
pub mod onboard;
pub mod profile;

use rapport_config::AppConfig;
use rapport_store::Stores;

/// Load the config and apply the `--user` override.
pub fn load_config(user: Option<&str>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(user) = user {
        config.chat.user_id = user.to_string();
    }
    Ok(config)
}

pub async fn open_stores(config: &AppConfig) -> Result<Stores, Box<dyn std::error::Error>> {
    let stores = rapport_store::open_from_config(&config.store)
        .await
        .map_err(|e| format!("Failed to open {} store: {e}", config.store.backend))?;
    Ok(stores)
}
