//! `rapport doctor`: diagnose setup problems.

use rapport_config::AppConfig;
use rapport_core::completion::CompletionClient;

use super::{load_config, open_stores};

pub async fn run(user: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Rapport Doctor: System Diagnostics");
    println!("==================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  [warn] No config file, using defaults. Run `rapport onboard`.");
        issues += 1;
    }

    let config = match load_config(user) {
        Ok(config) => {
            println!("  [ok]   Config valid (provider {}, model {})", config.provider, config.model);
            config
        }
        Err(e) => {
            println!("  [fail] {e}");
            println!("\n  1 issue found. Fix the config and re-run.");
            return Ok(());
        }
    };

    match open_stores(&config).await {
        Ok(stores) => {
            let turns = stores.chat.count(&config.chat.user_id).await?;
            println!("  [ok]   {} store opened ({turns} turns for '{}')", config.store.backend, config.chat.user_id);
        }
        Err(e) => {
            println!("  [fail] {e}");
            issues += 1;
        }
    }

    if !config.has_api_key() {
        println!("  [warn] No API key set; only local providers will work");
    }

    match rapport_providers::build_from_config(&config) {
        Ok(client) => match client.health_check().await {
            Ok(true) => println!("  [ok]   Completion service reachable at {}", client.base_url()),
            Ok(false) => {
                println!("  [fail] Completion service at {} rejected the request", client.base_url());
                issues += 1;
            }
            Err(e) => {
                println!("  [fail] Completion service unreachable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  [fail] {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
