//! Completion client implementations for Rapport.
//!
//! All clients implement the `rapport_core::CompletionClient` trait.
//! [`build_from_config`] picks the endpoint named in the configuration.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatClient;

use rapport_config::AppConfig;
use rapport_core::error::CompletionError;
use tracing::info;

/// Build the configured completion client.
///
/// `api_url` wins over the provider's well-known base URL; a provider with
/// neither is rejected instead of guessing an endpoint.
pub fn build_from_config(config: &AppConfig) -> Result<OpenAiCompatClient, CompletionError> {
    let base_url = match &config.api_url {
        Some(url) => url.clone(),
        None => default_base_url(&config.provider).ok_or_else(|| {
            CompletionError::NotConfigured(format!(
                "unknown provider '{}' and no api_url set",
                config.provider
            ))
        })?,
    };

    let api_key = match (&config.api_key, config.provider.as_str()) {
        (Some(key), _) => key.clone(),
        (None, "ollama" | "vllm" | "llamacpp") => "local".into(),
        (None, name) => {
            return Err(CompletionError::NotConfigured(format!(
                "no API key configured for provider '{name}'"
            )));
        }
    };

    info!(provider = %config.provider, base_url = %base_url, "Completion client configured");

    Ok(OpenAiCompatClient::new(&config.provider, base_url, api_key)
        .with_temperature(config.temperature)
        .with_timeout(config.request_timeout_secs))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "dashscope" => "https://dashscope.aliyuncs.com/compatible-mode/v1",
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "ollama" => "http://localhost:11434/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapport_core::CompletionClient;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("dashscope").unwrap().contains("dashscope"));
        assert!(default_base_url("openai").unwrap().contains("api.openai.com"));
        assert!(default_base_url("ollama").unwrap().contains("localhost:11434"));
        assert!(default_base_url("mystery").is_none());
    }

    #[test]
    fn build_from_default_config_with_key() {
        let config = AppConfig {
            api_key: Some("sk-test".into()),
            ..AppConfig::default()
        };
        let client = build_from_config(&config).unwrap();
        assert_eq!(client.name(), "dashscope");
        assert!(client.base_url().contains("compatible-mode"));
    }

    #[test]
    fn missing_key_is_rejected_for_hosted_provider() {
        let err = build_from_config(&AppConfig::default()).unwrap_err();
        assert!(matches!(err, CompletionError::NotConfigured(_)));
    }

    #[test]
    fn local_provider_needs_no_key() {
        let config = AppConfig {
            provider: "ollama".into(),
            ..AppConfig::default()
        };
        let client = build_from_config(&config).unwrap();
        assert_eq!(client.name(), "ollama");
    }

    #[test]
    fn api_url_overrides_unknown_provider() {
        let config = AppConfig {
            provider: "in-house".into(),
            api_url: Some("http://llm.internal:9000/v1/".into()),
            api_key: Some("k".into()),
            ..AppConfig::default()
        };
        let client = build_from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://llm.internal:9000/v1");
    }

    #[test]
    fn unknown_provider_without_url_is_rejected() {
        let config = AppConfig {
            provider: "in-house".into(),
            api_key: Some("k".into()),
            ..AppConfig::default()
        };
        assert!(build_from_config(&config).is_err());
    }
}
