//! OpenAI-compatible completion client.
//!
//! Works with: DashScope (compatible mode), OpenAI, OpenRouter, Ollama, vLLM,
//! DeepSeek, and any endpoint exposing `/chat/completions`.
//!
//! Every call is a single non-streaming round trip: the prompt goes out as
//! one user message and the first choice's content comes back.

use async_trait::async_trait;
use rapport_core::completion::CompletionClient;
use rapport_core::error::CompletionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// An OpenAI-compatible completion client.
pub struct OpenAiCompatClient {
    name: String,
    base_url: String,
    api_key: String,
    temperature: f32,
    timeout: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiCompatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatClient")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiCompatClient {
    /// Create a new OpenAI-compatible client.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            temperature: 0.7,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            client: reqwest::Client::new(),
        }
    }

    /// Create a DashScope client using its OpenAI-compatible mode.
    pub fn dashscope(api_key: impl Into<String>) -> Self {
        Self::new(
            "dashscope",
            "https://dashscope.aliyuncs.com/compatible-mode/v1",
            api_key,
        )
    }

    /// Create an OpenAI client (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an OpenRouter client (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Create an Ollama client (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    /// Set the sampling temperature sent with every request.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the transport timeout applied to every request.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(&self, model: &str, prompt: &str) -> ApiRequest {
        ApiRequest {
            model: model.to_string(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: Some(prompt.to_string()),
            }],
            temperature: self.temperature,
            stream: false,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<Option<String>, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(model, prompt);

        debug!(client = %self.name, model = %model, prompt_chars = prompt.chars().count(), "Sending completion request");
        trace!(prompt = %prompt, "Completion prompt");

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(CompletionError::RateLimited);
        }

        if status == 401 || status == 403 {
            return Err(CompletionError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Completion service returned error");
            return Err(CompletionError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        if let Some(usage) = &api_response.usage {
            debug!(
                model = %api_response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Completion finished"
            );
        }

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::MalformedResponse("No choices in response".into()))?;

        Ok(choice.message.content)
    }

    async fn health_check(&self) -> std::result::Result<bool, CompletionError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn fixed_response(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/chat/completions",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        serve(app).await
    }

    #[test]
    fn dashscope_constructor() {
        let client = OpenAiCompatClient::dashscope("sk-test");
        assert_eq!(client.name(), "dashscope");
        assert!(client.base_url().contains("dashscope.aliyuncs.com"));
    }

    #[test]
    fn ollama_constructor() {
        let client = OpenAiCompatClient::ollama(None);
        assert_eq!(client.name(), "ollama");
        assert!(client.base_url().contains("localhost:11434"));
    }

    #[test]
    fn trailing_slash_trimmed() {
        let client = OpenAiCompatClient::new("custom", "http://localhost:9000/v1/", "k");
        assert_eq!(client.base_url(), "http://localhost:9000/v1");
    }

    #[test]
    fn request_body_wraps_prompt_as_user_message() {
        let client = OpenAiCompatClient::openai("sk-test").with_temperature(0.2);
        let body = serde_json::to_value(client.request_body("qwen-plus", "hello")).unwrap();
        assert_eq!(body["model"], "qwen-plus");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["stream"], false);
    }

    #[tokio::test]
    async fn complete_returns_first_choice_and_sends_key() {
        let app = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap, Json(req): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let prompt = req["messages"][0]["content"].as_str().unwrap_or_default().to_string();
                Json(json!({
                    "model": req["model"],
                    "choices": [{ "message": { "role": "assistant", "content": format!("{auth}|{prompt}") } }],
                    "usage": { "prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7 }
                }))
            }),
        );
        let base = serve(app).await;

        let client = OpenAiCompatClient::new("stub", base, "sk-stub");
        let out = client.complete("qwen-plus", "what now?").await.unwrap();
        assert_eq!(out.as_deref(), Some("Bearer sk-stub|what now?"));
    }

    #[tokio::test]
    async fn null_content_is_none() {
        let base = fixed_response(
            StatusCode::OK,
            json!({ "model": "m", "choices": [{ "message": { "role": "assistant", "content": null } }] }),
        )
        .await;

        let client = OpenAiCompatClient::new("stub", base, "k");
        assert_eq!(client.complete("m", "p").await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_choices_is_malformed() {
        let base = fixed_response(StatusCode::OK, json!({ "model": "m", "choices": [] })).await;

        let client = OpenAiCompatClient::new("stub", base, "k");
        let err = client.complete("m", "p").await.unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_failure() {
        let base = fixed_response(StatusCode::UNAUTHORIZED, json!({ "error": "bad key" })).await;

        let client = OpenAiCompatClient::new("stub", base, "wrong");
        let err = client.complete("m", "p").await.unwrap_err();
        assert!(matches!(err, CompletionError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn rate_limit_and_server_errors() {
        let base = fixed_response(StatusCode::TOO_MANY_REQUESTS, json!({})).await;
        let client = OpenAiCompatClient::new("stub", base, "k");
        assert!(matches!(
            client.complete("m", "p").await.unwrap_err(),
            CompletionError::RateLimited
        ));

        let base = fixed_response(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "boom" })).await;
        let client = OpenAiCompatClient::new("stub", base, "k");
        match client.complete("m", "p").await.unwrap_err() {
            CompletionError::Api { status_code, message } => {
                assert_eq!(status_code, 500);
                assert!(message.contains("boom"));
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OpenAiCompatClient::new("stub", format!("http://{addr}"), "k").with_timeout(5);
        let err = client.complete("m", "p").await.unwrap_err();
        assert!(matches!(err, CompletionError::Network(_)));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let client = OpenAiCompatClient::dashscope("sk-very-secret").with_timeout(30);
        let printed = format!("{client:?}");
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("sk-very-secret"));
        assert_eq!(client.timeout(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn configured_timeout_is_enforced() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "choices": [] }))
            }),
        );
        let base = serve(app).await;

        let client = OpenAiCompatClient::new("stub", base, "k").with_timeout(1);
        let err = client.complete("m", "p").await.unwrap_err();
        assert!(matches!(err, CompletionError::Network(_)));
    }

    #[tokio::test]
    async fn health_check_reads_models_status() {
        let app = Router::new().route("/models", get(|| async { Json(json!({ "data": [] })) }));
        let base = serve(app).await;
        let client = OpenAiCompatClient::new("stub", base, "k");
        assert!(client.health_check().await.unwrap());

        let base = serve(Router::new().route(
            "/models",
            get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad key" }))) }),
        ))
        .await;
        let client = OpenAiCompatClient::new("stub", base, "wrong");
        assert!(!client.health_check().await.unwrap());
    }
}
