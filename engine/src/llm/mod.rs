//! LLM Provider Abstraction Layer
//!
//! This module provides a common interface for the model backends the tutor can
//! talk to (Ollama, OpenAI, Groq). The `LLMProvider` trait is the only thing the
//! tutoring engine depends on: a prompt plus sampling parameters in, completion
//! text out, or an `LLMError`.
//!
//! Every engine call makes at most one attempt; retries belong to the host.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tutor_sdk::errors::EngineError;

use crate::config::{GenerationConfig, LLMConfig};
use crate::secrets::SecretManager;

pub mod ollama;
pub mod openai;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Message sent to a chat-style completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// Sampling parameters for a single completion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Randomness; lower values favour the most likely completion
    pub temperature: f64,

    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

impl GenerationParams {
    pub fn new(temperature: f64, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

impl From<GenerationConfig> for GenerationParams {
    fn from(config: GenerationConfig) -> Self {
        Self::new(config.temperature, config.max_tokens)
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "ollama", "openai", "groq")
    fn name(&self) -> &str;

    /// Returns true if this is a local provider (e.g., Ollama)
    fn is_local(&self) -> bool;

    /// Generate a completion for a conversation
    ///
    /// # Returns
    /// * `Ok(String)` - The completion text
    /// * `Err(LLMError)` - If the request fails
    async fn generate(&self, messages: &[Message], params: GenerationParams) -> Result<String>;

    /// Complete a single prompt sent as one user message
    async fn complete(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        self.generate(&[Message::user(prompt)], params).await
    }

    /// Check if the provider is currently healthy and available
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Build the provider named by `config.default_provider`
///
/// Cloud providers need an API key; see [`SecretManager::api_key`].
pub fn provider_from_config(
    config: &LLMConfig,
    secrets: &SecretManager,
) -> std::result::Result<Arc<dyn LLMProvider>, EngineError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    match config.default_provider.as_str() {
        "ollama" => Ok(Arc::new(ollama::OllamaProvider::with_timeout(
            config.ollama.base_url.clone(),
            config.ollama.model.clone(),
            timeout,
        ))),
        "openai" => {
            let api_key = secrets.api_key("openai", &config.openai.api_key_env)?;
            Ok(Arc::new(openai::OpenAICompatibleProvider::new(
                "openai",
                config.openai.base_url.clone(),
                config.openai.model.clone(),
                api_key,
                timeout,
            )))
        }
        "groq" => {
            let api_key = secrets.api_key("groq", &config.groq.api_key_env)?;
            Ok(Arc::new(openai::OpenAICompatibleProvider::new(
                "groq",
                config.groq.base_url.clone(),
                config.groq.model.clone(),
                api_key,
                timeout,
            )))
        }
        other => Err(EngineError::Config(format!(
            "Unknown LLM provider '{}'",
            other
        ))),
    }
}

/// Locate a JSON object in model output.
///
/// Handles the formats models actually reply with:
/// 1. Raw JSON: the whole reply is the object
/// 2. Fenced JSON (with or without trailing text): ` ```json\n{...}\n``` `
/// 3. JSON embedded in prose: the first balanced `{...}`
pub fn extract_json_object(content: &str) -> Option<&str> {
    let trimmed = content.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    if let Some(inner) = extract_fenced_json(trimmed) {
        let inner = inner.trim();
        if inner.starts_with('{') {
            return Some(inner);
        }
    }

    let start = trimmed.find('{')?;
    extract_balanced_json(&trimmed[start..])
}

/// HTTP client with the given request timeout
///
/// Falls back to a client with reqwest's defaults when the builder fails,
/// in which case the timeout no longer applies.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(
                "Failed to build HTTP client with {:?} timeout, using defaults: {}",
                timeout,
                e
            );
            reqwest::Client::new()
        }
    }
}

/// Extract the body of the first markdown code fence in the text.
///
/// Works even when there is trailing prose after the closing ```.
/// Returns `None` if no fenced block is found.
fn extract_fenced_json(content: &str) -> Option<&str> {
    let fence_start = content.find("```")?;
    let after_opening = &content[fence_start + 3..];

    // Skip the language tag line (e.g. "json\n")
    let body_start_rel = after_opening.find('\n')? + 1;
    let body_start = fence_start + 3 + body_start_rel;

    let closing = content[body_start..].find("```")?;
    let body_end = body_start + closing;

    if body_start >= body_end {
        return None;
    }

    Some(&content[body_start..body_end])
}

/// Extract a balanced JSON object starting at position 0 of `s`.
///
/// Counts `{` / `}` depth, respecting string literals, to find the
/// matching close brace.
fn extract_balanced_json(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let user_msg = Message::user("Hello");
        assert_eq!(user_msg.role, MessageRole::User);
        assert_eq!(user_msg.content, "Hello");

        let system_msg = Message::system("You are a STEM tutor");
        assert_eq!(system_msg.role, MessageRole::System);
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
    }

    #[tokio::test]
    async fn test_http_client_enforces_timeout() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = http_client(Duration::from_millis(200));
        let err = client.get(server.uri()).send().await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_generation_params_from_config() {
        let params: GenerationParams = GenerationConfig {
            temperature: 0.4,
            max_tokens: 2000,
        }
        .into();
        assert_eq!(params, GenerationParams::new(0.4, 2000));
    }

    #[test]
    fn test_extract_raw_json() {
        let content = r#"  {"subject": "physics"}  "#;
        assert_eq!(extract_json_object(content), Some(r#"{"subject": "physics"}"#));
    }

    #[test]
    fn test_extract_fenced_json_with_trailing_text() {
        let content = "Here you go:\n```json\n{\"subject\": \"chemistry\"}\n```\nLet me know!";
        assert_eq!(
            extract_json_object(content),
            Some(r#"{"subject": "chemistry"}"#)
        );
    }

    #[test]
    fn test_extract_json_embedded_in_prose() {
        let content = r#"Sure! {"subject": "mathematics", "formulas": ["{a}"]} hope it helps"#;
        assert_eq!(
            extract_json_object(content),
            Some(r#"{"subject": "mathematics", "formulas": ["{a}"]}"#)
        );
    }

    #[test]
    fn test_extract_json_none() {
        assert_eq!(extract_json_object("no structure here"), None);
        assert_eq!(extract_json_object("{ unterminated"), None);
    }

    #[test]
    fn test_provider_from_config_ollama_needs_no_key() {
        let mut config = crate::config::Config::default().llm;
        config.default_provider = "ollama".to_string();

        let provider = provider_from_config(&config, &SecretManager::new("stem-tutor-test"))
            .unwrap();
        assert_eq!(provider.name(), "ollama");
        assert!(provider.is_local());
    }

    #[test]
    fn test_provider_from_config_groq_uses_env_key() {
        let mut config = crate::config::Config::default().llm;
        config.groq.api_key_env = "STEM_TUTOR_TEST_GROQ_KEY".to_string();
        std::env::set_var("STEM_TUTOR_TEST_GROQ_KEY", "gsk_test");

        let provider = provider_from_config(&config, &SecretManager::new("stem-tutor-test"))
            .unwrap();
        assert_eq!(provider.name(), "groq");
        assert!(!provider.is_local());

        std::env::remove_var("STEM_TUTOR_TEST_GROQ_KEY");
    }
}
