//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, Groq and any
//! endpoint exposing `/chat/completions`. Only non-streaming completions are
//! used: a comment reply is generated in one shot.

use async_trait::async_trait;
use clickmon_core::error::ProviderError;
use clickmon_core::message::{Message, Role};
use clickmon_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create an OpenRouter provider (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                },
                content: Some(m.content.clone()),
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    fn parse_response(api_response: ApiResponse) -> Result<ProviderResponse, ProviderError> {
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            usage,
            model: api_response.model,
        })
    }
}

#[async_trait]
impl clickmon_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        Self::parse_response(api_response)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
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
