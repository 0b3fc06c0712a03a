//! Provider trait: the abstraction over LLM backends.
//!
//! A Provider knows how to send a short conversation to an LLM and get a
//! complete response back. The answer generator is its only caller; streaming
//! and tool use are not needed for one-shot comment replies.

use async_trait::async_trait;
use crate::error::ProviderError;
use crate::message::Message;
use serde::{Deserialize, Serialize};

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "anthropic/claude-sonnet-4", "gpt-4o")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The answer generator calls
/// `complete()` without knowing which backend is configured.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter", "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_request_defaults_from_json() {
        let req: ProviderRequest =
            serde_json::from_str(r#"{"model":"gpt-4o","messages":[]}"#).unwrap();
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn max_tokens_skipped_when_absent() {
        let req = ProviderRequest {
            model: "gpt-4o".into(),
            messages: vec![Message::user("hi")],
            temperature: default_temperature(),
            max_tokens: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("max_tokens"));
    }
}
