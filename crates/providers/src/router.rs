//! Provider router: selects the LLM provider named in the config.

use std::collections::HashMap;
use std::sync::Arc;

use clickmon_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;

/// Holds every configured provider, keyed by name.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build providers from configuration.
///
/// The default provider is always registered, falling back to its well-known
/// base URL and the top-level API key when it has no `[providers.*]` entry.
pub fn build_from_config(config: &clickmon_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
    }

    if router.get(&config.default_provider).is_none() {
        let api_key = config.api_key.clone().unwrap_or_default();
        let base_url = default_base_url(&config.default_provider);
        router.register(
            config.default_provider.clone(),
            Arc::new(OpenAiCompatProvider::new(
                &config.default_provider,
                &base_url,
                &api_key,
            )),
        );
    }

    router
}

/// Resolve the model for the default provider: a per-provider
/// `default_model` wins over the top-level one.
pub fn default_model(config: &clickmon_config::AppConfig) -> String {
    config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone())
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "anthropic" => "https://api.anthropic.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
