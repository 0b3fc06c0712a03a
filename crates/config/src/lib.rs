//! Configuration loading, validation, and management for Clickmon.
//!
//! Loads configuration from `~/.clickmon/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.clickmon/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Task-tracking API settings
    #[serde(default)]
    pub clickup: ClickUpConfig,

    /// Comment monitor settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Assistant persona used when answering questions
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("clickup", &self.clickup)
            .field("monitor", &self.monitor)
            .field("assistant", &self.assistant)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for ClickUpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickUpConfig")
            .field("api_token", &redact(&self.api_token))
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ClickUpConfig {
    /// Personal API token, sent verbatim in the `Authorization` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default = "default_clickup_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_clickup_base_url() -> String {
    "https://api.clickup.com/api/v2".into()
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for ClickUpConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: default_clickup_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// What to do with a comment whose answer was the fallback message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// A posted fallback counts as answered; the comment is never retried.
    #[default]
    MarkProcessed,
    /// A posted fallback leaves the comment eligible for a later cycle.
    Retry,
}

/// What to do when monitoring is requested for a task that already has a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateSessionPolicy {
    /// Start another independent session.
    #[default]
    Allow,
    /// Refuse the request.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds to wait between poll cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Substring that addresses the assistant (case-sensitive)
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Upper bound on a single LLM call
    #[serde(default = "default_answer_timeout")]
    pub answer_timeout_secs: u64,

    /// Posted instead of an answer when the LLM call fails
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    #[serde(default)]
    pub fallback_policy: FallbackPolicy,

    #[serde(default)]
    pub duplicate_sessions: DuplicateSessionPolicy,
}

fn default_poll_interval() -> u64 {
    30
}
fn default_marker() -> String {
    "@AI".into()
}
fn default_answer_timeout() -> u64 {
    120
}
fn default_fallback_message() -> String {
    "Sorry, there was an error processing the question. Please try again.".into()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            marker: default_marker(),
            answer_timeout_secs: default_answer_timeout(),
            fallback_message: default_fallback_message(),
            fallback_policy: FallbackPolicy::default(),
            duplicate_sessions: DuplicateSessionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_role")]
    pub role: String,

    #[serde(default = "default_goal")]
    pub goal: String,

    #[serde(default = "default_backstory")]
    pub backstory: String,
}

fn default_role() -> String {
    "ClickUp Assistant".into()
}
fn default_goal() -> String {
    "Provide accurate answers about ClickUp tasks".into()
}
fn default_backstory() -> String {
    "I am an assistant specialized in analyzing and answering questions about ClickUp tasks".into()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            role: default_role(),
            goal: default_goal(),
            backstory: default_backstory(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Allowed CORS origins. `["*"]` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.clickmon/config.toml).
    ///
    /// Environment variables override file values:
    /// - `CLICKUP_API_TOKEN` for the task-tracking API
    /// - `CLICKMON_API_KEY`, then `OPENROUTER_API_KEY`, then `OPENAI_API_KEY`
    /// - `CLICKMON_PROVIDER`, `CLICKMON_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("CLICKUP_API_TOKEN") {
            self.clickup.api_token = Some(token);
        }

        if self.api_key.is_none() {
            self.api_key = get("CLICKMON_API_KEY")
                .or_else(|| get("OPENROUTER_API_KEY"))
                .or_else(|| get("OPENAI_API_KEY"));
        }

        if let Some(provider) = get("CLICKMON_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = get("CLICKMON_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".clickmon")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.monitor.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "monitor.poll_interval_secs must be at least 1".into(),
            ));
        }

        if self.monitor.answer_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "monitor.answer_timeout_secs must be at least 1".into(),
            ));
        }

        if self.clickup.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "clickup.request_timeout_secs must be at least 1".into(),
            ));
        }

        if self.monitor.marker.is_empty() {
            return Err(ConfigError::ValidationError(
                "monitor.marker must not be empty".into(),
            ));
        }

        if self.monitor.fallback_message.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "monitor.fallback_message must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if a ClickUp token is available (from config or environment).
    pub fn has_clickup_token(&self) -> bool {
        self.clickup.api_token.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            clickup: ClickUpConfig::default(),
            monitor: MonitorConfig::default(),
            assistant: AssistantConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
