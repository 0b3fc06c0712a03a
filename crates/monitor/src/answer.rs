//! Answer generation: turns a question about a task into comment text.
//!
//! The LLM is an unreliable collaborator. Every failure (provider error,
//! timeout, empty output) is absorbed here and replaced by a fixed fallback
//! message, so the monitor always has something to post.

use std::sync::Arc;
use std::time::Duration;

use clickmon_core::error::ProviderError;
use clickmon_core::message::Message;
use clickmon_core::provider::{Provider, ProviderRequest};
use clickmon_core::task::Task;
use tracing::{debug, warn};

const DEFAULT_FALLBACK: &str =
    "Sorry, there was an error processing the question. Please try again.";

/// Who the assistant claims to be when answering.
#[derive(Debug, Clone)]
pub struct AssistantPersona {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl AssistantPersona {
    fn system_prompt(&self) -> String {
        format!(
            "You are {role}.\nYour goal: {goal}.\n{backstory}.\n\
             Answer in plain text suitable for a task comment.",
            role = self.role,
            goal = self.goal,
            backstory = self.backstory,
        )
    }
}

impl From<&clickmon_config::AssistantConfig> for AssistantPersona {
    fn from(config: &clickmon_config::AssistantConfig) -> Self {
        Self {
            role: config.role.clone(),
            goal: config.goal.clone(),
            backstory: config.backstory.clone(),
        }
    }
}

impl Default for AssistantPersona {
    fn default() -> Self {
        (&clickmon_config::AssistantConfig::default()).into()
    }
}

/// Whether the text came from the LLM or is the fallback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub outcome: AnswerOutcome,
}

impl Answer {
    pub fn is_fallback(&self) -> bool {
        self.outcome == AnswerOutcome::Fallback
    }
}

/// Builds bounded LLM requests for task questions and never fails.
pub struct AnswerGenerator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    persona: AssistantPersona,
    timeout: Duration,
    fallback_message: String,
}

impl AnswerGenerator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            persona: AssistantPersona::default(),
            timeout: Duration::from_secs(120),
            fallback_message: DEFAULT_FALLBACK.into(),
        }
    }

    /// Build a generator from the application config.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        config: &clickmon_config::AppConfig,
    ) -> Self {
        Self::new(provider, model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_persona((&config.assistant).into())
            .with_timeout(Duration::from_secs(config.monitor.answer_timeout_secs))
            .with_fallback_message(config.monitor.fallback_message.clone())
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_persona(mut self, persona: AssistantPersona) -> Self {
        self.persona = persona;
        self
    }

    /// Upper bound on a single provider call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn fallback_message(&self) -> &str {
        &self.fallback_message
    }

    /// The request sent to the provider for `question` about `task`.
    pub fn build_request(&self, task: &Task, question: &str) -> ProviderRequest {
        let prompt = format!(
            "Analyze the following question about a ClickUp task and provide a useful answer.\n\
             Question: {question}\n\
             Task context: {context}\n\
             Expected output: A detailed answer to the question about the task.",
            context = task.context_line(),
        );

        ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(self.persona.system_prompt()),
                Message::user(prompt),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Ask the provider; on any failure return the fallback message.
    pub async fn generate_answer(&self, task: &Task, question: &str) -> Answer {
        let request = self.build_request(task, question);

        match self.ask(request).await {
            Ok(text) => {
                debug!(task_id = %task.id, answer_len = text.len(), "Answer generated");
                Answer {
                    text,
                    outcome: AnswerOutcome::Generated,
                }
            }
            Err(e) => {
                warn!(
                    task_id = %task.id,
                    provider = %self.provider.name(),
                    error = %e,
                    "Answer generation failed, using fallback message"
                );
                Answer {
                    text: self.fallback_message.clone(),
                    outcome: AnswerOutcome::Fallback,
                }
            }
        }
    }

    async fn ask(&self, request: ProviderRequest) -> Result<String, ProviderError> {
        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!(
                    "Provider '{}' timed out after {}s",
                    self.provider.name(),
                    self.timeout.as_secs()
                ))
            })??;

        let text = response.message.content.trim();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, sample_task};
    use clickmon_core::message::Role;

    #[test]
    fn request_carries_question_and_task_context() {
        let provider = Arc::new(ScriptedProvider::answering("x"));
        let generator = AnswerGenerator::new(provider, "gpt-4o").with_max_tokens(300);
        let request = generator.build_request(&sample_task(), "what is the deadline?");

        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.max_tokens, Some(300));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("ClickUp Assistant"));
        let user = &request.messages[1].content;
        assert!(user.contains("Question: what is the deadline?"));
        assert!(user.contains("Task context: Release 1.2 - Cut the release branch"));
    }

    #[test]
    fn persona_from_config() {
        let mut config = clickmon_config::AppConfig::default();
        config.assistant.role = "Release captain".into();
        let provider = Arc::new(ScriptedProvider::answering("x"));
        let generator = AnswerGenerator::from_config(provider, "m", &config);
        let request = generator.build_request(&sample_task(), "q");
        assert!(request.messages[0].content.contains("Release captain"));
        assert_eq!(request.max_tokens, Some(config.default_max_tokens));
    }

    #[tokio::test]
    async fn successful_answer_is_trimmed() {
        let provider = Arc::new(ScriptedProvider::answering("  Friday at noon.\n"));
        let generator = AnswerGenerator::new(provider.clone(), "m");
        let answer = generator.generate_answer(&sample_task(), "deadline?").await;

        assert_eq!(answer.text, "Friday at noon.");
        assert_eq!(answer.outcome, AnswerOutcome::Generated);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn provider_error_becomes_fallback() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Network(
            "connection reset".into(),
        ))]));
        let generator = AnswerGenerator::new(provider, "m").with_fallback_message("try later");
        let answer = generator.generate_answer(&sample_task(), "q").await;

        assert_eq!(answer.text, "try later");
        assert!(answer.is_fallback());
    }

    #[tokio::test]
    async fn empty_output_becomes_fallback() {
        let provider = Arc::new(ScriptedProvider::answering("   "));
        let generator = AnswerGenerator::new(provider, "m");
        let answer = generator.generate_answer(&sample_task(), "q").await;
        assert!(answer.is_fallback());
        assert_eq!(answer.text, DEFAULT_FALLBACK);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out_to_fallback() {
        let provider =
            Arc::new(ScriptedProvider::answering("late").with_delay(Duration::from_secs(600)));
        let generator = AnswerGenerator::new(provider, "m").with_timeout(Duration::from_secs(5));
        let answer = generator.generate_answer(&sample_task(), "q").await;
        assert!(answer.is_fallback());
    }
}
