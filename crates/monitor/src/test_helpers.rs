//! Shared test doubles for monitor tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use clickmon_core::error::{ProviderError, TaskServiceError};
use clickmon_core::message::Message;
use clickmon_core::provider::{Provider, ProviderRequest, ProviderResponse};
use clickmon_core::service::TaskService;
use clickmon_core::task::{Comment, Task, TaskId};

pub fn sample_task() -> Task {
    Task {
        id: "T1".into(),
        name: "Release 1.2".into(),
        description: Some("Cut the release branch".into()),
    }
}

/// A provider that replays scripted results, then repeats `fallback_text`.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    fallback_text: String,
    delay: Option<Duration>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback_text: "Generated answer".into(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `text`.
    pub fn answering(text: &str) -> Self {
        let mut provider = Self::new(Vec::new());
        provider.fallback_text = text.into();
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        let text = match next {
            Some(result) => result?,
            None => self.fallback_text.clone(),
        };
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: None,
            model: "mock-model".into(),
        })
    }
}

/// An in-memory task service that records every call.
pub struct MockTaskService {
    pub task: Mutex<Option<Task>>,
    pub comments: Mutex<Vec<Comment>>,
    /// Results for successive post calls; `Ok(true)` once exhausted.
    pub post_results: Mutex<VecDeque<Result<bool, TaskServiceError>>>,
    /// Error returned by the next `fetch_comments` call, if any.
    pub comments_error: Mutex<Option<TaskServiceError>>,
    pub fetch_task_calls: Mutex<usize>,
    pub fetch_comments_calls: Mutex<usize>,
    pub posted: Mutex<Vec<(TaskId, String)>>,
}

impl MockTaskService {
    pub fn new(task: Option<Task>, comments: Vec<Comment>) -> Self {
        Self {
            task: Mutex::new(task),
            comments: Mutex::new(comments),
            post_results: Mutex::new(VecDeque::new()),
            comments_error: Mutex::new(None),
            fetch_task_calls: Mutex::new(0),
            fetch_comments_calls: Mutex::new(0),
            posted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_post_results(self, results: Vec<Result<bool, TaskServiceError>>) -> Self {
        *self.post_results.lock().unwrap() = results.into();
        self
    }

    pub fn fetch_task_calls(&self) -> usize {
        *self.fetch_task_calls.lock().unwrap()
    }

    pub fn fetch_comments_calls(&self) -> usize {
        *self.fetch_comments_calls.lock().unwrap()
    }

    /// Texts of every post attempt, successful or not.
    pub fn posted_texts(&self) -> Vec<String> {
        self.posted.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

#[async_trait::async_trait]
impl TaskService for MockTaskService {
    async fn fetch_task(&self, _task_id: &TaskId) -> Result<Option<Task>, TaskServiceError> {
        *self.fetch_task_calls.lock().unwrap() += 1;
        Ok(self.task.lock().unwrap().clone())
    }

    async fn fetch_comments(&self, _task_id: &TaskId) -> Result<Vec<Comment>, TaskServiceError> {
        *self.fetch_comments_calls.lock().unwrap() += 1;
        if let Some(err) = self.comments_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.comments.lock().unwrap().clone())
    }

    async fn post_comment(&self, task_id: &TaskId, text: &str) -> Result<bool, TaskServiceError> {
        self.posted.lock().unwrap().push((task_id.clone(), text.to_string()));
        self.post_results.lock().unwrap().pop_front().unwrap_or(Ok(true))
    }
}
