//! ClickUp API v2 client.
//!
//! Implements [`TaskService`] over three endpoints:
//! - `GET  {base}/task/{id}`
//! - `GET  {base}/task/{id}/comment`
//! - `POST {base}/task/{id}/comment` with `{"comment_text": ...}`
//!
//! The client never retries. A non-success status on a read is reported as
//! "nothing there" so the monitor's next cycle acts as the retry.

use async_trait::async_trait;
use clickmon_core::error::TaskServiceError;
use clickmon_core::service::TaskService;
use clickmon_core::task::{Comment, Task, TaskId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client for the ClickUp task API.
pub struct ClickUpClient {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for ClickUpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickUpClient")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl ClickUpClient {
    /// Create a client against `base_url` (e.g. `https://api.clickup.com/api/v2`).
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            client,
        }
    }

    /// Build a client from the `[clickup]` config section.
    ///
    /// A missing token is sent as an empty header; ClickUp answers 401, which
    /// the monitor sees as an unavailable task and keeps polling.
    pub fn from_config(config: &clickmon_config::ClickUpConfig) -> Self {
        if config.api_token.is_none() {
            warn!("No ClickUp API token configured, requests will be rejected");
        }
        Self::new(
            &config.base_url,
            config.api_token.clone().unwrap_or_default(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn task_url(&self, task_id: &TaskId) -> String {
        format!("{}/task/{}", self.base_url, task_id)
    }

    fn comments_url(&self, task_id: &TaskId) -> String {
        format!("{}/task/{}/comment", self.base_url, task_id)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", &self.api_token)
            .header("Content-Type", "application/json")
    }
}

fn network_error(e: reqwest::Error) -> TaskServiceError {
    TaskServiceError::Network(e.to_string())
}

fn decode_error(endpoint: &str, e: impl std::fmt::Display) -> TaskServiceError {
    TaskServiceError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    }
}

#[async_trait]
impl TaskService for ClickUpClient {
    async fn fetch_task(&self, task_id: &TaskId) -> Result<Option<Task>, TaskServiceError> {
        let url = self.task_url(task_id);
        let response = self.get(&url).send().await.map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!(task_id = %task_id, status = status.as_u16(), "Task not available");
            return Ok(None);
        }

        let task: Task = response.json().await.map_err(|e| decode_error(&url, e))?;
        Ok(Some(task))
    }

    async fn fetch_comments(&self, task_id: &TaskId) -> Result<Vec<Comment>, TaskServiceError> {
        let url = self.comments_url(task_id);
        let response = self.get(&url).send().await.map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!(task_id = %task_id, status = status.as_u16(), "Comments not available");
            return Ok(Vec::new());
        }

        let body: CommentsResponse = response.json().await.map_err(|e| decode_error(&url, e))?;
        Ok(body.comments)
    }

    async fn post_comment(&self, task_id: &TaskId, text: &str) -> Result<bool, TaskServiceError> {
        let url = self.comments_url(task_id);
        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.api_token)
            .json(&CreateCommentRequest { comment_text: text })
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(task_id = %task_id, status, body = %body, "Comment was not created");
        }
        Ok(status == 200)
    }
}

// --- ClickUp API types (internal) ---

#[derive(Debug, Deserialize)]
struct CommentsResponse {
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
struct CreateCommentRequest<'a> {
    comment_text: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let client =
            ClickUpClient::new("https://api.clickup.com/api/v2/", "pk", Duration::from_secs(5));
        let id = TaskId::from("86abc");
        assert_eq!(client.task_url(&id), "https://api.clickup.com/api/v2/task/86abc");
        assert_eq!(
            client.comments_url(&id),
            "https://api.clickup.com/api/v2/task/86abc/comment"
        );
    }

    #[test]
    fn comments_body_without_field_is_empty() {
        let body: CommentsResponse = serde_json::from_str("{}").unwrap();
        assert!(body.comments.is_empty());
    }

    #[test]
    fn create_comment_body_shape() {
        let json = serde_json::to_value(CreateCommentRequest { comment_text: "done" }).unwrap();
        assert_eq!(json, serde_json::json!({"comment_text": "done"}));
    }

    #[test]
    fn debug_redacts_token() {
        let client = ClickUpClient::new("http://localhost", "pk_secret", Duration::from_secs(5));
        assert!(!format!("{client:?}").contains("pk_secret"));
    }
}
