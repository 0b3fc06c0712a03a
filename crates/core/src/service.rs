//! TaskService trait: the abstraction over the task-tracking API.
//!
//! Reads deliberately conflate "not there" with "not reachable right now":
//! a non-success status yields an absent task or an empty comment list, and
//! the monitor's next poll cycle is the retry. `Err` is reserved for faults
//! the monitor has to catch at its cycle boundary (transport failures,
//! undecodable bodies).

use async_trait::async_trait;
use crate::error::TaskServiceError;
use crate::task::{Comment, Task, TaskId};

#[async_trait]
pub trait TaskService: Send + Sync {
    /// Fetch a task. `Ok(None)` means the task is unavailable this cycle.
    async fn fetch_task(&self, task_id: &TaskId) -> Result<Option<Task>, TaskServiceError>;

    /// Fetch all comments on a task, in the order the service returns them.
    async fn fetch_comments(&self, task_id: &TaskId) -> Result<Vec<Comment>, TaskServiceError>;

    /// Post a new comment. Returns whether the service reported success.
    /// Implementations must not retry.
    async fn post_comment(&self, task_id: &TaskId, text: &str) -> Result<bool, TaskServiceError>;
}
