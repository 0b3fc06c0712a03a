//! The comment monitor loop.
//!
//! One [`CommentMonitor`] watches one task. Each poll cycle:
//!
//! 1. **Fetch** the task (absent → skip the cycle)
//! 2. **Fetch** its comments, in service order
//! 3. **Filter** out comments already answered or not addressed to the assistant
//! 4. **Answer** each remaining comment and **post** the answer
//! 5. **Remember** the comment id once the post succeeded
//!
//! then waits a fixed interval. Faults inside a cycle are logged and the
//! cycle is retried after the same interval, forever, until the shutdown
//! signal fires.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use clickmon_config::FallbackPolicy;
use clickmon_core::error::TaskServiceError;
use clickmon_core::service::TaskService;
use clickmon_core::task::TaskId;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::answer::AnswerGenerator;

/// Comment ids already answered by one session.
///
/// An id is inserted only after its answer was posted successfully.
#[derive(Debug, Default, Clone)]
pub struct ProcessedCommentSet {
    ids: HashSet<String>,
}

impl ProcessedCommentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, comment_id: &str) -> bool {
        self.ids.contains(comment_id)
    }

    pub fn insert(&mut self, comment_id: impl Into<String>) -> bool {
        self.ids.insert(comment_id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Remove every occurrence of `marker` and trim the rest.
pub fn extract_question(text: &str, marker: &str) -> String {
    text.replace(marker, "").trim().to_string()
}

/// Loop settings shared by every session.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub marker: String,
    pub fallback_policy: FallbackPolicy,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        (&clickmon_config::MonitorConfig::default()).into()
    }
}

impl From<&clickmon_config::MonitorConfig> for MonitorSettings {
    fn from(config: &clickmon_config::MonitorConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            marker: config.marker.clone(),
            fallback_policy: config.fallback_policy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Starting,
    Polling,
    Processing,
    Stopped,
}

/// What one poll cycle did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub task_found: bool,
    pub comments_seen: usize,
    /// Answers posted successfully (including posted fallbacks).
    pub answered: usize,
    pub fallbacks: usize,
    pub post_failures: usize,
    pub skipped_processed: usize,
    pub skipped_unaddressed: usize,
}

pub struct CommentMonitor {
    task_id: TaskId,
    service: Arc<dyn TaskService>,
    answers: Arc<AnswerGenerator>,
    settings: MonitorSettings,
    processed: ProcessedCommentSet,
    state: MonitorState,
    cycles: u64,
}

impl CommentMonitor {
    pub fn new(
        task_id: TaskId,
        service: Arc<dyn TaskService>,
        answers: Arc<AnswerGenerator>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            task_id,
            service,
            answers,
            settings,
            processed: ProcessedCommentSet::new(),
            state: MonitorState::Starting,
            cycles: 0,
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn processed(&self) -> &ProcessedCommentSet {
        &self.processed
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Completed poll cycles, failed ones included.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one poll cycle.
    ///
    /// An `Err` aborts the rest of the cycle; comments not yet posted stay
    /// eligible for the next one.
    pub async fn poll_once(&mut self) -> Result<CycleReport, TaskServiceError> {
        self.state = MonitorState::Polling;
        let mut report = CycleReport::default();

        let Some(task) = self.service.fetch_task(&self.task_id).await? else {
            warn!(task_id = %self.task_id, "Task not available, skipping cycle");
            return Ok(report);
        };
        report.task_found = true;
        debug!(task_id = %self.task_id, name = %task.name, "Task found");

        let comments = self.service.fetch_comments(&self.task_id).await?;
        report.comments_seen = comments.len();
        debug!(task_id = %self.task_id, count = comments.len(), "Comments fetched");

        for comment in comments {
            if self.processed.contains(&comment.id) {
                report.skipped_processed += 1;
                continue;
            }
            if !comment.text.contains(&self.settings.marker) {
                report.skipped_unaddressed += 1;
                continue;
            }

            self.state = MonitorState::Processing;
            let question = extract_question(&comment.text, &self.settings.marker);
            info!(
                task_id = %self.task_id,
                comment_id = %comment.id,
                question = %question,
                "New question found"
            );

            let answer = self.answers.generate_answer(&task, &question).await;
            if answer.is_fallback() {
                report.fallbacks += 1;
            }

            if !self.service.post_comment(&self.task_id, &answer.text).await? {
                report.post_failures += 1;
                warn!(
                    task_id = %self.task_id,
                    comment_id = %comment.id,
                    "Posting answer failed, will retry next cycle"
                );
                continue;
            }
            report.answered += 1;

            if answer.is_fallback() && self.settings.fallback_policy == FallbackPolicy::Retry {
                debug!(comment_id = %comment.id, "Fallback posted, comment stays eligible");
                continue;
            }

            self.processed.insert(comment.id);
            info!(task_id = %self.task_id, "Answer posted");
        }

        self.state = MonitorState::Polling;
        Ok(report)
    }

    /// Poll until `shutdown` becomes `true` or its sender is dropped.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            task_id = %self.task_id,
            interval_secs = self.settings.poll_interval.as_secs(),
            "Monitoring started"
        );

        while !*shutdown.borrow() {
            let outcome = tokio::select! {
                result = self.poll_once() => result,
                _ = shutdown.changed() => break,
            };
            self.cycles += 1;

            match outcome {
                Ok(report) => info!(
                    task_id = %self.task_id,
                    cycle = self.cycles,
                    task_found = report.task_found,
                    comments = report.comments_seen,
                    answered = report.answered,
                    post_failures = report.post_failures,
                    "Poll cycle complete"
                ),
                Err(e) => error!(
                    task_id = %self.task_id,
                    cycle = self.cycles,
                    error = %e,
                    "Poll cycle failed"
                ),
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }

        self.state = MonitorState::Stopped;
        info!(task_id = %self.task_id, answered = self.processed.len(), "Monitoring stopped");
    }
}
