//! Session launcher and registry.
//!
//! `start` spawns a [`CommentMonitor`] as an independent tokio task and
//! returns at once. Every spawned session is kept with its shutdown sender so
//! it can be listed and stopped later. Sessions share the task service and
//! the answer generator; each owns its own processed-comment set.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use clickmon_config::DuplicateSessionPolicy;
use clickmon_core::service::TaskService;
use clickmon_core::task::TaskId;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::answer::AnswerGenerator;
use crate::monitor::{CommentMonitor, MonitorSettings};

/// Public description of a running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub task_id: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Task {0} is already being monitored")]
    AlreadyMonitoring(TaskId),

    #[error("Task id must not be empty")]
    InvalidTaskId,

    #[error("Cannot schedule monitor: {0}")]
    Spawn(String),
}

struct Session {
    info: SessionInfo,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Session {
    fn stop(self) {
        // A closed channel means the loop already exited.
        let _ = self.shutdown.send(true);
    }
}

pub struct SessionRegistry {
    service: Arc<dyn TaskService>,
    answers: Arc<AnswerGenerator>,
    settings: MonitorSettings,
    duplicate_policy: DuplicateSessionPolicy,
    sessions: Mutex<HashMap<TaskId, Vec<Session>>>,
}

impl SessionRegistry {
    pub fn new(
        service: Arc<dyn TaskService>,
        answers: Arc<AnswerGenerator>,
        settings: MonitorSettings,
        duplicate_policy: DuplicateSessionPolicy,
    ) -> Self {
        Self {
            service,
            answers,
            settings,
            duplicate_policy,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(
        service: Arc<dyn TaskService>,
        answers: Arc<AnswerGenerator>,
        config: &clickmon_config::MonitorConfig,
    ) -> Self {
        Self::new(service, answers, config.into(), config.duplicate_sessions)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TaskId, Vec<Session>>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Spawn a monitoring session for `task_id` without waiting on it.
    pub fn start(&self, task_id: TaskId) -> Result<SessionInfo, LaunchError> {
        if task_id.as_str().trim().is_empty() {
            return Err(LaunchError::InvalidTaskId);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| LaunchError::Spawn(e.to_string()))?;

        let mut sessions = self.lock();
        prune_finished(&mut sessions);

        let running = sessions.get(&task_id).map_or(0, Vec::len);
        if running > 0 {
            match self.duplicate_policy {
                DuplicateSessionPolicy::Reject => {
                    return Err(LaunchError::AlreadyMonitoring(task_id));
                }
                DuplicateSessionPolicy::Allow => {
                    warn!(task_id = %task_id, running, "Starting duplicate session for task");
                }
            }
        }

        let info = SessionInfo {
            session_id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            started_at: Utc::now(),
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut monitor = CommentMonitor::new(
            task_id.clone(),
            self.service.clone(),
            self.answers.clone(),
            self.settings.clone(),
        );
        let session_id = info.session_id.clone();
        let handle = runtime.spawn(async move {
            monitor.run(shutdown_rx).await;
            info!(session_id = %session_id, "Session finished");
        });

        info!(task_id = %task_id, session_id = %info.session_id, "Session started");
        sessions.entry(task_id).or_default().push(Session {
            info: info.clone(),
            shutdown: shutdown_tx,
            handle,
        });

        Ok(info)
    }

    /// Running sessions, oldest first within each task.
    pub fn list(&self) -> Vec<SessionInfo> {
        let mut sessions = self.lock();
        prune_finished(&mut sessions);
        let mut infos: Vec<SessionInfo> = sessions
            .values()
            .flat_map(|list| list.iter().map(|s| s.info.clone()))
            .collect();
        infos.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        infos
    }

    pub fn active_count(&self, task_id: &TaskId) -> usize {
        let mut sessions = self.lock();
        prune_finished(&mut sessions);
        sessions.get(task_id).map_or(0, Vec::len)
    }

    /// Signal every session for `task_id` to stop. Returns how many were signalled.
    pub fn stop(&self, task_id: &TaskId) -> usize {
        let removed = self.lock().remove(task_id).unwrap_or_default();
        let count = removed.len();
        for session in removed {
            info!(task_id = %task_id, session_id = %session.info.session_id, "Stopping session");
            session.stop();
        }
        count
    }

    /// Signal every session to stop.
    pub fn shutdown_all(&self) -> usize {
        let all: Vec<Session> = self.lock().drain().flat_map(|(_, list)| list).collect();
        let count = all.len();
        for session in all {
            session.stop();
        }
        if count > 0 {
            info!(count, "All sessions signalled to stop");
        }
        count
    }
}

fn prune_finished(sessions: &mut HashMap<TaskId, Vec<Session>>) {
    for list in sessions.values_mut() {
        list.retain(|s| !s.handle.is_finished());
    }
    sessions.retain(|_, list| !list.is_empty());
}
