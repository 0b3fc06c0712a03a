//! End-to-end monitor scenarios against an in-memory comment thread.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use clickmon_core::error::{ProviderError, TaskServiceError};
use clickmon_core::message::{Message, Role};
use clickmon_core::provider::{Provider, ProviderRequest, ProviderResponse};
use clickmon_core::service::TaskService;
use clickmon_core::task::{Comment, Task, TaskId};
use clickmon_monitor::{AnswerGenerator, CommentMonitor, MonitorSettings, SessionRegistry};

/// A comment thread where posted answers show up as new comments.
struct Thread {
    task: Task,
    comments: Mutex<Vec<Comment>>,
    posts: Mutex<Vec<String>>,
}

impl Thread {
    fn new(comments: Vec<Comment>) -> Self {
        Self {
            task: Task {
                id: "T1".into(),
                name: "Release 1.2".into(),
                description: None,
            },
            comments: Mutex::new(comments),
            posts: Mutex::new(Vec::new()),
        }
    }

    fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }

    fn add_comment(&self, id: &str, text: &str) {
        self.comments.lock().unwrap().push(Comment::new(id, text));
    }
}

#[async_trait::async_trait]
impl TaskService for Thread {
    async fn fetch_task(&self, task_id: &TaskId) -> Result<Option<Task>, TaskServiceError> {
        Ok((task_id.as_str() == self.task.id).then(|| self.task.clone()))
    }

    async fn fetch_comments(&self, _task_id: &TaskId) -> Result<Vec<Comment>, TaskServiceError> {
        Ok(self.comments.lock().unwrap().clone())
    }

    async fn post_comment(&self, _task_id: &TaskId, text: &str) -> Result<bool, TaskServiceError> {
        let mut posts = self.posts.lock().unwrap();
        posts.push(text.to_string());
        let id = format!("answer-{}", posts.len());
        self.comments.lock().unwrap().push(Comment::new(id, text));
        Ok(true)
    }
}

/// Replies with the question it was asked.
struct EchoProvider {
    asked: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl Provider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let user = request
            .messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let question = user
            .lines()
            .find_map(|l| l.strip_prefix("Question: "))
            .unwrap_or_default()
            .to_string();
        self.asked.lock().unwrap().push(question.clone());
        Ok(ProviderResponse {
            message: Message::assistant(format!("Answer to: {question}")),
            usage: None,
            model: request.model,
        })
    }
}

fn generator(provider: Arc<EchoProvider>) -> Arc<AnswerGenerator> {
    Arc::new(AnswerGenerator::new(provider, "echo-model"))
}

fn echo() -> Arc<EchoProvider> {
    Arc::new(EchoProvider {
        asked: Mutex::new(Vec::new()),
    })
}

#[tokio::test]
async fn answers_marked_comment_once() {
    let thread = Arc::new(Thread::new(vec![
        Comment::new("c1", "@AI status?"),
        Comment::new("c2", "looks good"),
    ]));
    let provider = echo();
    let mut monitor = CommentMonitor::new(
        TaskId::from("T1"),
        thread.clone(),
        generator(provider.clone()),
        MonitorSettings::default(),
    );

    let first = monitor.poll_once().await.unwrap();
    assert_eq!(first.answered, 1);
    assert_eq!(first.skipped_unaddressed, 1);
    assert_eq!(thread.posts(), vec!["Answer to: status?"]);
    assert!(monitor.processed().contains("c1"));
    assert!(!monitor.processed().contains("c2"));

    let second = monitor.poll_once().await.unwrap();
    assert_eq!(second.answered, 0);
    assert_eq!(second.skipped_processed, 1);
    assert_eq!(thread.posts().len(), 1);
    assert_eq!(*provider.asked.lock().unwrap(), vec!["status?"]);
}

#[tokio::test]
async fn new_marked_comment_is_picked_up_on_a_later_cycle() {
    let thread = Arc::new(Thread::new(vec![Comment::new("c1", "@AI status?")]));
    let provider = echo();
    let mut monitor = CommentMonitor::new(
        TaskId::from("T1"),
        thread.clone(),
        generator(provider.clone()),
        MonitorSettings::default(),
    );

    monitor.poll_once().await.unwrap();
    thread.add_comment("c3", "@AI what is the deadline?");
    let report = monitor.poll_once().await.unwrap();

    assert_eq!(report.answered, 1);
    assert_eq!(
        *provider.asked.lock().unwrap(),
        vec!["status?", "what is the deadline?"]
    );
}

#[tokio::test]
async fn unknown_task_makes_no_comment_calls() {
    let thread = Arc::new(Thread::new(vec![Comment::new("c1", "@AI status?")]));
    let provider = echo();
    let mut monitor = CommentMonitor::new(
        TaskId::from("T404"),
        thread.clone(),
        generator(provider.clone()),
        MonitorSettings::default(),
    );

    let report = monitor.poll_once().await.unwrap();
    assert!(!report.task_found);
    assert!(thread.posts().is_empty());
    assert!(provider.asked.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn registry_session_answers_in_background_until_stopped() {
    let thread = Arc::new(Thread::new(vec![Comment::new("c1", "@AI status?")]));
    let registry = SessionRegistry::new(
        thread.clone(),
        generator(echo()),
        MonitorSettings::default(),
        Default::default(),
    );

    registry.start(TaskId::from("T1")).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(thread.posts().len(), 1);

    thread.add_comment("c2", "@AI any blockers?");
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(thread.posts().len(), 2);

    assert_eq!(registry.stop(&TaskId::from("T1")), 1);
    thread.add_comment("c3", "@AI still there?");
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(thread.posts().len(), 2);
    assert!(registry.list().is_empty());
}
