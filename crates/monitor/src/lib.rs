//! # Clickmon Monitor
//!
//! Watches a task's comment thread for the `@AI` marker and answers each
//! marked comment exactly once per session.
//!
//! - [`AnswerGenerator`] asks the LLM provider and absorbs its failures.
//! - [`CommentMonitor`] runs the poll cycle and owns the processed-comment set.
//! - [`SessionRegistry`] launches monitors as background tasks and stops them.

pub mod answer;
pub mod monitor;
pub mod registry;

#[cfg(test)]
mod test_helpers;

pub use answer::{Answer, AnswerGenerator, AnswerOutcome, AssistantPersona};
pub use monitor::{
    CommentMonitor, CycleReport, MonitorSettings, MonitorState, ProcessedCommentSet,
    extract_question,
};
pub use registry::{LaunchError, SessionInfo, SessionRegistry};
