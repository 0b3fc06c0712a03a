//! # Clickmon Core
//!
//! Domain types, traits, and error definitions for Clickmon.
//! This crate has **no transport dependencies**: it defines the domain model
//! that the ClickUp client, the LLM providers and the monitor implement
//! against.
//!
//! The two outward seams are traits:
//! - [`TaskService`] for the task-tracking API (read tasks, read and write comments)
//! - [`Provider`] for the LLM backend that answers questions

pub mod error;
pub mod message;
pub mod provider;
pub mod service;
pub mod task;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, TaskServiceError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use service::TaskService;
pub use task::{Comment, Task, TaskId};
