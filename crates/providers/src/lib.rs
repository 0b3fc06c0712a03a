//! LLM Provider implementations for Clickmon.
//!
//! All providers implement the `clickmon_core::Provider` trait.
//! The router builds the configured providers and hands out the default one.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::ProviderRouter;
