//! # Ghostflow Provider HTTP
//!
//! An OpenAI-compatible chat-completions adapter behind the
//! [`LlmProvider`] port, and a [`RetryProvider`] wrapper that recovers
//! transient failures with capped exponential backoff.
//!
//! [`LlmProvider`]: ghostflow_protocols::LlmProvider

pub mod api;
pub mod provider;
pub mod retry;

pub use provider::{HttpLlmProvider, HttpProviderConfig};
pub use retry::{RetryConfig, RetryProvider};
