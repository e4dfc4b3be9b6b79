//! # Ghostflow Protocols
//!
//! Core data model and trait definitions shared across the Ghostflow
//! pipeline. Contains only types and interfaces - no I/O.
//!
//! ## Core Types
//!
//! - [`RawEvent`] - device-side observation, never crosses the privacy boundary
//! - [`SecureEvent`] - the privacy-preserving boundary record
//! - [`IntentClass`] - the closed twelve-label intent set
//! - [`DetectedPattern`] - a clustered, confidence-scored workflow candidate
//! - [`Ghost`] - an approved, parameterized workflow template
//! - [`Execution`] / [`ExecutionStep`] - the execution ledger
//! - [`LlmProvider`] - the LLM completion port

pub mod error;
pub mod provider;
pub mod types;

pub use error::{ProviderError, StoreError};
pub use provider::{
    ChatMessage, ChatRole, CompletionRequest, CompletionResponse, FinishReason, FunctionCall,
    LlmProvider, ToolCall, ToolChoice, ToolSpec, Usage,
};
pub use types::*;
