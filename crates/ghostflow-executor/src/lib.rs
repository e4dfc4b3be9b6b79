//! # Ghostflow Executor
//!
//! The adaptive execution engine. Given an approved ghost it produces a
//! plan (stored or LLM-generated), executes each node through the matching
//! tool path, self-heals failed steps with an LLM-proposed substitute, and
//! records everything in the execution ledger plus one immutable audit row.

pub mod engine;
pub mod error;
pub mod heal;
pub mod planner;

pub use engine::{ExecutionEngine, ExecutionOutcome};
pub use error::ExecutorError;
