//! Governance store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Returned by any attempt to mutate an append-only table.
    #[error("Append-only table: {0}")]
    AppendOnly(&'static str),

    /// A query reached the store without a tenant predicate. Fails closed.
    #[error("Query issued without an org scope")]
    MissingOrgScope,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Internal(String),
}
