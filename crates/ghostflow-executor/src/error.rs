//! Executor errors.

use thiserror::Error;

use ghostflow_protocols::StoreError;

#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The ghost does not exist.
    #[error("Ghost not found: {0}")]
    GhostNotFound(String),

    /// The ghost exists but its status does not allow execution.
    #[error("Ghost not approved for execution: {0}")]
    GhostNotApproved(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ExecutorError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(what) => ExecutorError::GhostNotFound(what),
            other => ExecutorError::Store(other),
        }
    }
}
