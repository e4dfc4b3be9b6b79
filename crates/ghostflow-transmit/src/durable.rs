//! Durable storage for failed batches.

use std::path::PathBuf;

use tracing::warn;

use ghostflow_protocols::SecureEventBatch;

/// File-backed persistence for the failed-batch queue.
///
/// A device that cannot write its spool file must keep capturing, so every
/// operation degrades to a no-op with a warning.
#[derive(Debug, Clone, Default)]
pub struct DurableQueue {
    path: Option<PathBuf>,
}

impl DurableQueue {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Load and clear persisted batches. Called once at startup.
    pub fn restore(&self) -> Vec<SecureEventBatch> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let restored = match std::fs::read(path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(batches) => batches,
                Err(error) => {
                    warn!(%error, "discarding unreadable durable queue");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        if let Err(error) = std::fs::remove_file(path) {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(%error, "failed to clear durable queue");
            }
        }
        restored
    }

    /// Overwrite the spool with the current failed queue.
    pub fn persist(&self, batches: &[SecureEventBatch]) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_vec(batches) {
            Ok(bytes) => {
                if let Err(error) = std::fs::write(path, bytes) {
                    warn!(%error, "failed to persist failed batches");
                }
            }
            Err(error) => warn!(%error, "failed to serialize failed batches"),
        }
    }
}
