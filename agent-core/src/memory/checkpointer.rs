//! Checkpointer trait and CheckpointError.
//!
//! Persists opaque per-thread state snapshots keyed by a monotonically
//! increasing sequence number, with an optional parent sequence recording
//! which checkpoint a given write branched from.

use async_trait::async_trait;

/// Error type for checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("thread_id required")]
    ThreadIdRequired,
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("storage: {0}")]
    Storage(String),
}

/// One stored checkpoint row: its sequence number, the parent it branched
/// from (if any), and the opaque serialized state payload.
#[derive(Debug, Clone)]
pub struct CheckpointRecord {
    pub sequence: i64,
    pub parent_sequence: Option<i64>,
    pub payload: Vec<u8>,
}

/// Persists opaque state snapshots for a thread. Implementations don't know
/// or care what's inside `payload`; callers serialize/deserialize their own
/// state type (see [`crate::state::ThreadState`]).
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Appends a new checkpoint for `thread_id`, returning its sequence number.
    async fn put(
        &self,
        thread_id: &str,
        parent_sequence: Option<i64>,
        payload: Vec<u8>,
    ) -> Result<i64, CheckpointError>;

    /// Returns the most recently written checkpoint for `thread_id`, if any.
    async fn latest(&self, thread_id: &str) -> Result<Option<CheckpointRecord>, CheckpointError>;

    /// Returns every checkpoint for `thread_id`, oldest first.
    async fn list(&self, thread_id: &str) -> Result<Vec<CheckpointRecord>, CheckpointError>;

    /// Deletes every checkpoint for `thread_id`.
    async fn reset(&self, thread_id: &str) -> Result<(), CheckpointError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_error_display_all_variants() {
        assert!(CheckpointError::ThreadIdRequired
            .to_string()
            .to_lowercase()
            .contains("thread"));
        assert!(CheckpointError::Serialization("err".into())
            .to_string()
            .to_lowercase()
            .contains("serialization"));
        assert!(CheckpointError::Storage("io".into())
            .to_string()
            .to_lowercase()
            .contains("storage"));
    }
}
