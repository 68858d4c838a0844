//! In-memory checkpointer. Dev and tests only; nothing survives a restart.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::checkpointer::{CheckpointError, CheckpointRecord, Checkpointer};

#[derive(Default)]
pub struct MemorySaver {
    threads: Mutex<HashMap<String, Vec<CheckpointRecord>>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn put(
        &self,
        thread_id: &str,
        parent_sequence: Option<i64>,
        payload: Vec<u8>,
    ) -> Result<i64, CheckpointError> {
        let mut threads = self.threads.lock().unwrap();
        let records = threads.entry(thread_id.to_string()).or_default();
        let sequence = records.last().map(|r| r.sequence + 1).unwrap_or(0);
        records.push(CheckpointRecord {
            sequence,
            parent_sequence,
            payload,
        });
        Ok(sequence)
    }

    async fn latest(&self, thread_id: &str) -> Result<Option<CheckpointRecord>, CheckpointError> {
        let threads = self.threads.lock().unwrap();
        Ok(threads.get(thread_id).and_then(|r| r.last().cloned()))
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<CheckpointRecord>, CheckpointError> {
        let threads = self.threads.lock().unwrap();
        Ok(threads.get(thread_id).cloned().unwrap_or_default())
    }

    async fn reset(&self, thread_id: &str) -> Result<(), CheckpointError> {
        self.threads.lock().unwrap().remove(thread_id);
        Ok(())
    }
}
