//! SQLite-backed checkpointer. Persistent across process restarts.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use super::checkpointer::{CheckpointError, CheckpointRecord, Checkpointer};

/// SQLite-backed checkpointer keyed by `(thread_id, sequence)`.
///
/// Each call opens its own connection on a blocking thread; SQLite handles
/// the file locking, so this is safe for concurrent callers against the
/// same db file.
pub struct SqliteSaver {
    db_path: std::path::PathBuf,
}

impl SqliteSaver {
    /// Opens (creating if necessary) the checkpoint table at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let db_path = path.as_ref().to_path_buf();
        let conn =
            rusqlite::Connection::open(&db_path).map_err(|e| CheckpointError::Storage(e.to_string()))?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                parent_sequence INTEGER,
                payload BLOB NOT NULL,
                PRIMARY KEY (thread_id, sequence)
            )
            "#,
            [],
        )
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(Self { db_path })
    }
}

#[async_trait]
impl Checkpointer for SqliteSaver {
    async fn put(
        &self,
        thread_id: &str,
        parent_sequence: Option<i64>,
        payload: Vec<u8>,
    ) -> Result<i64, CheckpointError> {
        let thread_id = thread_id.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let next_sequence: i64 = conn
                .query_row(
                    "SELECT COALESCE(MAX(sequence), -1) + 1 FROM checkpoints WHERE thread_id = ?1",
                    params![thread_id],
                    |row| row.get(0),
                )
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            conn.execute(
                "INSERT INTO checkpoints (thread_id, sequence, parent_sequence, payload) VALUES (?1, ?2, ?3, ?4)",
                params![thread_id, next_sequence, parent_sequence, payload],
            )
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            Ok::<i64, CheckpointError>(next_sequence)
        })
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))?
    }

    async fn latest(&self, thread_id: &str) -> Result<Option<CheckpointRecord>, CheckpointError> {
        let thread_id = thread_id.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            conn.query_row(
                "SELECT sequence, parent_sequence, payload FROM checkpoints
                 WHERE thread_id = ?1 ORDER BY sequence DESC LIMIT 1",
                params![thread_id],
                |row| {
                    Ok(CheckpointRecord {
                        sequence: row.get(0)?,
                        parent_sequence: row.get(1)?,
                        payload: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(|e| CheckpointError::Storage(e.to_string()))
        })
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))?
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<CheckpointRecord>, CheckpointError> {
        let thread_id = thread_id.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let mut stmt = conn
                .prepare(
                    "SELECT sequence, parent_sequence, payload FROM checkpoints
                     WHERE thread_id = ?1 ORDER BY sequence ASC",
                )
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let rows = stmt
                .query_map(params![thread_id], |row| {
                    Ok(CheckpointRecord {
                        sequence: row.get(0)?,
                        parent_sequence: row.get(1)?,
                        payload: row.get(2)?,
                    })
                })
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| CheckpointError::Storage(e.to_string()))
        })
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))?
    }

    async fn reset(&self, thread_id: &str) -> Result<(), CheckpointError> {
        let thread_id = thread_id.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            conn.execute("DELETE FROM checkpoints WHERE thread_id = ?1", params![thread_id])
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_latest_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let saver = SqliteSaver::new(dir.path().join("checkpoints.db")).unwrap();
        let seq = saver.put("t1", None, b"hello".to_vec()).await.unwrap();
        assert_eq!(seq, 0);
        let latest = saver.latest("t1").await.unwrap().unwrap();
        assert_eq!(latest.payload, b"hello");
        assert_eq!(latest.parent_sequence, None);
    }

    #[tokio::test]
    async fn sequence_increments_and_tracks_parent() {
        let dir = tempfile::tempdir().unwrap();
        let saver = SqliteSaver::new(dir.path().join("checkpoints.db")).unwrap();
        let s0 = saver.put("t1", None, b"a".to_vec()).await.unwrap();
        let s1 = saver.put("t1", Some(s0), b"b".to_vec()).await.unwrap();
        assert_eq!(s1, s0 + 1);
        let list = saver.list("t1").await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].parent_sequence, Some(s0));
    }

    #[tokio::test]
    async fn reset_clears_thread() {
        let dir = tempfile::tempdir().unwrap();
        let saver = SqliteSaver::new(dir.path().join("checkpoints.db")).unwrap();
        saver.put("t1", None, b"a".to_vec()).await.unwrap();
        saver.reset("t1").await.unwrap();
        assert!(saver.latest("t1").await.unwrap().is_none());
    }
}
