//! Agent Execution Loop: the public entry point for running one turn.
//!
//! [`AgentRunner::run_turn`] resolves session config, acquires (or builds) the
//! compiled agent for that config, loads the thread's last checkpoint, runs
//! the graph, persists the new state, and streams [`StreamEvent`]s back
//! through a bounded channel. Per-thread `try_lock` serializes concurrent
//! turns on the same thread id; a caller racing an in-flight turn gets
//! `ErrorKind::ThreadBusy` immediately rather than queuing.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::factory::{AgentFactory, AgentKey};
use crate::graph::RunContext;
use crate::memory::Checkpointer;
use crate::message::{Message, MessageRecord};
use crate::session_config::SessionConfigResolver;
use crate::state::ThreadState;
use crate::stream::{StreamEvent, StreamSender};

/// Depth of the bounded, backpressured channel handed to callers of
/// [`AgentRunner::run_turn`]. The pump from the graph's internal unbounded
/// [`StreamSender`] blocks on this channel's `send`, so a slow consumer (e.g.
/// an SSE client with a full TCP buffer) throttles node execution rather than
/// letting events pile up unbounded in memory.
const OUTPUT_CHANNEL_DEPTH: usize = 64;

/// Runs agent turns: owns the compiled-agent cache, the checkpoint store, and
/// session config resolution. One instance is shared across all requests.
pub struct AgentRunner {
    factory: Arc<AgentFactory>,
    checkpointer: Arc<dyn Checkpointer>,
    session_config: Arc<SessionConfigResolver>,
    thread_locks: DashMap<String, Arc<AsyncMutex<()>>>,
}

impl AgentRunner {
    pub fn new(
        factory: Arc<AgentFactory>,
        checkpointer: Arc<dyn Checkpointer>,
        session_config: Arc<SessionConfigResolver>,
    ) -> Self {
        Self {
            factory,
            checkpointer,
            session_config,
            thread_locks: DashMap::new(),
        }
    }

    fn lock_for(&self, thread_id: &str) -> Arc<AsyncMutex<()>> {
        self.thread_locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Runs one turn for `thread_id`/`user_id`, appending `user_text` to the
    /// thread's history. Returns immediately with the receiving half of a
    /// bounded event channel; the turn runs on a spawned task.
    pub fn run_turn(
        self: &Arc<Self>,
        user_id: String,
        thread_id: String,
        user_text: String,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_DEPTH);
        let this = self.clone();
        tokio::spawn(async move {
            this.run_turn_inner(user_id, thread_id, user_text, cancel, tx).await;
        });
        rx
    }

    async fn run_turn_inner(
        self: Arc<Self>,
        user_id: String,
        thread_id: String,
        user_text: String,
        cancel: CancellationToken,
        tx: mpsc::Sender<StreamEvent>,
    ) {
        let lock = self.lock_for(&thread_id);
        let _guard = match lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                let err = AgentError::ThreadBusy(thread_id.clone());
                let _ = tx
                    .send(StreamEvent::Error {
                        kind: err.kind(),
                        detail: err.to_string(),
                    })
                    .await;
                return;
            }
        };

        if let Err(err) = self.execute(&user_id, &thread_id, &user_text, &cancel, &tx).await {
            let _ = tx
                .send(StreamEvent::Error {
                    kind: err.kind(),
                    detail: err.to_string(),
                })
                .await;
        }
    }

    async fn execute(
        &self,
        user_id: &str,
        thread_id: &str,
        user_text: &str,
        cancel: &CancellationToken,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<(), AgentError> {
        if thread_id.trim().is_empty() || user_id.trim().is_empty() {
            return Err(AgentError::InvalidThread(thread_id.to_string()));
        }
        if user_text.trim().is_empty() {
            return Err(AgentError::InvalidInput("message text is empty".into()));
        }

        let session_config = self.session_config.resolve(user_id, thread_id).await;
        let key = AgentKey::from(&session_config);
        let agent = self.factory.get_or_build(key)?;

        let mut state = match self.checkpointer.latest(thread_id).await? {
            Some(record) => serde_json::from_slice::<ThreadState>(&record.payload)
                .map_err(|e| AgentError::CheckpointStorage(e.to_string()))?,
            None => ThreadState::default(),
        };
        let parent_sequence = self
            .checkpointer
            .latest(thread_id)
            .await?
            .map(|record| record.sequence);
        state.messages.push(Message::user(user_text));

        let (inner_tx, mut inner_rx) = tokio::sync::mpsc::unbounded_channel();
        let stream = StreamSender::new(inner_tx);
        let pump_tx = tx.clone();
        let pump = tokio::spawn(async move {
            while let Some(event) = inner_rx.recv().await {
                if pump_tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        let ctx = RunContext::new(thread_id, user_id)
            .with_cancel(cancel.clone())
            .with_stream(stream)
            .with_recursion_bound(session_config.recursion_bound);

        let result = agent.graph().invoke_with_context(state, Arc::new(ctx)).await;
        // Dropping the graph's StreamSender closes inner_tx; wait for the pump
        // to drain whatever it already emitted before sending Done/Error/Stopped.
        let _ = pump.await;

        match result {
            Ok(mut new_state) => {
                reconcile(&mut new_state);
                let payload = serde_json::to_vec(&new_state)
                    .map_err(|e| AgentError::CheckpointStorage(e.to_string()))?;
                self.checkpointer.put(thread_id, parent_sequence, payload).await?;
                let records = to_message_records(&new_state);
                let _ = tx.send(StreamEvent::Done { messages: records }).await;
                Ok(())
            }
            Err(AgentError::Cancelled) => {
                let _ = tx.send(StreamEvent::Stopped).await;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

/// Drops transient assistant messages with neither text nor tool calls (a
/// think round that produced nothing usable, e.g. after a repaired/emptied
/// tool-call list), so checkpointed history never carries dead turns.
fn reconcile(state: &mut ThreadState) {
    state.messages.retain(|m| match m {
        Message::Assistant { content, tool_calls } => !content.is_empty() || !tool_calls.is_empty(),
        _ => true,
    });
}

fn to_message_records(state: &ThreadState) -> Vec<MessageRecord> {
    state
        .messages
        .iter()
        .enumerate()
        .map(|(index, message)| MessageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            order_index: index as u64,
            created_at: chrono::Utc::now(),
            message: message.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySaver;
    use crate::session_config::{EnvironmentDefaults, NoUserSettings, SessionConfigResolver};
    use std::collections::HashMap;

    // AgentFactory builds ChatOpenAI clients internally; these tests exercise
    // reconcile/to_message_records and the busy-lock/validation paths, which
    // never reach an LLM call, so a factory with no extra tools is enough.
    async fn test_factory() -> Arc<AgentFactory> {
        Arc::new(AgentFactory::with_capacity(vec![], 4).await)
    }

    #[test]
    fn reconcile_drops_empty_assistant_messages() {
        let mut state = ThreadState::default();
        state.messages.push(Message::user("hi"));
        state.messages.push(Message::assistant(""));
        state.messages.push(Message::assistant("hello"));
        reconcile(&mut state);
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].content(), "hello");
    }

    #[test]
    fn to_message_records_assigns_increasing_order_index() {
        let mut state = ThreadState::default();
        state.messages.push(Message::user("a"));
        state.messages.push(Message::assistant("b"));
        let records = to_message_records(&state);
        assert_eq!(records[0].order_index, 0);
        assert_eq!(records[1].order_index, 1);
    }

    #[tokio::test]
    async fn run_turn_rejects_empty_thread_id() {
        let factory = test_factory().await;
        let checkpointer: Arc<dyn Checkpointer> = Arc::new(MemorySaver::new());
        let resolver = Arc::new(SessionConfigResolver::new(
            Arc::new(NoUserSettings),
            EnvironmentDefaults::from_map(&HashMap::new()),
        ));
        let runner = Arc::new(AgentRunner::new(factory, checkpointer, resolver));
        let mut rx = runner.run_turn(
            "user-1".into(),
            "".into(),
            "hello".into(),
            CancellationToken::new(),
        );
        let event = rx.recv().await.expect("one event");
        assert!(matches!(event, StreamEvent::Error { .. }));
    }

    #[tokio::test]
    async fn concurrent_turns_on_same_thread_surface_thread_busy() {
        let factory = test_factory().await;
        let checkpointer: Arc<dyn Checkpointer> = Arc::new(MemorySaver::new());
        let resolver = Arc::new(SessionConfigResolver::new(
            Arc::new(NoUserSettings),
            EnvironmentDefaults::from_map(&HashMap::new()),
        ));
        let runner = Arc::new(AgentRunner::new(factory, checkpointer, resolver));
        let lock = runner.lock_for("t1");
        let _held = lock.try_lock().unwrap();
        let mut rx = runner.run_turn(
            "user-1".into(),
            "t1".into(),
            "hello".into(),
            CancellationToken::new(),
        );
        let event = rx.recv().await.expect("one event");
        match event {
            StreamEvent::Error { kind, .. } => assert_eq!(kind, crate::error::ErrorKind::ThreadBusy),
            other => panic!("expected ThreadBusy error, got {other:?}"),
        }
    }
}
