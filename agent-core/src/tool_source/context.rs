//! Per-step context handed to tools alongside their arguments.

use crate::message::Message;

/// Context available to a tool while it executes.
///
/// Set by [`crate::agent::react::ActNode`] before dispatching the round's tool
/// calls. `thread_id`/`user_id` let a tool scope state per conversation or
/// tenant (e.g. the todo-list tools use `thread_id` to namespace storage).
#[derive(Debug, Clone, Default)]
pub struct ToolCallContext {
    pub recent_messages: Vec<Message>,
    pub thread_id: Option<String>,
    pub user_id: Option<String>,
}

impl ToolCallContext {
    pub fn new(recent_messages: Vec<Message>) -> Self {
        Self {
            recent_messages,
            thread_id: None,
            user_id: None,
        }
    }

    pub fn with_ids(mut self, thread_id: Option<String>, user_id: Option<String>) -> Self {
        self.thread_id = thread_id;
        self.user_id = user_id;
        self
    }
}
