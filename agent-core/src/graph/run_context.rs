//! Run-scoped context threaded through [`crate::graph::CompiledStateGraph::invoke_with_context`].

use std::fmt::Debug;
use std::marker::PhantomData;

use tokio_util::sync::CancellationToken;

use crate::stream::StreamSender;

/// Context available to every node during one run: the turn's event sender
/// and cancellation token. `thread_id`/`user_id` let nodes and tools scope
/// side effects without threading them through the state type.
pub struct RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub stream: Option<StreamSender>,
    pub cancel: CancellationToken,
    pub thread_id: String,
    pub user_id: String,
    /// Per-turn recursion ceiling (from [`crate::session_config::SessionConfig::recursion_bound`]),
    /// distinct from the compiled graph's own fixed [`super::CompiledStateGraph::recursion_limit`]:
    /// the graph limit is a high, build-time safety ceiling shared by every cached agent instance,
    /// while this is the per-turn bound a caller may tighten. `None` means "use the graph's limit only".
    pub recursion_bound: Option<usize>,
    _state: PhantomData<S>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(thread_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            stream: None,
            cancel: CancellationToken::new(),
            thread_id: thread_id.into(),
            user_id: user_id.into(),
            recursion_bound: None,
            _state: PhantomData,
        }
    }

    pub fn with_stream(mut self, stream: StreamSender) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_recursion_bound(mut self, bound: usize) -> Self {
        self.recursion_bound = Some(bound);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
