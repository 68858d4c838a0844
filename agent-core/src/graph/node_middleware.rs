//! Node middleware: wrap node.run with external async logic (around pattern).
//!
//! Set via `StateGraph::with_middleware`.

use async_trait::async_trait;
use std::fmt::Debug;
use std::pin::Pin;

use crate::error::AgentError;

use super::Next;

/// Async middleware that wraps node.run; implemented externally.
#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Wraps one node's run. `inner` must be called to actually execute the node.
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: Box<
            dyn FnOnce(S) -> Pin<Box<dyn std::future::Future<Output = Result<(S, Next), AgentError>> + Send>>
                + Send,
        >,
    ) -> Result<(S, Next), AgentError>;
}
