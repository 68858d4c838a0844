//! Observe node: folds the act node's tool results back into the message
//! history, then clears the round's tool_calls/tool_results so think sees a
//! clean slate.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::message::Message;
use crate::state::ThreadState;

#[derive(Default)]
pub struct ObserveNode;

#[async_trait]
impl Node<ThreadState> for ObserveNode {
    fn id(&self) -> &str {
        "observe"
    }

    async fn run(&self, mut state: ThreadState) -> Result<(ThreadState, Next), AgentError> {
        for result in state.tool_results.drain(..) {
            state.messages.push(Message::tool(result.call_id, result.output));
        }
        state.tool_calls.clear();
        Ok((state, Next::Continue))
    }
}
