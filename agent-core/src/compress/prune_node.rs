//! Prune node: drops the body of old tool-result messages once the thread
//! holds more tool output than the configured retention budget.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::message::Message;
use crate::state::ThreadState;

use super::config::CompactionConfig;

const PRUNED_PLACEHOLDER: &str = "[pruned: superseded by more recent tool output]";
const CHARS_PER_TOKEN_ESTIMATE: usize = 4;

pub struct PruneNode {
    pub config: CompactionConfig,
}

#[async_trait]
impl Node<ThreadState> for PruneNode {
    fn id(&self) -> &str {
        "prune"
    }

    async fn run(&self, mut state: ThreadState) -> Result<(ThreadState, Next), AgentError> {
        if !self.config.prune {
            return Ok((state, Next::Continue));
        }

        let keep_tokens = self.config.prune_keep_tokens as usize;
        let mut remaining_budget = keep_tokens;

        for message in state.messages.iter_mut().rev() {
            let Message::Tool { content, .. } = message else {
                continue;
            };
            let tokens = content.len() / CHARS_PER_TOKEN_ESTIMATE;
            if tokens <= remaining_budget {
                remaining_budget -= tokens;
                continue;
            }
            let pruned_tokens = tokens.saturating_sub(remaining_budget);
            if let Some(minimum) = self.config.prune_minimum {
                if (pruned_tokens as u32) < minimum {
                    remaining_budget = 0;
                    continue;
                }
            }
            *content = PRUNED_PLACEHOLDER.to_string();
            remaining_budget = 0;
        }

        Ok((state, Next::Continue))
    }
}
