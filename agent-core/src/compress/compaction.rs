//! Summarizes older conversation history into a single message when the
//! context window would otherwise overflow.

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;

use super::config::CompactionConfig;

const SUMMARY_PROMPT: &str = "Summarize the conversation so far in a few sentences, \
preserving any facts, decisions, or open tasks a continuing assistant would need.";

/// Replaces every message before the most recent `compact_keep_recent` with a
/// single system message summarizing them. If there aren't enough messages
/// to make a summary worthwhile, returns `messages` unchanged.
pub async fn compact(
    messages: &[Message],
    llm: &dyn LlmClient,
    config: &CompactionConfig,
) -> Result<Vec<Message>, AgentError> {
    if messages.len() <= config.compact_keep_recent {
        return Ok(messages.to_vec());
    }

    let split = messages.len() - config.compact_keep_recent;
    let (old, recent) = messages.split_at(split);

    let mut summary_request: Vec<Message> = old.to_vec();
    summary_request.push(Message::user(SUMMARY_PROMPT));

    let response = llm.invoke(&summary_request, &[]).await?;

    let mut compacted = Vec::with_capacity(recent.len() + 1);
    compacted.push(Message::system(format!(
        "Summary of earlier conversation: {}",
        response.content
    )));
    compacted.extend_from_slice(recent);
    Ok(compacted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;

    #[tokio::test]
    async fn short_history_is_left_untouched() {
        let llm = MockLlm::fixed_text("summary");
        let messages = vec![Message::user("hi"), Message::assistant("hello")];
        let config = CompactionConfig {
            compact_keep_recent: 20,
            ..Default::default()
        };
        let out = compact(&messages, &llm, &config).await.unwrap();
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn long_history_is_summarized_and_recent_kept() {
        let llm = MockLlm::fixed_text("the user asked about pricing");
        let mut messages = Vec::new();
        for i in 0..10 {
            messages.push(Message::user(format!("message {i}")));
        }
        let config = CompactionConfig {
            compact_keep_recent: 3,
            ..Default::default()
        };
        let out = compact(&messages, &llm, &config).await.unwrap();
        assert_eq!(out.len(), 4);
        assert!(matches!(&out[0], Message::System { content } if content.contains("pricing")));
        assert_eq!(out[1].content(), "message 7");
        assert_eq!(out[3].content(), "message 9");
    }
}
