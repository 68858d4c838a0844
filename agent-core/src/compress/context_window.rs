//! Overflow detection: decides whether the conversation needs compaction.

use crate::message::Message;

/// Rough chars-per-token ratio used when no usage figures are available yet
/// (e.g. the first turn, or a mock LLM that doesn't report usage).
const CHARS_PER_TOKEN_ESTIMATE: usize = 4;

pub struct ContextWindowCheck<'a> {
    pub messages: &'a [Message],
    pub usage: Option<(u32, u32)>,
    pub max_context_tokens: u32,
    pub reserve_tokens: u32,
}

fn estimate_tokens(messages: &[Message]) -> u32 {
    let chars: usize = messages.iter().map(|m| m.content().len()).sum();
    (chars / CHARS_PER_TOKEN_ESTIMATE) as u32
}

/// True if the estimated context size plus the reserved generation budget
/// would exceed `max_context_tokens`. Prefers the LLM-reported usage when
/// present; falls back to a character-count heuristic otherwise.
pub fn is_overflow(check: &ContextWindowCheck) -> bool {
    let used = match check.usage {
        Some((prompt, completion)) => prompt + completion,
        None => estimate_tokens(check.messages),
    };
    used + check.reserve_tokens > check.max_context_tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_overflow_when_well_under_budget() {
        let messages = vec![Message::user("hello")];
        let check = ContextWindowCheck {
            messages: &messages,
            usage: None,
            max_context_tokens: 128_000,
            reserve_tokens: 4096,
        };
        assert!(!is_overflow(&check));
    }

    #[test]
    fn overflow_when_usage_exceeds_budget() {
        let messages = vec![Message::user("hello")];
        let check = ContextWindowCheck {
            messages: &messages,
            usage: Some((120_000, 5_000)),
            max_context_tokens: 128_000,
            reserve_tokens: 4096,
        };
        assert!(is_overflow(&check));
    }

    #[test]
    fn overflow_via_character_heuristic_without_usage() {
        let messages = vec![Message::user("x".repeat(100_000))];
        let check = ContextWindowCheck {
            messages: &messages,
            usage: None,
            max_context_tokens: 1_000,
            reserve_tokens: 0,
        };
        assert!(is_overflow(&check));
    }
}
