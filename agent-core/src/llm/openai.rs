//! `async-openai`-backed [`LlmClient`] against the chat completions API.

use std::time::Duration;

use async_trait::async_trait;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestFunctionMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolArgs, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, FunctionObjectArgs,
};
use async_openai::Client;
use rand::Rng;

use super::{LlmClient, LlmResponse, LlmUsage};
use crate::error::AgentError;
use crate::message::Message;
use crate::state::ToolCall;
use crate::tool_source::ToolSpec;

/// Transient LLM backend failures get up to this many retries before the
/// error propagates as `ErrorKind::LlmBackend`/`LlmTimeout`.
const MAX_RETRIES: usize = 2;

/// Base delay per retry attempt before jitter is applied: 200ms on the first
/// retry, 800ms on the second.
const RETRY_BASE_DELAYS_MS: [u64; MAX_RETRIES] = [200, 800];

/// Transient failures — request timeouts, connection resets, and 5xx
/// responses — are retried; anything else (invalid args, malformed
/// responses, 4xx) fails the turn immediately.
fn is_retryable(err: &OpenAIError) -> bool {
    match err {
        OpenAIError::Reqwest(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        _ => false,
    }
}

/// Full-jitter delay for a retry attempt: uniformly random between 0 and the
/// attempt's base delay, so concurrent retries from many turns don't all
/// land on the backend at once.
fn jittered_delay_ms(attempt: usize) -> u64 {
    let base_ms = RETRY_BASE_DELAYS_MS[attempt];
    rand::thread_rng().gen_range(0..=base_ms)
}

async fn backoff(attempt: usize) {
    tokio::time::sleep(Duration::from_millis(jittered_delay_ms(attempt))).await;
}

/// Chat-completions backend. One instance per (model, credentials); cheap to
/// clone (wraps an `Arc`ed HTTP client internally via `async-openai`).
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    max_output_tokens: Option<u32>,
}

impl ChatOpenAI {
    /// Builds a client from `OPENAI_API_KEY`/`OPENAI_BASE_URL` (or an
    /// OpenAI-compatible gateway set via `OPENAI_BASE_URL`) and the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            max_output_tokens: None,
        }
    }

    /// Builds a client pointed at a specific base URL, for OpenAI-compatible
    /// backends that aren't api.openai.com.
    pub fn with_base_url(model: impl Into<String>, base_url: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_base(base_url);
        Self {
            client: Client::with_config(config),
            model: model.into(),
            max_output_tokens: None,
        }
    }

    /// Builds a client from an explicit per-tenant credential set. Used by
    /// [`crate::factory`] when constructing a [`crate::factory::CompiledAgent`]
    /// for a given [`crate::factory::AgentKey`]: each distinct
    /// (model, api_key, base_url, max_output_tokens) tuple gets its own client.
    pub fn with_credentials(
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        max_output_tokens: Option<u32>,
    ) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key).with_api_base(base_url);
        Self {
            client: Client::with_config(config),
            model: model.into(),
            max_output_tokens,
        }
    }

    fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage, AgentError> {
        let built = match message {
            Message::System { content } => ChatCompletionRequestSystemMessageArgs::default()
                .content(content.clone())
                .build()
                .map(ChatCompletionRequestMessage::System),
            Message::User { content } => ChatCompletionRequestUserMessageArgs::default()
                .content(content.clone())
                .build()
                .map(ChatCompletionRequestMessage::User),
            Message::Assistant { content, .. } => ChatCompletionRequestAssistantMessageArgs::default()
                .content(content.clone())
                .build()
                .map(ChatCompletionRequestMessage::Assistant),
            Message::Tool { call_id, content } => ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(call_id.clone())
                .content(content.clone())
                .build()
                .map(ChatCompletionRequestMessage::Tool)
                .or_else(|_| {
                    ChatCompletionRequestFunctionMessageArgs::default()
                        .name(call_id.clone())
                        .content(content.clone())
                        .build()
                        .map(ChatCompletionRequestMessage::Function)
                }),
        };
        built.map_err(|e| AgentError::LlmBackend(e.to_string()))
    }

    fn to_tool(spec: &ToolSpec) -> Result<ChatCompletionTool, AgentError> {
        let mut function = FunctionObjectArgs::default();
        function.name(spec.name.clone());
        function.parameters(spec.input_schema.clone());
        if let Some(description) = &spec.description {
            function.description(description.clone());
        }
        let function = function.build().map_err(|e| AgentError::LlmBackend(e.to_string()))?;
        ChatCompletionToolArgs::default()
            .r#type(ChatCompletionToolType::Function)
            .function(function)
            .build()
            .map_err(|e| AgentError::LlmBackend(e.to_string()))
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LlmResponse, AgentError> {
        let request_messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>, _>>()?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.model.clone()).messages(request_messages);
        if let Some(max_tokens) = self.max_output_tokens {
            request.max_tokens(max_tokens);
        }
        if !tools.is_empty() {
            let request_tools = tools
                .iter()
                .map(Self::to_tool)
                .collect::<Result<Vec<_>, _>>()?;
            request.tools(request_tools);
        }
        let request = request
            .build()
            .map_err(|e| AgentError::LlmBackend(e.to_string()))?;

        let mut attempt = 0;
        let response = loop {
            match self.client.chat().create(request.clone()).await {
                Ok(response) => break response,
                Err(err) if attempt < MAX_RETRIES && is_retryable(&err) => {
                    tracing::warn!(attempt, error = %err, "retrying transient llm backend failure");
                    backoff(attempt).await;
                    attempt += 1;
                }
                Err(err) => return Err(AgentError::LlmBackend(err.to_string())),
            }
        };

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::LlmBackend("no choices in response".into()))?;

        let content = choice.message.content.unwrap_or_default();
        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                call_id: tc.id,
                name: tc.function.name,
                arguments: serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::Null),
            })
            .collect();

        let usage = response.usage.map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(LlmResponse {
            content,
            tool_calls,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_errors_are_not_retried() {
        let err = OpenAIError::InvalidArgument("bad args".into());
        assert!(!is_retryable(&err));
    }

    #[test]
    fn json_deserialize_errors_are_not_retried() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err = OpenAIError::JSONDeserialize(json_err);
        assert!(!is_retryable(&err));
    }

    #[test]
    fn jittered_delay_never_exceeds_the_attempts_base_delay() {
        for attempt in 0..MAX_RETRIES {
            for _ in 0..20 {
                assert!(jittered_delay_ms(attempt) <= RETRY_BASE_DELAYS_MS[attempt]);
            }
        }
    }
}
