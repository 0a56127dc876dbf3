//! Streaming relay
//!
//! The chat-shaped endpoints share this module: it opens a streaming chat
//! completion upstream, forwards text deltas as UI message events, and runs
//! declared tools between steps. Tools without a server-side executor end
//! the turn; the browser executes them and posts the result back inside the
//! next request's message history.

use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::{sse::Event, IntoResponse, Response, Sse},
};
use bytes::Bytes;
use futures::stream::Stream;
use serde_json::Value;
use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::error::ApiError;
use crate::schemas::openai::{
    generate_id, ChatCompletionRequest, ChatMessage, FunctionCall, ToolCall, ToolCallDelta,
};
use crate::schemas::ui::{UiStreamEvent, UI_MESSAGE_STREAM_HEADER};
use crate::server::state::AppState;
use crate::services::ChatStream;
use crate::tools::ToolSet;

/// Per-endpoint relay configuration
pub struct RelayOptions {
    pub model: String,
    pub tools: ToolSet,
    pub max_steps: usize,
}

impl RelayOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            tools: ToolSet::new(),
            max_steps: 1,
        }
    }

    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }
}

// ============================================================================
// Tool Call Accumulation
// ============================================================================

/// Reassembles tool calls from the indexed fragments of a chunk stream
#[derive(Debug, Default)]
pub(crate) struct ToolCallAccumulator {
    calls: BTreeMap<u32, PendingToolCall>,
}

#[derive(Debug, Default)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// A fully accumulated tool call
#[derive(Debug, Clone)]
pub(crate) struct CompletedToolCall {
    pub id: String,
    pub name: String,
    /// Parsed arguments (falls back to an empty object / raw string)
    pub arguments: Value,
    /// Raw argument JSON, replayed verbatim in the next request
    pub raw_arguments: String,
}

impl ToolCallAccumulator {
    pub(crate) fn push(&mut self, delta: &ToolCallDelta) {
        let entry = self.calls.entry(delta.index).or_default();
        if let Some(ref id) = delta.id {
            entry.id = id.clone();
        }
        if let Some(ref function) = delta.function {
            if let Some(ref name) = function.name {
                entry.name.push_str(name);
            }
            if let Some(ref arguments) = function.arguments {
                entry.arguments.push_str(arguments);
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub(crate) fn finish(self) -> Vec<CompletedToolCall> {
        self.calls
            .into_values()
            .map(|call| {
                let raw = if call.arguments.is_empty() {
                    "{}".to_string()
                } else {
                    call.arguments
                };
                let arguments = serde_json::from_str(&raw)
                    .unwrap_or_else(|_| Value::String(raw.clone()));
                CompletedToolCall {
                    id: call.id,
                    name: call.name,
                    arguments,
                    raw_arguments: raw,
                }
            })
            .collect()
    }
}

// ============================================================================
// SSE Helpers
// ============================================================================

pub(crate) fn ui_event(event: &UiStreamEvent) -> Result<Event, Infallible> {
    let json = serde_json::to_string(event).unwrap_or_default();
    Ok(Event::default().data(json))
}

pub(crate) fn done_marker() -> Result<Event, Infallible> {
    Ok(Event::default().data("[DONE]"))
}

/// Wrap a UI event stream into an SSE response with the protocol header set
pub(crate) fn ui_sse_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    let mut response = Sse::new(stream).into_response();
    response.headers_mut().insert(
        UI_MESSAGE_STREAM_HEADER,
        HeaderValue::from_static("v1"),
    );
    response
}

fn build_request(options: &RelayOptions, messages: &[ChatMessage]) -> ChatCompletionRequest {
    ChatCompletionRequest::new(options.model.clone(), messages.to_vec())
        .with_stream()
        .with_tools(options.tools.to_wire())
}

const STREAM_ERROR_TEXT: &str = "Failed to stream chat completion";

// ============================================================================
// UI Message Relay
// ============================================================================

/// Stream an assistant reply as UI message events.
///
/// Runs up to `max_steps` upstream calls: a step that finishes with tool
/// calls executes the server-side tools, appends the exchange to the message
/// history and starts the next step. The first upstream call happens before
/// the response is committed, so connection-level failures still produce a
/// regular 500.
pub async fn stream_ui_messages(
    state: AppState,
    mut messages: Vec<ChatMessage>,
    options: RelayOptions,
) -> Result<Response, ApiError> {
    let first = state
        .openai
        .chat_completion_stream(&build_request(&options, &messages))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Error streaming chat completion");
            ApiError::Upstream(STREAM_ERROR_TEXT.to_string())
        })?;

    let stream = async_stream::stream! {
        let message_id = generate_id("msg");
        yield ui_event(&UiStreamEvent::Start { message_id });

        let mut next_stream = Some(first);
        let mut step = 0;
        let mut errored = false;

        'steps: loop {
            let mut chat_stream = match next_stream.take() {
                Some(s) => s,
                None => match state
                    .openai
                    .chat_completion_stream(&build_request(&options, &messages))
                    .await
                {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::error!(error = %e, "Error streaming chat completion");
                        errored = true;
                        yield ui_event(&UiStreamEvent::Error {
                            error_text: STREAM_ERROR_TEXT.to_string(),
                        });
                        break 'steps;
                    }
                },
            };

            step += 1;
            yield ui_event(&UiStreamEvent::StartStep);

            let text_id = generate_id("txt");
            let mut text_open = false;
            let mut text_buffer = String::new();
            let mut accumulator = ToolCallAccumulator::default();
            let mut finish_reason: Option<String> = None;

            loop {
                match chat_stream.recv().await {
                    Ok(Some(chunk)) => {
                        for choice in &chunk.choices {
                            if let Some(ref content) = choice.delta.content {
                                if !content.is_empty() {
                                    if !text_open {
                                        text_open = true;
                                        yield ui_event(&UiStreamEvent::TextStart {
                                            id: text_id.clone(),
                                        });
                                    }
                                    text_buffer.push_str(content);
                                    yield ui_event(&UiStreamEvent::TextDelta {
                                        id: text_id.clone(),
                                        delta: content.clone(),
                                    });
                                }
                            }
                            if let Some(ref tool_calls) = choice.delta.tool_calls {
                                for delta in tool_calls {
                                    accumulator.push(delta);
                                }
                            }
                            if let Some(ref reason) = choice.finish_reason {
                                finish_reason = Some(reason.clone());
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "Error streaming chat completion");
                        errored = true;
                        yield ui_event(&UiStreamEvent::Error {
                            error_text: STREAM_ERROR_TEXT.to_string(),
                        });
                        break 'steps;
                    }
                }
            }

            if text_open {
                yield ui_event(&UiStreamEvent::TextEnd { id: text_id.clone() });
            }

            let wants_tools =
                finish_reason.as_deref() == Some("tool_calls") && !accumulator.is_empty();

            if !wants_tools {
                yield ui_event(&UiStreamEvent::FinishStep);
                break 'steps;
            }

            let calls = accumulator.finish();

            // Replay the assistant turn so the next step sees it
            let assistant_content = if text_buffer.is_empty() {
                None
            } else {
                Some(text_buffer.clone())
            };
            messages.push(ChatMessage::assistant_tool_calls(
                assistant_content,
                calls
                    .iter()
                    .map(|call| ToolCall {
                        id: call.id.clone(),
                        tool_type: "function".to_string(),
                        function: FunctionCall {
                            name: call.name.clone(),
                            arguments: call.raw_arguments.clone(),
                        },
                    })
                    .collect(),
            ));

            let mut pending_client_tool = false;

            for call in &calls {
                yield ui_event(&UiStreamEvent::ToolInputAvailable {
                    tool_call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    input: call.arguments.clone(),
                });

                let tool = match options.tools.find(&call.name) {
                    Some(tool) => tool,
                    None => {
                        tracing::warn!(tool = %call.name, "Model called an undeclared tool");
                        errored = true;
                        yield ui_event(&UiStreamEvent::Error {
                            error_text: format!("Unknown tool: {}", call.name),
                        });
                        break 'steps;
                    }
                };

                match tool.executor {
                    Some(ref executor) => match executor.execute(call.arguments.clone()).await {
                        Ok(output) => {
                            yield ui_event(&UiStreamEvent::ToolOutputAvailable {
                                tool_call_id: call.id.clone(),
                                output: output.clone(),
                            });
                            let result_text = match tool.model_output {
                                Some(ref text) => text.clone(),
                                None => match output {
                                    Value::String(s) => s,
                                    other => other.to_string(),
                                },
                            };
                            messages.push(ChatMessage::tool_result(call.id.clone(), result_text));
                        }
                        Err(e) => {
                            tracing::error!(tool = %call.name, error = %e, "Tool execution failed");
                            errored = true;
                            yield ui_event(&UiStreamEvent::Error {
                                error_text: format!("Tool {} failed", call.name),
                            });
                            break 'steps;
                        }
                    },
                    // Client-executed tool: the browser takes over from here
                    None => pending_client_tool = true,
                }
            }

            yield ui_event(&UiStreamEvent::FinishStep);

            if pending_client_tool || step >= options.max_steps {
                break 'steps;
            }
        }

        if !errored {
            yield ui_event(&UiStreamEvent::Finish);
        }
        yield done_marker();
    };

    Ok(ui_sse_response(stream))
}

// ============================================================================
// Plain Text Relay
// ============================================================================

/// Relay a chat completion stream as an incremental `text/plain` body
///
/// Used by the endpoints whose pages consume a raw token stream rather than
/// UI message events. Mid-stream errors are logged and end the body.
pub fn text_stream_response(mut chat_stream: ChatStream) -> Response {
    let body_stream = async_stream::stream! {
        loop {
            match chat_stream.recv().await {
                Ok(Some(chunk)) => {
                    for choice in &chunk.choices {
                        if let Some(ref content) = choice.delta.content {
                            if !content.is_empty() {
                                yield Ok::<Bytes, Infallible>(Bytes::from(content.clone()));
                            }
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Error streaming completion");
                    break;
                }
            }
        }
    };

    let mut response = Response::new(Body::from_stream(body_stream));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::openai::FunctionCallDelta;

    fn delta(
        index: u32,
        id: Option<&str>,
        name: Option<&str>,
        arguments: Option<&str>,
    ) -> ToolCallDelta {
        ToolCallDelta {
            index,
            id: id.map(str::to_string),
            tool_type: id.map(|_| "function".to_string()),
            function: Some(FunctionCallDelta {
                name: name.map(str::to_string),
                arguments: arguments.map(str::to_string),
            }),
        }
    }

    #[test]
    fn test_accumulator_reassembles_fragments() {
        let mut accumulator = ToolCallAccumulator::default();
        accumulator.push(&delta(0, Some("call_1"), Some("generateImage"), None));
        accumulator.push(&delta(0, None, None, Some("{\"prompt\":")));
        accumulator.push(&delta(0, None, None, Some("\"a cat\"}")));

        let calls = accumulator.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].name, "generateImage");
        assert_eq!(calls[0].arguments["prompt"], "a cat");
        assert_eq!(calls[0].raw_arguments, "{\"prompt\":\"a cat\"}");
    }

    #[test]
    fn test_accumulator_keeps_parallel_calls_ordered() {
        let mut accumulator = ToolCallAccumulator::default();
        accumulator.push(&delta(1, Some("call_b"), Some("removeBackground"), Some("{}")));
        accumulator.push(&delta(0, Some("call_a"), Some("generateImage"), Some("{}")));

        let calls = accumulator.finish();
        assert_eq!(calls[0].id, "call_a");
        assert_eq!(calls[1].id, "call_b");
    }

    #[test]
    fn test_accumulator_defaults_empty_arguments() {
        let mut accumulator = ToolCallAccumulator::default();
        accumulator.push(&delta(0, Some("call_1"), Some("generateImage"), None));

        let calls = accumulator.finish();
        assert_eq!(calls[0].raw_arguments, "{}");
        assert!(calls[0].arguments.is_object());
    }

    #[test]
    fn test_accumulator_preserves_unparsable_arguments() {
        let mut accumulator = ToolCallAccumulator::default();
        accumulator.push(&delta(0, Some("call_1"), Some("generateImage"), Some("{\"broken\"")));

        let calls = accumulator.finish();
        assert_eq!(calls[0].arguments, Value::String("{\"broken\"".to_string()));
    }

    #[test]
    fn test_relay_options_clamp_steps() {
        let options = RelayOptions::new("gpt-5-nano").with_max_steps(0);
        assert_eq!(options.max_steps, 1);
    }
}
