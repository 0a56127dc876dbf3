//! UI message protocol
//!
//! The playground pages send their conversation history as UI messages
//! (`{id, role, parts[]}`) and consume assistant replies as a server-sent
//! stream of UI events terminated by `[DONE]`. This module defines both
//! halves plus the conversion from UI messages to provider chat messages.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schemas::openai::{ChatMessage, ContentPart, FunctionCall, ImageUrl, ToolCall};

// ============================================================================
// Inbound Messages
// ============================================================================

/// Chat request body sent by the UI
///
/// The UI transport also sends bookkeeping fields (`id`, `trigger`,
/// `messageId`); only the messages matter here and unknown fields are
/// ignored by serde.
#[derive(Debug, Clone, Deserialize)]
pub struct UiChatRequest {
    pub messages: Vec<UiMessage>,
}

/// One UI message
#[derive(Debug, Clone, Deserialize)]
pub struct UiMessage {
    #[serde(default)]
    pub id: String,
    pub role: UiRole,
    pub parts: Vec<UiMessagePart>,
}

/// UI message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiRole {
    System,
    User,
    Assistant,
}

/// One part of a UI message
///
/// Tool parts carry a dynamic tag (`tool-<name>`), so this is decoded by
/// hand rather than with a derived tagged enum. Part types the relay has
/// no use for (`step-start`, `reasoning`, ...) decode to `Ignored`.
#[derive(Debug, Clone, PartialEq)]
pub enum UiMessagePart {
    Text {
        text: String,
    },
    File {
        media_type: String,
        url: String,
        filename: Option<String>,
    },
    Tool {
        name: String,
        tool_call_id: String,
        state: String,
        input: Option<Value>,
        output: Option<Value>,
    },
    Ignored,
}

impl<'de> Deserialize<'de> for UiMessagePart {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let part_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| de::Error::missing_field("type"))?;

        if let Some(tool_name) = part_type.strip_prefix("tool-") {
            return Ok(UiMessagePart::Tool {
                name: tool_name.to_string(),
                tool_call_id: value
                    .get("toolCallId")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                state: value
                    .get("state")
                    .and_then(Value::as_str)
                    .unwrap_or("input-available")
                    .to_string(),
                input: value.get("input").cloned(),
                output: value.get("output").cloned(),
            });
        }

        match part_type {
            "text" => Ok(UiMessagePart::Text {
                text: value
                    .get("text")
                    .and_then(Value::as_str)
                    .ok_or_else(|| de::Error::missing_field("text"))?
                    .to_string(),
            }),
            "file" => Ok(UiMessagePart::File {
                media_type: value
                    .get("mediaType")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                url: value
                    .get("url")
                    .and_then(Value::as_str)
                    .ok_or_else(|| de::Error::missing_field("url"))?
                    .to_string(),
                filename: value
                    .get("filename")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            _ => Ok(UiMessagePart::Ignored),
        }
    }
}

/// State value a tool part must reach before its result is usable
pub const TOOL_STATE_OUTPUT_AVAILABLE: &str = "output-available";

// ============================================================================
// Conversion to Provider Messages
// ============================================================================

/// Convert UI messages into provider chat messages.
///
/// User file parts with an image media type become `image_url` content
/// parts (data URLs pass through verbatim); other files are skipped with a
/// warning. Assistant tool parts that reached `output-available` are
/// replayed as `tool_calls` plus `tool` role result messages so the model
/// sees the full tool exchange.
pub fn to_chat_messages(messages: &[UiMessage]) -> Vec<ChatMessage> {
    let mut converted = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            UiRole::System => {
                let text = joined_text(message);
                if !text.is_empty() {
                    converted.push(ChatMessage::system(text));
                }
            }
            UiRole::User => converted.push(convert_user_message(message)),
            UiRole::Assistant => convert_assistant_message(message, &mut converted),
        }
    }

    converted
}

fn joined_text(message: &UiMessage) -> String {
    message
        .parts
        .iter()
        .filter_map(|part| match part {
            UiMessagePart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn convert_user_message(message: &UiMessage) -> ChatMessage {
    let mut parts = Vec::new();
    let mut has_files = false;

    for part in &message.parts {
        match part {
            UiMessagePart::Text { text } => parts.push(ContentPart::Text { text: text.clone() }),
            UiMessagePart::File {
                media_type, url, ..
            } => {
                if media_type.starts_with("image/") {
                    has_files = true;
                    parts.push(ContentPart::ImageUrl {
                        image_url: ImageUrl { url: url.clone() },
                    });
                } else {
                    tracing::warn!(media_type = %media_type, "Skipping unsupported file part");
                }
            }
            UiMessagePart::Tool { .. } | UiMessagePart::Ignored => {}
        }
    }

    if has_files {
        ChatMessage::user_parts(parts)
    } else {
        ChatMessage::user(joined_text(message))
    }
}

fn convert_assistant_message(message: &UiMessage, out: &mut Vec<ChatMessage>) {
    let text = joined_text(message);
    let mut tool_calls = Vec::new();
    let mut tool_results = Vec::new();

    for part in &message.parts {
        if let UiMessagePart::Tool {
            name,
            tool_call_id,
            state,
            input,
            output,
        } = part
        {
            if state != TOOL_STATE_OUTPUT_AVAILABLE {
                continue;
            }
            let arguments = input
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "{}".to_string());
            tool_calls.push(ToolCall {
                id: tool_call_id.clone(),
                tool_type: "function".to_string(),
                function: FunctionCall {
                    name: name.clone(),
                    arguments,
                },
            });
            tool_results.push(ChatMessage::tool_result(
                tool_call_id.clone(),
                stringify_output(output.as_ref()),
            ));
        }
    }

    if tool_calls.is_empty() {
        if !text.is_empty() {
            out.push(ChatMessage::assistant(text));
        }
        return;
    }

    let content = if text.is_empty() { None } else { Some(text) };
    out.push(ChatMessage::assistant_tool_calls(content, tool_calls));
    out.extend(tool_results);
}

fn stringify_output(output: Option<&Value>) -> String {
    match output {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

// ============================================================================
// Outbound Stream Events
// ============================================================================

/// One event of the UI message stream
///
/// Serialized as the `data:` payload of an SSE event; the stream ends with
/// a literal `[DONE]` marker and is flagged to the transport with the
/// `x-vercel-ai-ui-message-stream: v1` response header.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiStreamEvent {
    Start {
        #[serde(rename = "messageId")]
        message_id: String,
    },
    StartStep,
    TextStart {
        id: String,
    },
    TextDelta {
        id: String,
        delta: String,
    },
    TextEnd {
        id: String,
    },
    ToolInputAvailable {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
        input: Value,
    },
    ToolOutputAvailable {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        output: Value,
    },
    FinishStep,
    Finish,
    Error {
        #[serde(rename = "errorText")]
        error_text: String,
    },
}

/// Response header marking the UI message stream protocol version
pub const UI_MESSAGE_STREAM_HEADER: &str = "x-vercel-ai-ui-message-stream";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::openai::{ChatRole, MessageContent};
    use serde_json::json;

    fn parse_message(value: Value) -> UiMessage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_deserialize_text_message() {
        let message = parse_message(json!({
            "id": "m1",
            "role": "user",
            "parts": [{"type": "text", "text": "hello"}]
        }));

        assert_eq!(message.role, UiRole::User);
        assert_eq!(
            message.parts,
            vec![UiMessagePart::Text {
                text: "hello".to_string()
            }]
        );
    }

    #[test]
    fn test_deserialize_tool_part() {
        let message = parse_message(json!({
            "id": "m2",
            "role": "assistant",
            "parts": [{
                "type": "tool-removeBackground",
                "toolCallId": "call_1",
                "state": "output-available",
                "input": {"imageUrl": "https://img.example/a.jpg"},
                "output": "https://img.example/a-nobg.jpg"
            }]
        }));

        match &message.parts[0] {
            UiMessagePart::Tool {
                name,
                tool_call_id,
                state,
                output,
                ..
            } => {
                assert_eq!(name, "removeBackground");
                assert_eq!(tool_call_id, "call_1");
                assert_eq!(state, TOOL_STATE_OUTPUT_AVAILABLE);
                assert_eq!(output.as_ref().unwrap(), "https://img.example/a-nobg.jpg");
            }
            other => panic!("unexpected part: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_part_types_are_ignored() {
        let message = parse_message(json!({
            "id": "m3",
            "role": "assistant",
            "parts": [
                {"type": "step-start"},
                {"type": "text", "text": "done"}
            ]
        }));

        assert_eq!(message.parts[0], UiMessagePart::Ignored);
        assert_eq!(
            message.parts[1],
            UiMessagePart::Text {
                text: "done".to_string()
            }
        );
    }

    #[test]
    fn test_convert_plain_user_message() {
        let messages = vec![parse_message(json!({
            "id": "m1",
            "role": "user",
            "parts": [{"type": "text", "text": "hi"}]
        }))];

        let converted = to_chat_messages(&messages);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role, ChatRole::User);
        assert!(matches!(
            converted[0].content,
            Some(MessageContent::Text(ref t)) if t == "hi"
        ));
    }

    #[test]
    fn test_convert_user_message_with_image_file() {
        let messages = vec![parse_message(json!({
            "id": "m1",
            "role": "user",
            "parts": [
                {"type": "text", "text": "what is this?"},
                {"type": "file", "mediaType": "image/png", "url": "data:image/png;base64,AAAA"}
            ]
        }))];

        let converted = to_chat_messages(&messages);
        match converted[0].content.as_ref().unwrap() {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(parts[1], ContentPart::ImageUrl { .. }));
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_convert_assistant_tool_exchange() {
        let messages = vec![parse_message(json!({
            "id": "m1",
            "role": "assistant",
            "parts": [{
                "type": "tool-generateImage",
                "toolCallId": "call_9",
                "state": "output-available",
                "input": {"prompt": "a red fox"},
                "output": "https://img.example/fox.jpg"
            }]
        }))];

        let converted = to_chat_messages(&messages);
        assert_eq!(converted.len(), 2);

        let calls = converted[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "generateImage");
        assert_eq!(calls[0].id, "call_9");

        assert_eq!(converted[1].role, ChatRole::Tool);
        assert_eq!(converted[1].tool_call_id.as_deref(), Some("call_9"));
    }

    #[test]
    fn test_tool_part_without_output_is_not_replayed() {
        let messages = vec![parse_message(json!({
            "id": "m1",
            "role": "assistant",
            "parts": [{
                "type": "tool-changeBackground",
                "toolCallId": "call_2",
                "state": "input-available",
                "input": {"imageUrl": "x", "backgroundPrompt": "beach"}
            }]
        }))];

        assert!(to_chat_messages(&messages).is_empty());
    }

    #[test]
    fn test_stream_event_serialization() {
        let event = UiStreamEvent::TextDelta {
            id: "txt_1".to_string(),
            delta: "Hel".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({"type": "text-delta", "id": "txt_1", "delta": "Hel"}));

        let event = UiStreamEvent::ToolInputAvailable {
            tool_call_id: "call_1".to_string(),
            tool_name: "generateImage".to_string(),
            input: json!({"prompt": "a cat"}),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "tool-input-available");
        assert_eq!(value["toolCallId"], "call_1");
        assert_eq!(value["toolName"], "generateImage");

        let value = serde_json::to_value(&UiStreamEvent::FinishStep).unwrap();
        assert_eq!(value, json!({"type": "finish-step"}));
    }
}
