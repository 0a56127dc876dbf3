//! OpenAI Responses API schema definitions
//!
//! The web-search endpoint uses the Responses API, since the hosted
//! `web_search_preview` tool is only available there. Only the subset the
//! relay needs is modeled; unknown stream event types are tolerated.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request Types
// ============================================================================

/// Responses API request (POST /v1/responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesRequest {
    pub model: String,

    /// Conversation input as typed items
    pub input: Vec<ResponseInputItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ResponsesTool>>,

    #[serde(default)]
    pub stream: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// One input item (a message with typed content)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseInputItem {
    #[serde(rename = "type")]
    pub item_type: String,
    pub role: String,
    pub content: Vec<ResponseInputContent>,
}

impl ResponseInputItem {
    pub fn message(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            item_type: "message".to_string(),
            role: role.into(),
            content: vec![ResponseInputContent::InputText { text: text.into() }],
        }
    }
}

/// Typed content inside an input item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseInputContent {
    InputText { text: String },
}

/// Hosted tools available to a response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesTool {
    WebSearchPreview {},
}

// ============================================================================
// Streaming Event Types
// ============================================================================

/// Output item announced by the stream (message, web_search_call, ...)
#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Response envelope carried by lifecycle events
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// One event of a streamed response, tagged by `type`
///
/// The API emits more event types than the relay cares about; anything
/// unrecognized deserializes to `Unknown` and is skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseStreamEvent {
    #[serde(rename = "response.created")]
    Created { response: ResponsePayload },

    #[serde(rename = "response.output_item.added")]
    OutputItemAdded { output_index: u32, item: OutputItem },

    #[serde(rename = "response.output_item.done")]
    OutputItemDone { output_index: u32, item: OutputItem },

    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta { item_id: String, delta: String },

    #[serde(rename = "response.output_text.done")]
    OutputTextDone { item_id: String, text: String },

    #[serde(rename = "response.completed")]
    Completed { response: ResponsePayload },

    #[serde(rename = "response.failed")]
    Failed { response: ResponsePayload },

    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        code: Option<String>,
        message: String,
    },

    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = ResponsesRequest {
            model: "gpt-5-nano".to_string(),
            input: vec![ResponseInputItem::message("user", "what happened today?")],
            tools: Some(vec![ResponsesTool::WebSearchPreview {}]),
            stream: true,
            max_output_tokens: None,
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["input"][0]["type"], "message");
        assert_eq!(value["input"][0]["content"][0]["type"], "input_text");
        assert_eq!(value["tools"][0]["type"], "web_search_preview");
        assert_eq!(value["stream"], true);
    }

    #[test]
    fn test_text_delta_event_deserialization() {
        let data = json!({
            "type": "response.output_text.delta",
            "item_id": "msg_1",
            "output_index": 1,
            "content_index": 0,
            "delta": "Today"
        });

        let event: ResponseStreamEvent = serde_json::from_value(data).unwrap();
        match event {
            ResponseStreamEvent::OutputTextDelta { item_id, delta } => {
                assert_eq!(item_id, "msg_1");
                assert_eq!(delta, "Today");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_web_search_item_deserialization() {
        let data = json!({
            "type": "response.output_item.added",
            "output_index": 0,
            "item": {"id": "ws_1", "type": "web_search_call", "status": "in_progress"}
        });

        let event: ResponseStreamEvent = serde_json::from_value(data).unwrap();
        match event {
            ResponseStreamEvent::OutputItemAdded { item, .. } => {
                assert_eq!(item.item_type, "web_search_call");
                assert_eq!(item.status.as_deref(), Some("in_progress"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_is_tolerated() {
        let data = json!({
            "type": "response.reasoning_summary_text.delta",
            "delta": "thinking"
        });

        let event: ResponseStreamEvent = serde_json::from_value(data).unwrap();
        assert!(matches!(event, ResponseStreamEvent::Unknown));
    }
}
