//! Web search chat endpoint
//!
//! POST /api/web-search-tool - chat answered through the Responses API with
//! the hosted `web_search_preview` tool. The provider runs the search loop
//! itself; this handler only maps the event stream onto UI message events.

use axum::{extract::State, response::Response, Json};
use serde_json::json;

use crate::api::relay::{done_marker, ui_event, ui_sse_response};
use crate::error::ApiError;
use crate::schemas::openai::generate_id;
use crate::schemas::responses::{
    ResponseInputItem, ResponseStreamEvent, ResponsesRequest, ResponsesTool,
};
use crate::schemas::ui::{UiChatRequest, UiMessage, UiMessagePart, UiRole, UiStreamEvent};
use crate::server::state::AppState;

const WEB_SEARCH_TOOL_NAME: &str = "web_search_preview";
const STREAM_ERROR_TEXT: &str = "Failed to stream chat completion";

/// Flatten UI messages into Responses API input items (text parts only)
fn build_input(messages: &[UiMessage]) -> Vec<ResponseInputItem> {
    messages
        .iter()
        .filter_map(|message| {
            let role = match message.role {
                UiRole::System => "system",
                UiRole::User => "user",
                UiRole::Assistant => "assistant",
            };
            let text = message
                .parts
                .iter()
                .filter_map(|part| match part {
                    UiMessagePart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n");
            if text.is_empty() {
                None
            } else {
                Some(ResponseInputItem::message(role, text))
            }
        })
        .collect()
}

/// POST /api/web-search-tool - Stream a web-search-augmented chat reply
pub async fn chat_with_web_search(
    State(state): State<AppState>,
    Json(request): Json<UiChatRequest>,
) -> Result<Response, ApiError> {
    let input = build_input(&request.messages);
    if input.is_empty() {
        return Err(ApiError::InvalidRequest(
            "messages must not be empty".to_string(),
        ));
    }

    let responses_request = ResponsesRequest {
        model: state.settings.models.web_search.clone(),
        input,
        tools: Some(vec![ResponsesTool::WebSearchPreview {}]),
        stream: true,
        max_output_tokens: None,
    };

    let mut events = state
        .openai
        .create_response_stream(&responses_request)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Error streaming chat completion");
            ApiError::Upstream(STREAM_ERROR_TEXT.to_string())
        })?;

    let stream = async_stream::stream! {
        let message_id = generate_id("msg");
        yield ui_event(&UiStreamEvent::Start { message_id });
        yield ui_event(&UiStreamEvent::StartStep);

        let mut open_text: Option<String> = None;
        let mut errored = false;

        loop {
            match events.recv().await {
                Ok(Some(event)) => match event {
                    ResponseStreamEvent::OutputItemAdded { item, .. }
                        if item.item_type == "web_search_call" =>
                    {
                        let call_id = item.id.unwrap_or_else(|| generate_id("ws"));
                        yield ui_event(&UiStreamEvent::ToolInputAvailable {
                            tool_call_id: call_id,
                            tool_name: WEB_SEARCH_TOOL_NAME.to_string(),
                            input: json!({}),
                        });
                    }
                    ResponseStreamEvent::OutputItemDone { item, .. }
                        if item.item_type == "web_search_call" =>
                    {
                        let call_id = item.id.unwrap_or_else(|| generate_id("ws"));
                        let status = item.status.unwrap_or_else(|| "completed".to_string());
                        yield ui_event(&UiStreamEvent::ToolOutputAvailable {
                            tool_call_id: call_id,
                            output: json!({ "status": status }),
                        });
                    }
                    ResponseStreamEvent::OutputTextDelta { item_id, delta } => {
                        if open_text.as_deref() != Some(item_id.as_str()) {
                            if let Some(previous) = open_text.take() {
                                yield ui_event(&UiStreamEvent::TextEnd { id: previous });
                            }
                            open_text = Some(item_id.clone());
                            yield ui_event(&UiStreamEvent::TextStart { id: item_id.clone() });
                        }
                        yield ui_event(&UiStreamEvent::TextDelta { id: item_id, delta });
                    }
                    ResponseStreamEvent::OutputTextDone { item_id, .. } => {
                        if open_text.as_deref() == Some(item_id.as_str()) {
                            open_text = None;
                            yield ui_event(&UiStreamEvent::TextEnd { id: item_id });
                        }
                    }
                    ResponseStreamEvent::Completed { .. } => break,
                    ResponseStreamEvent::Failed { response } => {
                        tracing::error!(error = ?response.error, "Response failed");
                        errored = true;
                        yield ui_event(&UiStreamEvent::Error {
                            error_text: STREAM_ERROR_TEXT.to_string(),
                        });
                        break;
                    }
                    ResponseStreamEvent::Error { code, message } => {
                        tracing::error!(code = ?code, error = %message, "Stream error event");
                        errored = true;
                        yield ui_event(&UiStreamEvent::Error {
                            error_text: STREAM_ERROR_TEXT.to_string(),
                        });
                        break;
                    }
                    // Lifecycle and unrecognized events carry nothing to relay
                    _ => {}
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Error streaming chat completion");
                    errored = true;
                    yield ui_event(&UiStreamEvent::Error {
                        error_text: STREAM_ERROR_TEXT.to_string(),
                    });
                    break;
                }
            }
        }

        if let Some(id) = open_text.take() {
            yield ui_event(&UiStreamEvent::TextEnd { id });
        }
        if !errored {
            yield ui_event(&UiStreamEvent::FinishStep);
            yield ui_event(&UiStreamEvent::Finish);
        }
        yield done_marker();
    };

    Ok(ui_sse_response(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_input_flattens_text_parts() {
        let messages: Vec<UiMessage> = serde_json::from_value(json!([
            {
                "id": "m1",
                "role": "user",
                "parts": [
                    {"type": "text", "text": "what happened"},
                    {"type": "text", "text": "in tech today?"}
                ]
            }
        ]))
        .unwrap();

        let input = build_input(&messages);
        assert_eq!(input.len(), 1);
        assert_eq!(input[0].role, "user");
        assert_eq!(input[0].item_type, "message");
    }

    #[test]
    fn test_build_input_skips_textless_messages() {
        let messages: Vec<UiMessage> = serde_json::from_value(json!([
            {
                "id": "m1",
                "role": "assistant",
                "parts": [{"type": "step-start"}]
            },
            {
                "id": "m2",
                "role": "user",
                "parts": [{"type": "text", "text": "hi"}]
            }
        ]))
        .unwrap();

        let input = build_input(&messages);
        assert_eq!(input.len(), 1);
        assert_eq!(input[0].role, "user");
    }
}
