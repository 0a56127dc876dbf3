//! Image tool chat endpoint
//!
//! POST /api/generate-image-tool - chat with a server-executed
//! `generateImage` tool. Two steps at most: one for the tool call, one for
//! the wrap-up text.

use axum::{extract::State, response::Response, Json};

use crate::api::relay::{stream_ui_messages, RelayOptions};
use crate::error::ApiError;
use crate::schemas::ui::{to_chat_messages, UiChatRequest};
use crate::server::state::AppState;
use crate::tools::{builtin, ToolSet};

/// POST /api/generate-image-tool - Stream a chat reply with image generation
pub async fn chat_with_image_tool(
    State(state): State<AppState>,
    Json(request): Json<UiChatRequest>,
) -> Result<Response, ApiError> {
    let messages = to_chat_messages(&request.messages);
    if messages.is_empty() {
        return Err(ApiError::InvalidRequest(
            "messages must not be empty".to_string(),
        ));
    }

    let tools = ToolSet::new().with(builtin::generate_image(
        state.openai.clone(),
        &state.settings,
    ));

    let options = RelayOptions::new(state.settings.models.chat.clone())
        .with_tools(tools)
        .with_max_steps(2);

    stream_ui_messages(state, messages, options).await
}
