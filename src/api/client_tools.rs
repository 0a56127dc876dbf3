//! Client-side tools chat endpoint
//!
//! POST /api/client-side-tools - chat with one server-executed tool
//! (`generateImage`) and two client-executed ones (`changeBackground`,
//! `removeBackground`). A client tool call ends the stream; the browser
//! runs it and posts the result back with the next request.

use axum::{extract::State, response::Response, Json};

use crate::api::relay::{stream_ui_messages, RelayOptions};
use crate::error::ApiError;
use crate::schemas::ui::{to_chat_messages, UiChatRequest};
use crate::server::state::AppState;
use crate::tools::{builtin, ToolSet};

/// POST /api/client-side-tools - Stream a chat reply with mixed tools
pub async fn chat_with_client_tools(
    State(state): State<AppState>,
    Json(request): Json<UiChatRequest>,
) -> Result<Response, ApiError> {
    let messages = to_chat_messages(&request.messages);
    if messages.is_empty() {
        return Err(ApiError::InvalidRequest(
            "messages must not be empty".to_string(),
        ));
    }

    let tools = ToolSet::new()
        .with(builtin::generate_image(
            state.openai.clone(),
            &state.settings,
        ))
        .with(builtin::change_background())
        .with(builtin::remove_background());

    let options = RelayOptions::new(state.settings.models.chat.clone())
        .with_tools(tools)
        .with_max_steps(3);

    stream_ui_messages(state, messages, options).await
}
