//! Chat endpoints
//!
//! POST /api/chat and POST /api/multi-modal-chat - UI message history in,
//! streamed assistant reply out. The multi-modal variant only differs in
//! what the pages send: its user messages may carry image file parts, which
//! the conversion maps to `image_url` content.

use axum::{extract::State, response::Response, Json};

use crate::api::relay::{stream_ui_messages, RelayOptions};
use crate::error::ApiError;
use crate::schemas::openai::ChatMessage;
use crate::schemas::ui::{to_chat_messages, UiChatRequest};
use crate::server::state::AppState;

fn converted_messages(request: &UiChatRequest) -> Result<Vec<ChatMessage>, ApiError> {
    let messages = to_chat_messages(&request.messages);
    if messages.is_empty() {
        return Err(ApiError::InvalidRequest(
            "messages must not be empty".to_string(),
        ));
    }
    Ok(messages)
}

/// POST /api/chat - Stream a chat reply
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<UiChatRequest>,
) -> Result<Response, ApiError> {
    let messages = converted_messages(&request)?;
    let options = RelayOptions::new(state.settings.models.chat.clone());

    stream_ui_messages(state, messages, options).await
}

/// POST /api/multi-modal-chat - Stream a chat reply over text and images
pub async fn multi_modal_chat(
    State(state): State<AppState>,
    Json(request): Json<UiChatRequest>,
) -> Result<Response, ApiError> {
    let messages = converted_messages(&request)?;
    let options = RelayOptions::new(state.settings.models.chat.clone());

    stream_ui_messages(state, messages, options).await
}
