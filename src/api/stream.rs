//! Streamed completion endpoint
//!
//! POST /api/stream - same input as /api/completion, but the tokens are
//! relayed to the browser as they arrive.

use axum::{extract::State, response::Response, Json};
use validator::Validate;

use crate::api::completion::CompletionRequest;
use crate::api::relay::text_stream_response;
use crate::error::ApiError;
use crate::schemas::openai::{ChatCompletionRequest, ChatMessage};
use crate::server::state::AppState;
use crate::utils::truncate_with_suffix;

/// POST /api/stream - Stream a completion for a prompt
pub async fn stream_completion(
    State(state): State<AppState>,
    Json(request): Json<CompletionRequest>,
) -> Result<Response, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    if state.settings.print_prompts {
        println!("[prompt] {}", truncate_with_suffix(&request.prompt, 500, "..."));
    }

    let chat_request = ChatCompletionRequest::new(
        state.settings.models.completion.clone(),
        vec![ChatMessage::user(request.prompt)],
    )
    .with_stream();

    let chat_stream = state
        .openai
        .chat_completion_stream(&chat_request)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Error streaming completion");
            ApiError::Upstream("Failed to stream completion. Please try again.".to_string())
        })?;

    Ok(text_stream_response(chat_stream))
}
