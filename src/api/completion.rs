//! Text completion endpoint
//!
//! POST /api/completion - one prompt in, one completed text out.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiError;
use crate::schemas::openai::{ChatCompletionRequest, ChatMessage};
use crate::server::state::AppState;
use crate::utils::truncate_with_suffix;

/// Request body shared by the completion-shaped endpoints
#[derive(Debug, Deserialize, Validate)]
pub struct CompletionRequest {
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub text: String,
}

/// POST /api/completion - Generate a completion for a prompt
pub async fn generate_completion(
    State(state): State<AppState>,
    Json(request): Json<CompletionRequest>,
) -> Result<Json<CompletionResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    if state.settings.print_prompts {
        println!("[prompt] {}", truncate_with_suffix(&request.prompt, 500, "..."));
    }

    let chat_request = ChatCompletionRequest::new(
        state.settings.models.completion.clone(),
        vec![ChatMessage::user(request.prompt)],
    );

    let response = state
        .openai
        .chat_completion(&chat_request)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Error in completion route");
            ApiError::Upstream("Failed to generate completion. Please try again.".to_string())
        })?;

    let text = response.first_text().unwrap_or_default().to_string();

    Ok(Json(CompletionResponse { text }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_prompt_fails_validation() {
        let request = CompletionRequest {
            prompt: String::new(),
        };
        assert!(request.validate().is_err());

        let request = CompletionRequest {
            prompt: "tell me a joke".to_string(),
        };
        assert!(request.validate().is_ok());
    }
}
