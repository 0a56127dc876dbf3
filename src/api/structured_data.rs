//! Structured data endpoint
//!
//! POST /api/structured-data - streams a recipe for a dish as incremental
//! raw JSON text. The page parses the partial object as it grows, so the
//! body is the model's JSON output verbatim, constrained by a strict schema.

use axum::{extract::State, response::Response, Json};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::api::relay::text_stream_response;
use crate::error::ApiError;
use crate::schemas::openai::{
    ChatCompletionRequest, ChatMessage, JsonSchemaFormat, ResponseFormat,
};
use crate::server::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RecipeRequest {
    #[validate(length(min = 1, message = "dish must not be empty"))]
    pub dish: String,
}

/// JSON Schema the generated recipe must satisfy
pub fn recipe_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "recipe": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "ingredients": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string" },
                                "amount": { "type": "string" }
                            },
                            "required": ["name", "amount"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["name", "ingredients"],
                "additionalProperties": false
            },
            "steps": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["recipe", "steps"],
        "additionalProperties": false
    })
}

/// POST /api/structured-data - Stream a recipe as partial JSON
pub async fn stream_recipe(
    State(state): State<AppState>,
    Json(request): Json<RecipeRequest>,
) -> Result<Response, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    let prompt = format!("Generate a recipe for {}", request.dish);

    let chat_request = ChatCompletionRequest::new(
        state.settings.models.structured.clone(),
        vec![ChatMessage::user(prompt)],
    )
    .with_stream()
    .with_response_format(ResponseFormat::JsonSchema {
        json_schema: JsonSchemaFormat {
            name: "recipe".to_string(),
            strict: true,
            schema: recipe_schema(),
        },
    });

    let chat_stream = state
        .openai
        .chat_completion_stream(&chat_request)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Error generating recipe");
            ApiError::Upstream("Failed to get the recipe".to_string())
        })?;

    Ok(text_stream_response(chat_stream))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_schema_shape() {
        let schema = recipe_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["recipe", "steps"]));
        assert_eq!(
            schema["properties"]["recipe"]["properties"]["ingredients"]["items"]["required"],
            json!(["name", "amount"])
        );
    }

    #[test]
    fn test_dish_validation() {
        assert!(RecipeRequest { dish: String::new() }.validate().is_err());
        assert!(RecipeRequest {
            dish: "lasagna".to_string()
        }
        .validate()
        .is_ok());
    }
}
