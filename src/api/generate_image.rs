//! Image generation endpoint
//!
//! POST /api/generate-image - one prompt in, one base64 image out. The page
//! embeds the response string directly into a data URL.

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiError;
use crate::schemas::openai::ImageGenerationRequest;
use crate::server::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateImageRequest {
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,
}

/// POST /api/generate-image - Generate an image and return its base64 payload
pub async fn generate_image(
    State(state): State<AppState>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<String>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    let image_request = ImageGenerationRequest {
        model: state.settings.models.image.clone(),
        prompt: request.prompt,
        n: Some(1),
        size: Some(state.settings.image.size.clone()),
        quality: Some(state.settings.image.quality.clone()),
        style: Some(state.settings.image.style.clone()),
        response_format: Some("b64_json".to_string()),
    };

    let response = state
        .openai
        .generate_image(&image_request)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Error generating image");
            ApiError::Upstream("Failed to generate image. Please try again.".to_string())
        })?;

    let b64 = response.first_b64().ok_or_else(|| {
        tracing::error!("Image response contained no image data");
        ApiError::Upstream("Failed to generate image. Please try again.".to_string())
    })?;

    Ok(Json(b64.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_validation() {
        assert!(GenerateImageRequest {
            prompt: String::new()
        }
        .validate()
        .is_err());
        assert!(GenerateImageRequest {
            prompt: "a lighthouse at dusk".to_string()
        }
        .validate()
        .is_ok());
    }
}
