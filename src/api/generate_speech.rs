//! Speech synthesis endpoint
//!
//! POST /api/generate-speech - text in, binary audio out with the upstream
//! content type.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue},
    response::Response,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiError;
use crate::schemas::openai::SpeechRequest;
use crate::server::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateSpeechRequest {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
}

/// POST /api/generate-speech - Synthesize speech for a text
pub async fn generate_speech(
    State(state): State<AppState>,
    Json(request): Json<GenerateSpeechRequest>,
) -> Result<Response, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    let speech_request = SpeechRequest {
        model: state.settings.models.speech.clone(),
        input: request.text,
        voice: state.settings.speech.voice.clone(),
        response_format: None,
    };

    let (audio, media_type) = state
        .openai
        .generate_speech(&speech_request)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Error generating speech");
            ApiError::Upstream("Failed to generate speech".to_string())
        })?;

    let content_type = HeaderValue::from_str(&media_type)
        .unwrap_or_else(|_| HeaderValue::from_static("audio/mpeg"));

    let mut response = Response::new(Body::from(audio));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_validation() {
        assert!(GenerateSpeechRequest {
            text: String::new()
        }
        .validate()
        .is_err());
        assert!(GenerateSpeechRequest {
            text: "Hello world".to_string()
        }
        .validate()
        .is_ok());
    }
}
