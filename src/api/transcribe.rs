//! Audio transcription endpoint
//!
//! POST /api/transcribe-audio - multipart upload in, transcript with timed
//! segments out.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::schemas::openai::TranscriptionResponse;
use crate::server::state::AppState;
use crate::services::AudioUpload;

/// Transcript shape consumed by the page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<TranscriptSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub duration_in_seconds: f64,
}

#[derive(Debug, Serialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl From<TranscriptionResponse> for TranscriptResponse {
    fn from(response: TranscriptionResponse) -> Self {
        let segments = response.segments.map(|segments| {
            segments
                .into_iter()
                .map(|s| TranscriptSegment {
                    start: s.start,
                    end: s.end,
                    text: s.text.trim().to_string(),
                })
                .collect::<Vec<_>>()
        });

        // Fall back to the last segment's end when the API omits duration
        let duration_in_seconds = response.duration.unwrap_or_else(|| {
            segments
                .as_ref()
                .and_then(|s| s.last())
                .map(|s| s.end)
                .unwrap_or(0.0)
        });

        Self {
            text: response.text,
            segments,
            language: response.language,
            duration_in_seconds,
        }
    }
}

/// POST /api/transcribe-audio - Transcribe an uploaded audio file
///
/// Expects a multipart form with the file under the `audio` field.
pub async fn transcribe_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let mut upload: Option<AudioUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("audio") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("audio").to_string();
        let media_type = field.content_type().map(str::to_string).unwrap_or_else(|| {
            mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .to_string()
        });
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("failed to read audio field: {}", e)))?;

        upload = Some(AudioUpload {
            file_name,
            media_type,
            data,
        });
        break;
    }

    let upload =
        upload.ok_or_else(|| ApiError::InvalidRequest("missing audio field".to_string()))?;

    if upload.data.is_empty() {
        return Err(ApiError::InvalidRequest("audio file is empty".to_string()));
    }

    let transcription = state
        .openai
        .transcribe(upload, &state.settings.models.transcription)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Error transcribing audio");
            ApiError::Upstream("Failed to transcribe audio".to_string())
        })?;

    Ok(Json(TranscriptResponse::from(transcription)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::openai::TranscriptionSegment;

    #[test]
    fn test_transcript_mapping() {
        let wire = TranscriptionResponse {
            text: "Hello there.".to_string(),
            language: Some("english".to_string()),
            duration: Some(7.4),
            segments: Some(vec![TranscriptionSegment {
                id: 0,
                start: 0.0,
                end: 3.2,
                text: " Hello there.".to_string(),
            }]),
        };

        let response = TranscriptResponse::from(wire);
        assert_eq!(response.duration_in_seconds, 7.4);
        assert_eq!(response.segments.as_ref().unwrap()[0].text, "Hello there.");

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["durationInSeconds"], 7.4);
        assert_eq!(value["language"], "english");
    }

    #[test]
    fn test_duration_falls_back_to_last_segment() {
        let wire = TranscriptionResponse {
            text: "Hi.".to_string(),
            language: None,
            duration: None,
            segments: Some(vec![
                TranscriptionSegment {
                    id: 0,
                    start: 0.0,
                    end: 1.0,
                    text: "Hi.".to_string(),
                },
                TranscriptionSegment {
                    id: 1,
                    start: 1.0,
                    end: 2.5,
                    text: "".to_string(),
                },
            ]),
        };

        let response = TranscriptResponse::from(wire);
        assert_eq!(response.duration_in_seconds, 2.5);
    }
}
