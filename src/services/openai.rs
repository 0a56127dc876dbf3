//! OpenAI service for upstream API interactions
//!
//! This module handles communication with the OpenAI REST API. One method
//! per upstream operation the playground uses; the two streaming endpoints
//! share a small SSE framing buffer.

use crate::config::Settings;
use crate::schemas::openai::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ImageGenerationRequest,
    ImageGenerationResponse, OpenAiErrorBody, SpeechRequest, TranscriptionResponse,
};
use crate::schemas::responses::{ResponseStreamEvent, ResponsesRequest};
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when calling the OpenAI API
#[derive(Error, Debug)]
pub enum OpenAiServiceError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Stream error: {0}")]
    StreamError(String),
}

// ============================================================================
// OpenAI Service
// ============================================================================

/// Configuration for the OpenAI service
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for bearer authentication
    pub api_key: String,

    /// Base URL override (default: api.openai.com)
    pub base_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout_seconds: 120,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Build a config from application settings
    pub fn from_settings(settings: &Settings) -> Result<Self, OpenAiServiceError> {
        let api_key = settings
            .openai_api_key
            .clone()
            .ok_or(OpenAiServiceError::MissingApiKey)?;

        let mut config = Self::new(api_key).with_timeout(settings.request_timeout_seconds);
        if let Some(ref base_url) = settings.openai_base_url {
            config = config.with_base_url(base_url.clone());
        }
        Ok(config)
    }
}

/// Audio file forwarded to the transcription endpoint
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub file_name: String,
    pub media_type: String,
    pub data: Bytes,
}

/// Service for interacting with the OpenAI API
#[derive(Clone)]
pub struct OpenAiService {
    /// HTTP client
    client: Client,

    /// Base URL for API calls
    base_url: Option<String>,

    /// API key for bearer authentication
    api_key: String,
}

impl OpenAiService {
    /// Create a new OpenAI service
    pub fn new(config: OpenAiConfig) -> Result<Self, OpenAiServiceError> {
        if config.api_key.is_empty() {
            return Err(OpenAiServiceError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
            api_key: config.api_key,
        })
    }

    /// Get the base URL
    fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENAI_API_BASE)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Turn a non-success response into a service error
    async fn error_from_response(resp: reqwest::Response) -> OpenAiServiceError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();

        if let Ok(parsed) = serde_json::from_str::<OpenAiErrorBody>(&body) {
            return OpenAiServiceError::ApiError {
                status,
                message: parsed.error.message,
            };
        }

        OpenAiServiceError::ApiError {
            status,
            message: body,
        }
    }

    /// Create a chat completion (non-streaming)
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiServiceError> {
        let url = self.url("/chat/completions");

        tracing::debug!(
            model = %request.model,
            message_count = request.messages.len(),
            "Calling chat completions API"
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, body = %body, "Failed to parse chat completion response");
            OpenAiServiceError::ParseError(e.to_string())
        })
    }

    /// Create a chat completion stream
    ///
    /// The request must have `stream` set; the returned stream yields parsed
    /// chunks until the `[DONE]` marker or connection close.
    pub async fn chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatStream, OpenAiServiceError> {
        let url = self.url("/chat/completions");

        tracing::debug!(
            model = %request.model,
            message_count = request.messages.len(),
            "Calling chat completions API (streaming)"
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }

        Ok(ChatStream::new(resp))
    }

    /// Generate an image
    pub async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, OpenAiServiceError> {
        let url = self.url("/images/generations");

        tracing::debug!(model = %request.model, "Calling image generations API");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse image generation response");
            OpenAiServiceError::ParseError(e.to_string())
        })
    }

    /// Synthesize speech; returns the audio bytes and their media type
    pub async fn generate_speech(
        &self,
        request: &SpeechRequest,
    ) -> Result<(Bytes, String), OpenAiServiceError> {
        let url = self.url("/audio/speech");

        tracing::debug!(model = %request.model, voice = %request.voice, "Calling speech API");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }

        let media_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();

        let bytes = resp.bytes().await?;
        Ok((bytes, media_type))
    }

    /// Transcribe an uploaded audio file (verbose JSON, with segments)
    pub async fn transcribe(
        &self,
        upload: AudioUpload,
        model: &str,
    ) -> Result<TranscriptionResponse, OpenAiServiceError> {
        let url = self.url("/audio/transcriptions");

        tracing::debug!(
            model = %model,
            file_name = %upload.file_name,
            bytes = upload.data.len(),
            "Calling transcriptions API"
        );

        let file_part = reqwest::multipart::Part::bytes(upload.data.to_vec())
            .file_name(upload.file_name)
            .mime_str(&upload.media_type)
            .map_err(|e| OpenAiServiceError::ParseError(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", model.to_string())
            .text("response_format", "verbose_json");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse transcription response");
            OpenAiServiceError::ParseError(e.to_string())
        })
    }

    /// Create a streamed response (Responses API, used for web search)
    pub async fn create_response_stream(
        &self,
        request: &ResponsesRequest,
    ) -> Result<ResponsesStream, OpenAiServiceError> {
        let url = self.url("/responses");

        tracing::debug!(model = %request.model, "Calling responses API (streaming)");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }

        Ok(ResponsesStream::new(resp))
    }

    /// Check if the service is usable (an API key is configured)
    pub fn health_check(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ============================================================================
// Streaming Support
// ============================================================================

/// Buffer that reassembles SSE events from raw body chunks
///
/// CR bytes are dropped on push so events are always `\n\n`-delimited; a
/// chunk boundary may fall anywhere, including inside a UTF-8 sequence, so
/// the buffer stays bytes until a complete event is available.
#[derive(Debug, Default)]
struct SseBuffer {
    buf: Vec<u8>,
}

impl SseBuffer {
    fn push(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().copied().filter(|&b| b != b'\r'));
    }

    /// Extract the data payload of the next complete event, if any
    fn next_data(&mut self) -> Option<String> {
        loop {
            let pos = self.buf.windows(2).position(|w| w == b"\n\n")?;
            let block: Vec<u8> = self.buf.drain(..pos + 2).collect();
            let block = String::from_utf8_lossy(&block[..pos]);

            let data: Vec<&str> = block
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|line| line.strip_prefix(' ').unwrap_or(line))
                .collect();

            // Comment or event-name-only block
            if data.is_empty() {
                continue;
            }

            return Some(data.join("\n"));
        }
    }
}

/// A stream of chat completion chunks
pub struct ChatStream {
    response: reqwest::Response,
    buffer: SseBuffer,
    done: bool,
}

impl ChatStream {
    fn new(response: reqwest::Response) -> Self {
        Self {
            response,
            buffer: SseBuffer::default(),
            done: false,
        }
    }

    /// Receive the next chunk from the stream
    pub async fn recv(&mut self) -> Result<Option<ChatCompletionChunk>, OpenAiServiceError> {
        loop {
            if self.done {
                return Ok(None);
            }

            while let Some(data) = self.buffer.next_data() {
                if data == "[DONE]" {
                    self.done = true;
                    return Ok(None);
                }

                match serde_json::from_str::<ChatCompletionChunk>(&data) {
                    Ok(chunk) => return Ok(Some(chunk)),
                    Err(e) => {
                        tracing::warn!(error = %e, data = %data, "Failed to parse stream chunk");
                        continue;
                    }
                }
            }

            match self.response.chunk().await {
                Ok(Some(chunk)) => self.buffer.push(&chunk),
                Ok(None) => return Ok(None),
                Err(e) => return Err(OpenAiServiceError::StreamError(e.to_string())),
            }
        }
    }
}

/// A stream of Responses API events
pub struct ResponsesStream {
    response: reqwest::Response,
    buffer: SseBuffer,
}

impl ResponsesStream {
    fn new(response: reqwest::Response) -> Self {
        Self {
            response,
            buffer: SseBuffer::default(),
        }
    }

    /// Receive the next event from the stream
    pub async fn recv(&mut self) -> Result<Option<ResponseStreamEvent>, OpenAiServiceError> {
        loop {
            while let Some(data) = self.buffer.next_data() {
                match serde_json::from_str::<ResponseStreamEvent>(&data) {
                    Ok(event) => return Ok(Some(event)),
                    Err(e) => {
                        tracing::warn!(error = %e, data = %data, "Failed to parse stream event");
                        continue;
                    }
                }
            }

            match self.response.chunk().await {
                Ok(Some(chunk)) => self.buffer.push(&chunk),
                Ok(None) => return Ok(None),
                Err(e) => return Err(OpenAiServiceError::StreamError(e.to_string())),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_config_builder() {
        let config = OpenAiConfig::new("sk-test")
            .with_base_url("https://proxy.example/v1")
            .with_timeout(30);

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url.as_deref(), Some("https://proxy.example/v1"));
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_config_from_settings_requires_key() {
        let settings = Settings::default();
        assert!(matches!(
            OpenAiConfig::from_settings(&settings),
            Err(OpenAiServiceError::MissingApiKey)
        ));

        let settings = Settings {
            openai_api_key: Some("sk-test".to_string()),
            ..Settings::default()
        };
        let config = OpenAiConfig::from_settings(&settings).unwrap();
        assert_eq!(config.timeout_seconds, settings.request_timeout_seconds);
    }

    #[test]
    fn test_service_rejects_empty_key() {
        let result = OpenAiService::new(OpenAiConfig::new(""));
        assert!(matches!(result, Err(OpenAiServiceError::MissingApiKey)));
    }

    #[test]
    fn test_service_creation() {
        let service = OpenAiService::new(OpenAiConfig::new("sk-test")).unwrap();
        assert!(service.health_check());
        assert_eq!(service.base_url(), OPENAI_API_BASE);
        assert_eq!(service.url("/chat/completions"), format!("{}/chat/completions", OPENAI_API_BASE));
    }

    #[test]
    fn test_sse_buffer_single_event() {
        let mut buffer = SseBuffer::default();
        buffer.push(b"data: {\"a\":1}\n\n");
        assert_eq!(buffer.next_data().as_deref(), Some("{\"a\":1}"));
        assert_eq!(buffer.next_data(), None);
    }

    #[test]
    fn test_sse_buffer_split_across_pushes() {
        let mut buffer = SseBuffer::default();
        buffer.push(b"data: {\"a\"");
        assert_eq!(buffer.next_data(), None);
        buffer.push(b":1}\n\ndata: [DONE]\n\n");
        assert_eq!(buffer.next_data().as_deref(), Some("{\"a\":1}"));
        assert_eq!(buffer.next_data().as_deref(), Some("[DONE]"));
    }

    #[test]
    fn test_sse_buffer_strips_carriage_returns() {
        let mut buffer = SseBuffer::default();
        buffer.push(b"data: one\r\n\r\n");
        assert_eq!(buffer.next_data().as_deref(), Some("one"));
    }

    #[test]
    fn test_sse_buffer_event_name_lines() {
        let mut buffer = SseBuffer::default();
        buffer.push(b"event: response.output_text.delta\ndata: {\"type\":\"x\"}\n\n");
        assert_eq!(buffer.next_data().as_deref(), Some("{\"type\":\"x\"}"));
    }

    #[test]
    fn test_sse_buffer_skips_comment_blocks() {
        let mut buffer = SseBuffer::default();
        buffer.push(b": keep-alive\n\ndata: real\n\n");
        assert_eq!(buffer.next_data().as_deref(), Some("real"));
    }
}
