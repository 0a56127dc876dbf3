//! Built-in tools
//!
//! The image generation tool runs on the server through the shared OpenAI
//! service. The background-editing tools are schema-only: the browser owns
//! their execution and reports results back with the next request.

use crate::config::{ImageOptions, Settings};
use crate::schemas::openai::ImageGenerationRequest;
use crate::services::OpenAiService;
use crate::tools::{ToolDefinition, ToolError, ToolExecutor};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Server-side image generation
pub struct GenerateImageTool {
    service: Arc<OpenAiService>,
    model: String,
    options: ImageOptions,
}

#[async_trait]
impl ToolExecutor for GenerateImageTool {
    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let prompt = input
            .get("prompt")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidInput("prompt is required".to_string()))?;

        let request = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: Some(1),
            size: Some(self.options.size.clone()),
            quality: Some(self.options.quality.clone()),
            style: Some(self.options.style.clone()),
            response_format: Some("b64_json".to_string()),
        };

        let response = self
            .service
            .generate_image(&request)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let b64 = response
            .first_b64()
            .ok_or_else(|| ToolError::ExecutionFailed("no image in response".to_string()))?;

        Ok(Value::String(b64.to_string()))
    }
}

/// `generateImage` - generate an image from a prompt on the server
pub fn generate_image(service: Arc<OpenAiService>, settings: &Settings) -> ToolDefinition {
    ToolDefinition::new(
        "generateImage",
        "Generate image from a prompt",
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "The prompt to generate an image for"
                }
            },
            "required": ["prompt"]
        }),
    )
    .with_executor(Arc::new(GenerateImageTool {
        service,
        model: settings.models.image.clone(),
        options: settings.image.clone(),
    }))
    .with_model_output("generated image in base64")
}

/// `changeBackground` - client-executed background replacement
pub fn change_background() -> ToolDefinition {
    ToolDefinition::new(
        "changeBackground",
        "Change image background based on text prompt",
        json!({
            "type": "object",
            "properties": {
                "imageUrl": {
                    "type": "string",
                    "description": "URL of the uploaded image"
                },
                "backgroundPrompt": {
                    "type": "string",
                    "description": "The prompt for changing image background (e.g., \"modern office\", \"mountain landscape\", \"tropical beach\")"
                }
            },
            "required": ["imageUrl", "backgroundPrompt"]
        }),
    )
    .with_output_schema(json!({
        "type": "string",
        "description": "The transformed image URL"
    }))
}

/// `removeBackground` - client-executed background removal
pub fn remove_background() -> ToolDefinition {
    ToolDefinition::new(
        "removeBackground",
        "Remove the background of an image",
        json!({
            "type": "object",
            "properties": {
                "imageUrl": {
                    "type": "string",
                    "description": "URL of the uploaded image"
                }
            },
            "required": ["imageUrl"]
        }),
    )
    .with_output_schema(json!({
        "type": "string",
        "description": "The transformed image URL"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::OpenAiConfig;

    fn test_service() -> Arc<OpenAiService> {
        Arc::new(OpenAiService::new(OpenAiConfig::new("sk-test")).unwrap())
    }

    #[test]
    fn test_generate_image_is_server_side() {
        let tool = generate_image(test_service(), &Settings::default());

        assert_eq!(tool.name, "generateImage");
        assert!(tool.is_server_side());
        assert_eq!(tool.model_output.as_deref(), Some("generated image in base64"));
        assert_eq!(tool.input_schema["required"][0], "prompt");
    }

    #[test]
    fn test_background_tools_are_client_side() {
        assert!(!change_background().is_server_side());
        assert!(!remove_background().is_server_side());
        assert_eq!(
            change_background().input_schema["required"],
            json!(["imageUrl", "backgroundPrompt"])
        );
    }

    #[tokio::test]
    async fn test_generate_image_rejects_missing_prompt() {
        let tool = generate_image(test_service(), &Settings::default());
        let executor = tool.executor.as_ref().unwrap();

        let result = executor.execute(json!({"wrong": "field"})).await;
        assert!(matches!(result, Err(ToolError::InvalidInput(_))));
    }
}
