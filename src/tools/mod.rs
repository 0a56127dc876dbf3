//! Tool definitions
//!
//! Tools are declared as name + description + JSON Schema input. Server-side
//! tools carry an executor; the rest are schema-only and executed by the
//! browser, which posts the result back inside the next request's message
//! history. The chat relay consumes a `ToolSet` per endpoint.

pub mod builtin;

use crate::schemas::openai::{Tool, ToolFunction};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Errors produced by server-side tool execution
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),
}

/// Server-side tool implementation
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, input: Value) -> Result<Value, ToolError>;
}

/// A single declared tool
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,

    /// JSON Schema for the tool input
    pub input_schema: Value,

    /// JSON Schema for the output of client-executed tools
    pub output_schema: Option<Value>,

    /// Present for server-side tools
    pub executor: Option<Arc<dyn ToolExecutor>>,

    /// Text sent back to the model in place of the raw output
    /// (the image tool reports a marker instead of the base64 payload)
    pub model_output: Option<String>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            output_schema: None,
            executor: None,
            model_output: None,
        }
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_model_output(mut self, text: impl Into<String>) -> Self {
        self.model_output = Some(text.into());
        self
    }

    /// Whether this tool executes on the server
    pub fn is_server_side(&self) -> bool {
        self.executor.is_some()
    }
}

/// The tools registered for one endpoint
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<ToolDefinition>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Convert to the provider's tools array
    pub fn to_wire(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|t| Tool {
                tool_type: "function".to_string(),
                function: ToolFunction {
                    name: t.name.clone(),
                    description: Some(t.description.clone()),
                    parameters: t.input_schema.clone(),
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dummy_tool(name: &str) -> ToolDefinition {
        ToolDefinition::new(
            name,
            "a test tool",
            json!({"type": "object", "properties": {}}),
        )
    }

    #[test]
    fn test_toolset_find() {
        let tools = ToolSet::new()
            .with(dummy_tool("first"))
            .with(dummy_tool("second"));

        assert!(tools.find("first").is_some());
        assert!(tools.find("third").is_none());
    }

    #[test]
    fn test_toolset_to_wire() {
        let tools = ToolSet::new().with(dummy_tool("generateImage"));
        let wire = tools.to_wire();

        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].tool_type, "function");
        assert_eq!(wire[0].function.name, "generateImage");
        assert_eq!(
            wire[0].function.description.as_deref(),
            Some("a test tool")
        );
    }

    #[test]
    fn test_schema_only_tool_is_client_side() {
        let tool = dummy_tool("removeBackground")
            .with_output_schema(json!({"type": "string"}));

        assert!(!tool.is_server_side());
        assert!(tool.output_schema.is_some());
    }
}
