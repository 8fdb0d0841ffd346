//! The seam between routing logic and the language model backend.

use crate::conversation::Turn;
use crate::error::Result;
use crate::tools::ToolSpec;
use async_trait::async_trait;
use serde_json::Value;

/// A function the model may call, in provider-neutral form.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<&ToolSpec> for ToolDefinition {
    fn from(spec: &ToolSpec) -> Self {
        Self {
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            parameters: spec.parameters_schema(),
        }
    }
}

/// One completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub turns: Vec<Turn>,
    /// Empty when the model must answer in text.
    pub tools: Vec<ToolDefinition>,
}

/// A tool call proposed by the model. Arguments are the raw JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestedCall {
    pub name: String,
    pub arguments: String,
}

/// What the model answered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: Option<String>,
    pub tool_calls: Vec<RequestedCall>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            text: None,
            tool_calls: vec![RequestedCall {
                name: name.into(),
                arguments: arguments.into(),
            }],
        }
    }
}

/// Chat completion backend.
///
/// Errors returned here are upstream model failures and are not recovered.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<ModelReply>;
}
