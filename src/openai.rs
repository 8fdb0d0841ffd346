//! OpenAI-compatible chat backend.

use crate::agent::{ChatModel, CompletionRequest, ModelReply, RequestedCall, ToolDefinition};
use crate::config::ModelSettings;
use crate::conversation::Turn;
use crate::error::{RelevoError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Everything needed to reach the model backend.
///
/// Built once at startup and passed in; there is no global client.
#[derive(Clone)]
pub struct ModelConfig {
    pub model: String,
    pub api_base: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ModelConfig {
    /// Resolve settings plus the credential from the environment.
    ///
    /// A missing or empty credential is a configuration error.
    pub fn from_settings(settings: &ModelSettings) -> Result<Self> {
        let api_key = read_api_key(&settings.api_key_env)?;
        Ok(Self {
            model: settings.model.clone(),
            api_base: settings.api_base.clone(),
            api_key,
            timeout: Duration::from_secs(settings.timeout_secs),
        })
    }
}

/// Read the API key from the named environment variable.
pub fn read_api_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => Err(RelevoError::Config(format!(
            "{} is empty. Set it with: export {}='sk-...'",
            var, var
        ))),
        Err(_) => Err(RelevoError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            var, var
        ))),
    }
}

/// Create an OpenAI client with the configured credential, base URL and timeout.
pub fn create_client(config: &ModelConfig) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(config.timeout).build()?;

    let openai_config = OpenAIConfig::new()
        .with_api_key(config.api_key.clone())
        .with_api_base(config.api_base.clone());

    Ok(Client::with_config(openai_config).with_http_client(http_client))
}

/// [`ChatModel`] backed by the chat completions API.
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    #[instrument(skip(self, request), fields(turns = request.turns.len(), tools = request.tools.len()))]
    async fn complete(&self, request: CompletionRequest) -> Result<ModelReply> {
        let messages = build_messages(&request.system_prompt, &request.turns)?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if !request.tools.is_empty() {
            args.tools(request.tools.iter().map(to_openai_tool).collect::<Vec<_>>());
        }
        let api_request = args.build().map_err(model_err)?;

        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(|e| RelevoError::Model(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RelevoError::Model("No response from model".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| RequestedCall {
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect::<Vec<_>>();

        debug!("Model answered with {} tool call(s)", tool_calls.len());

        Ok(ModelReply {
            text: choice.message.content,
            tool_calls,
        })
    }
}

fn model_err(e: impl std::fmt::Display) -> RelevoError {
    RelevoError::Model(e.to_string())
}

fn to_openai_tool(tool: &ToolDefinition) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: tool.name.clone(),
            description: Some(tool.description.clone()),
            parameters: Some(tool.parameters.clone()),
            strict: None,
        },
    }
}

/// Map the conversation log onto chat messages.
///
/// Tool call/result pairs become an assistant `tool_calls` message followed
/// by a `tool` message with the same id.
fn build_messages(system_prompt: &str, turns: &[Turn]) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()
            .map_err(model_err)?
            .into(),
    ];

    for turn in turns {
        let message: ChatCompletionRequestMessage = match turn {
            Turn::User { text } => ChatCompletionRequestUserMessageArgs::default()
                .content(text.as_str())
                .build()
                .map_err(model_err)?
                .into(),
            Turn::Agent { author, text } => ChatCompletionRequestAssistantMessageArgs::default()
                .content(text.as_str())
                .name(author.name())
                .build()
                .map_err(model_err)?
                .into(),
            Turn::ToolCall {
                call_id,
                tool_name,
                arguments,
            } => ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(vec![ChatCompletionMessageToolCall {
                    id: call_id.to_string(),
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionCall {
                        name: tool_name.clone(),
                        arguments: arguments.to_string(),
                    },
                }])
                .build()
                .map_err(model_err)?
                .into(),
            Turn::ToolResult {
                call_id, result, ..
            } => ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(call_id.to_string())
                .content(result.to_model_content())
                .build()
                .map_err(model_err)?
                .into(),
        };
        messages.push(message);
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Author, Conversation};
    use crate::role::Role;
    use crate::tools::{ToolPayload, ToolResult};
    use serde_json::json;

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = read_api_key("RELEVO_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, RelevoError::Config(_)));
        assert!(err.to_string().contains("RELEVO_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ModelConfig {
            model: "gpt-4o".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: "sk-secret".to_string(),
            timeout: Duration::from_secs(5),
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_build_messages_pairs_tool_turns() {
        let mut conversation = Conversation::new();
        conversation.push_user("soy alumno, DNI 44852795, faltas en Estadística");
        conversation.push_tool_exchange(
            "consultar_faltas",
            json!({"dni": "44852795", "materias": ["Estadística"]}),
            ToolResult::success(ToolPayload::Json(json!({"faltas": 2}))),
        );
        conversation.push_agent(Author::Agent(Role::Student), "done");

        let messages = build_messages("system", conversation.turns()).unwrap();
        assert_eq!(messages.len(), 5);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));

        let call_id = match &messages[2] {
            ChatCompletionRequestMessage::Assistant(msg) => {
                let calls = msg.tool_calls.as_ref().unwrap();
                assert_eq!(calls[0].function.name, "consultar_faltas");
                calls[0].id.clone()
            }
            other => panic!("Expected assistant tool call, got {:?}", other),
        };
        match &messages[3] {
            ChatCompletionRequestMessage::Tool(msg) => assert_eq!(msg.tool_call_id, call_id),
            other => panic!("Expected tool message, got {:?}", other),
        }
        match &messages[4] {
            ChatCompletionRequestMessage::Assistant(msg) => {
                assert_eq!(msg.name.as_deref(), Some("student_agent"))
            }
            other => panic!("Expected assistant message, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_definition_mapping() {
        let spec = crate::testing::spec_for("gestionar_material");
        let tool = to_openai_tool(&ToolDefinition::from(&spec));
        assert_eq!(tool.function.name, "gestionar_material");
        let params = tool.function.parameters.unwrap();
        assert_eq!(params["properties"]["accion"]["enum"][0], "subir");
    }
}
