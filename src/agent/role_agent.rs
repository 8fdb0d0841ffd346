//! Role agents: one persona, a fixed tool set, at most one call per activation.

use super::model::{ChatModel, CompletionRequest, ToolDefinition};
use crate::conversation::{Author, Conversation};
use crate::role::Role;
use crate::tools::{ToolFailure, ToolResult, ToolSpec, WebhookClient};
use crate::error::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What an agent hands back to the supervisor after one activation.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReport {
    /// Status text meant for the supervisor, not the user.
    Text(String),
    /// Outcome of the single tool this activation invoked.
    Tool { tool_name: String, result: ToolResult },
}

impl AgentReport {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            AgentReport::Tool {
                result: ToolResult::Failure { .. },
                ..
            }
        )
    }
}

/// An agent serving a single role.
pub struct RoleAgent {
    role: Role,
    tools: Vec<ToolSpec>,
    system_prompt: String,
    model: Arc<dyn ChatModel>,
    webhooks: WebhookClient,
}

impl RoleAgent {
    pub fn new(
        role: Role,
        tools: Vec<ToolSpec>,
        system_prompt: String,
        model: Arc<dyn ChatModel>,
        webhooks: WebhookClient,
    ) -> Self {
        Self {
            role,
            tools,
            system_prompt,
            model,
            webhooks,
        }
    }

    pub fn name(&self) -> &'static str {
        self.role.agent_name()
    }

    /// Run one activation against the conversation.
    ///
    /// Either records a status turn or exactly one tool call/result pair.
    /// Extra tool calls proposed by the model are dropped.
    pub async fn activate(&self, conversation: &mut Conversation) -> Result<AgentReport> {
        let request = CompletionRequest {
            system_prompt: self.system_prompt.clone(),
            turns: conversation.turns().to_vec(),
            tools: self.tools.iter().map(ToolDefinition::from).collect(),
        };

        debug!("{} activated with {} turns", self.name(), request.turns.len());
        let reply = self.model.complete(request).await?;

        let mut calls = reply.tool_calls.into_iter();
        let Some(call) = calls.next() else {
            let text = reply
                .text
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "No action was taken.".to_string());
            conversation.push_agent(Author::Agent(self.role), text.clone());
            return Ok(AgentReport::Text(text));
        };

        let dropped = calls.count();
        if dropped > 0 {
            warn!(
                "{} proposed {} extra tool call(s); only {} runs this turn",
                self.name(),
                dropped,
                call.name
            );
        }

        info!("{} calling tool: {} with args: {}", self.name(), call.name, call.arguments);

        let (arguments, result) = match serde_json::from_str::<Value>(&call.arguments) {
            Err(e) => (
                Value::String(call.arguments.clone()),
                ToolResult::failure(ToolFailure::invalid(
                    "arguments",
                    format!("not valid JSON: {}", e),
                )),
            ),
            Ok(arguments) => {
                let result = match self.tools.iter().find(|t| t.name == call.name) {
                    Some(spec) => self.webhooks.invoke(spec, &arguments).await,
                    None => ToolResult::failure(ToolFailure::invalid(
                        "tool",
                        format!("{} is not available to {}", call.name, self.name()),
                    )),
                };
                (arguments, result)
            }
        };

        conversation.push_tool_exchange(&call.name, arguments, result.clone());

        Ok(AgentReport::Tool {
            tool_name: call.name,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::model::{ModelReply, RequestedCall};
    use crate::conversation::Turn;
    use crate::testing::{spec_for, ScriptedModel, StubTransport};
    use serde_json::json;

    fn student_agent(model: Arc<ScriptedModel>, transport: Arc<StubTransport>) -> RoleAgent {
        RoleAgent::new(
            Role::Student,
            vec![spec_for("consultar_faltas"), spec_for("solicitar_certificado")],
            "student prompt".to_string(),
            model,
            WebhookClient::new(transport),
        )
    }

    #[tokio::test]
    async fn test_text_reply_records_agent_turn() {
        let model = Arc::new(ScriptedModel::new(vec![ModelReply::text("Need the DNI first.")]));
        let transport = Arc::new(StubTransport::json(200, json!({})));
        let agent = student_agent(model.clone(), transport.clone());

        let mut conversation = Conversation::new();
        conversation.push_user("¿cuántas faltas tengo?");
        let report = agent.activate(&mut conversation).await.unwrap();

        assert_eq!(report, AgentReport::Text("Need the DNI first.".to_string()));
        assert_eq!(
            conversation.turns().last(),
            Some(&Turn::Agent {
                author: Author::Agent(Role::Student),
                text: "Need the DNI first.".to_string()
            })
        );
        assert_eq!(transport.call_count(), 0);

        let request = &model.requests()[0];
        assert_eq!(request.system_prompt, "student prompt");
        assert_eq!(request.tools.len(), 2);
    }

    #[tokio::test]
    async fn test_only_first_of_several_calls_runs() {
        let reply = ModelReply {
            text: None,
            tool_calls: vec![
                RequestedCall {
                    name: "consultar_faltas".to_string(),
                    arguments: r#"{"dni": "44852795", "materias": ["Estadística"]}"#.to_string(),
                },
                RequestedCall {
                    name: "solicitar_certificado".to_string(),
                    arguments: r#"{"dni": "44852795", "tipo": "examen"}"#.to_string(),
                },
            ],
        };
        let model = Arc::new(ScriptedModel::new(vec![reply]));
        let transport = Arc::new(StubTransport::json(200, json!({"faltas": 1})));
        let agent = student_agent(model, transport.clone());

        let mut conversation = Conversation::new();
        conversation.push_user("faltas y certificado");
        let report = agent.activate(&mut conversation).await.unwrap();

        assert!(matches!(report, AgentReport::Tool { ref tool_name, .. } if tool_name == "consultar_faltas"));
        assert_eq!(conversation.tool_calls_since(0), 1);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_foreign_tool_is_rejected_without_io() {
        let model = Arc::new(ScriptedModel::new(vec![ModelReply::tool_call(
            "crear_post_linkedin",
            r#"{"titulo": "x", "contenido": "y"}"#,
        )]));
        let transport = Arc::new(StubTransport::json(200, json!({})));
        let agent = student_agent(model, transport.clone());

        let mut conversation = Conversation::new();
        conversation.push_user("publicá algo");
        let report = agent.activate(&mut conversation).await.unwrap();

        assert!(report.is_failure());
        assert_eq!(transport.call_count(), 0);
        assert!(matches!(conversation.turns()[1], Turn::ToolCall { .. }));
        assert!(matches!(conversation.turns()[2], Turn::ToolResult { .. }));
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_invalid() {
        let model = Arc::new(ScriptedModel::new(vec![ModelReply::tool_call(
            "consultar_faltas",
            "{dni: 4485",
        )]));
        let transport = Arc::new(StubTransport::json(200, json!({})));
        let agent = student_agent(model, transport.clone());

        let mut conversation = Conversation::new();
        conversation.push_user("faltas");
        match agent.activate(&mut conversation).await.unwrap() {
            AgentReport::Tool { result, .. } => {
                assert_eq!(result.failure_ref().map(|f| f.code()), Some("invalid_argument"));
            }
            other => panic!("Expected tool report, got {:?}", other),
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let model = Arc::new(ScriptedModel::failing());
        let transport = Arc::new(StubTransport::json(200, json!({})));
        let agent = student_agent(model, transport);

        let mut conversation = Conversation::new();
        conversation.push_user("faltas");
        assert!(agent.activate(&mut conversation).await.is_err());
        assert_eq!(conversation.len(), 1);
    }
}
