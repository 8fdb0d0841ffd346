//! The supervisor: role resolution, static routing and reply synthesis.

use super::model::{ChatModel, CompletionRequest};
use super::role_agent::{AgentReport, RoleAgent};
use super::session::{RouterState, Session};
use crate::config::Prompts;
use crate::conversation::Author;
use crate::error::{RelevoError, Result};
use crate::role::{Deployment, Role};
use crate::tools::{template, ToolFailure, ToolRegistry, ToolResult, WebhookClient};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a single state-machine step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The invocation has more work to do.
    Continue,
    /// The invocation finished with a reply for the user.
    Replied(String),
    /// The role is unknown; the invocation halted on this question.
    Clarify(String),
}

/// What a caller shows after a full invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    /// True when the reply is a role question and the next message should
    /// name a role.
    pub awaiting_role: bool,
}

/// Routes each user turn to one role agent and phrases the outcome.
pub struct Supervisor {
    registry: Arc<ToolRegistry>,
    agents: HashMap<Role, RoleAgent>,
    model: Arc<dyn ChatModel>,
    prompts: Arc<Prompts>,
    internal_names: Vec<String>,
}

impl Supervisor {
    /// Build the supervisor and one agent per role of the registry's deployment.
    pub fn new(
        registry: Arc<ToolRegistry>,
        model: Arc<dyn ChatModel>,
        webhooks: WebhookClient,
        prompts: Arc<Prompts>,
    ) -> Self {
        let agents = registry
            .deployment()
            .roles()
            .iter()
            .map(|role| {
                let system_prompt = prompts.render_with_custom(
                    prompts.agents.for_role(*role),
                    &HashMap::new(),
                );
                let agent = RoleAgent::new(
                    *role,
                    registry.tools_for(*role).to_vec(),
                    system_prompt,
                    model.clone(),
                    webhooks.clone(),
                );
                (*role, agent)
            })
            .collect();

        let internal_names = registry
            .internal_names()
            .into_iter()
            .map(str::to_lowercase)
            .chain(["invalid_argument".to_string(), "transport_error".to_string()])
            .collect();

        Self {
            registry,
            agents,
            model,
            prompts,
            internal_names,
        }
    }

    pub fn deployment(&self) -> Deployment {
        self.registry.deployment()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Open a session. A declared role must belong to this deployment.
    pub fn start_session(&self, declared_role: Option<Role>) -> Result<Session> {
        if let Some(role) = declared_role {
            if !self.deployment().supports(role) {
                return Err(RelevoError::UnknownRole(format!(
                    "{} (this deployment serves: {})",
                    role,
                    self.deployment().role_list()
                )));
            }
        }
        Ok(Session::new(declared_role))
    }

    /// Handle one user message from start to reply.
    pub async fn handle(&self, session: &mut Session, text: &str) -> Result<Reply> {
        session.begin(text);
        loop {
            match self.step(session).await? {
                Step::Continue => continue,
                Step::Replied(text) => {
                    return Ok(Reply {
                        text,
                        awaiting_role: false,
                    })
                }
                Step::Clarify(text) => {
                    return Ok(Reply {
                        text,
                        awaiting_role: true,
                    })
                }
            }
        }
    }

    /// Advance the state machine by one transition.
    ///
    /// Requires a pending user turn (see [`Session::begin`]).
    pub async fn step(&self, session: &mut Session) -> Result<Step> {
        if !session.has_pending_input() {
            return Err(RelevoError::InvalidInput(
                "no pending user message to route".to_string(),
            ));
        }

        match session.state().clone() {
            RouterState::AwaitingRole => {
                let inferred = session
                    .conversation()
                    .latest_user_text()
                    .and_then(|text| self.deployment().infer_role(text));

                match inferred {
                    Some(role) => {
                        info!("Session {} resolved role: {}", session.id(), role);
                        session.resolve_role(role);
                        session.set_state(RouterState::Routing);
                        Ok(Step::Continue)
                    }
                    None => {
                        let question = self.clarifying_question();
                        debug!("Session {} role unresolved, asking", session.id());
                        session
                            .conversation_mut()
                            .push_agent(Author::Supervisor, question.clone());
                        session.finish(RouterState::AwaitingRole);
                        Ok(Step::Clarify(question))
                    }
                }
            }

            RouterState::Routing => {
                let role = session.role().ok_or_else(|| {
                    RelevoError::Agent("routing without a resolved role".to_string())
                })?;
                let agent = self.agent_for(role)?;
                debug!("Session {} routed to {}", session.id(), agent.name());
                session.set_state(RouterState::AwaitingToolCompletion);
                Ok(Step::Continue)
            }

            RouterState::AwaitingToolCompletion => {
                let role = session.role().ok_or_else(|| {
                    RelevoError::Agent("activation without a resolved role".to_string())
                })?;
                let agent = self.agent_for(role)?;
                let report = agent.activate(session.conversation_mut()).await?;
                session.set_state(RouterState::Responding(report));
                Ok(Step::Continue)
            }

            RouterState::Responding(report) => {
                let reply = self.respond(session, &report).await?;
                session
                    .conversation_mut()
                    .push_agent(Author::Supervisor, reply.clone());
                session.finish(RouterState::Routing);
                Ok(Step::Replied(reply))
            }
        }
    }

    fn agent_for(&self, role: Role) -> Result<&RoleAgent> {
        self.agents.get(&role).ok_or_else(|| {
            RelevoError::Agent(format!("no agent serves role {}", role))
        })
    }

    fn clarifying_question(&self) -> String {
        let mut vars = HashMap::new();
        vars.insert("roles".to_string(), self.deployment().role_list());
        self.prompts
            .render_with_custom(&self.prompts.supervisor.clarify_role, &vars)
    }

    /// Phrase the agent's report for the end user.
    async fn respond(&self, session: &Session, report: &AgentReport) -> Result<String> {
        let role = session.role().map(|r| r.display_name()).unwrap_or_default();

        let mut vars = HashMap::new();
        vars.insert("role".to_string(), role.to_string());
        vars.insert("outcome".to_string(), describe_outcome(report));
        let system_prompt = self
            .prompts
            .render_with_custom(&self.prompts.supervisor.respond, &vars);

        let request = CompletionRequest {
            system_prompt,
            turns: session.conversation().visible().cloned().collect(),
            tools: Vec::new(),
        };

        let reply = self.model.complete(request).await?;
        let text = reply.text.unwrap_or_default().trim().to_string();

        if text.is_empty() || self.leaks_internals(&text, report) {
            warn!("Synthesized reply was empty or exposed internals; using fallback");
            let fallback = if report.is_failure() {
                &self.prompts.supervisor.fallback_failure
            } else {
                &self.prompts.supervisor.fallback_success
            };
            return Ok(fallback.clone());
        }

        Ok(text)
    }

    /// Whether a reply names an agent or tool, an error code, or repeats a
    /// raw transport error or malformed-call detail.
    fn leaks_internals(&self, reply: &str, report: &AgentReport) -> bool {
        let lowered = reply.to_lowercase();
        if self.internal_names.iter().any(|name| lowered.contains(name.as_str())) {
            return true;
        }

        match report {
            AgentReport::Tool {
                result:
                    ToolResult::Failure {
                        failure: ToolFailure::TransportError { message },
                    },
                ..
            } => {
                let message = message.to_lowercase();
                lowered.contains(&message)
                    || message
                        .split(':')
                        .next()
                        .is_some_and(|head| !head.trim().is_empty() && lowered.contains(head.trim()))
            }
            AgentReport::Tool {
                tool_name,
                result:
                    ToolResult::Failure {
                        failure: ToolFailure::InvalidArgument { field, reason },
                    },
            } if !is_declared_field(tool_name, field) => {
                let reason = reason.to_lowercase();
                !reason.trim().is_empty() && lowered.contains(reason.trim())
            }
            _ => false,
        }
    }
}

/// Neutral description of an agent report for the reply prompt.
///
/// Transport errors and malformed calls are reduced to fixed sentences; their
/// raw text never reaches the model.
fn describe_outcome(report: &AgentReport) -> String {
    match report {
        AgentReport::Text(text) => format!(
            "No action was executed yet. Status from the assistant handling the request: {}",
            text
        ),
        AgentReport::Tool { tool_name, result } => match result {
            ToolResult::Success { payload } => format!(
                "The requested action completed successfully. Data returned: {}",
                payload.to_prompt_string()
            ),
            ToolResult::Failure {
                failure: ToolFailure::InvalidArgument { field, reason },
            } if is_declared_field(tool_name, field) => format!(
                "The action was not executed because the value for '{}' was not accepted ({}). \
                 Ask the user to provide a valid value.",
                field, reason
            ),
            ToolResult::Failure {
                failure: ToolFailure::InvalidArgument { .. },
            } => "The request could not be completed and nothing was changed. \
                  Ask the user to rephrase the request with the needed details."
                .to_string(),
            ToolResult::Failure {
                failure: ToolFailure::TransportError { .. },
            } => "The external service did not complete the action. Nothing was changed. \
                  Apologize and suggest trying again later."
                .to_string(),
        },
    }
}

/// Whether `field` is an argument the user can supply for this tool.
fn is_declared_field(tool_name: &str, field: &str) -> bool {
    template(tool_name).is_some_and(|t| t.fields.iter().any(|f| f.name == field))
}
