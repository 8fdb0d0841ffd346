//! Prompt templates for Relevo.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub supervisor: SupervisorPrompts,
    pub agents: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts used by the router itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorPrompts {
    /// System prompt for the final reply. Receives {{role}} and {{outcome}}.
    pub respond: String,
    /// Question asked when the persona is unknown. Receives {{roles}}.
    pub clarify_role: String,
    /// Reply used when a successful outcome cannot be phrased safely.
    pub fallback_success: String,
    /// Reply used when a failed outcome cannot be phrased safely.
    pub fallback_failure: String,
}

impl Default for SupervisorPrompts {
    fn default() -> Self {
        Self {
            respond: r#"You are the assistant the user is talking to. You are serving a user whose role is: {{role}}.

Internally, their request was handled and this is the outcome:
{{outcome}}

Write the reply to the user.

Guidelines:
- Reply in the same language the user writes in (usually Spanish)
- Be brief, warm and concrete
- If information is missing or was rejected, ask the user for exactly what is needed
- If the action failed, apologize and suggest trying again later
- Never mention internal agents, tools, webhooks, error codes or technical details
- Never paste raw data structures; summarize them in plain words"#
                .to_string(),
            clarify_role: "Antes de seguir necesito saber quién sos. ¿Cuál es tu rol: {{roles}}?"
                .to_string(),
            fallback_success: "Listo, tu pedido fue procesado correctamente.".to_string(),
            fallback_failure: "Lo siento, no pude completar tu pedido en este momento. \
                Por favor, intentá de nuevo más tarde."
                .to_string(),
        }
    }
}

/// System prompts for each role agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub student: String,
    pub professor: String,
    pub administrative: String,
    pub employee: String,
    pub mail: String,
}

const AGENT_RULES: &str = r#"

Rules:
- Use at most one tool per turn, and only when necessary
- Take argument values only from what the user actually said; never invent them
- If a required value is missing, do not call a tool: state briefly what is missing
- Your text is read by a supervisor, not by the user; keep it short and factual"#;

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            student: format!(
                "You are a student services agent. You can look up a student's absences by \
                 subject and request official certificates.{}",
                AGENT_RULES
            ),
            professor: format!(
                "You are a faculty agent. You manage course material files (upload, hide, \
                 show, delete) and send notices to the students of a subject.{}",
                AGENT_RULES
            ),
            administrative: format!(
                "You are an administrative agent. You publish posts on the institution's \
                 LinkedIn page and send the SIU worked-hours reminder to staff.{}",
                AGENT_RULES
            ),
            employee: format!(
                "You are an employee agent responsible for managing employee learning status \
                 records. You can add an employee's training status to the system.{}",
                AGENT_RULES
            ),
            mail: format!(
                "You are a mail agent responsible for creating mail drafts. You can't create \
                 more than one mail draft at a time.{}",
                AGENT_RULES
            ),
        }
    }
}

impl AgentPrompts {
    /// System prompt for a role's agent.
    pub fn for_role(&self, role: Role) -> &str {
        match role {
            Role::Student => &self.student,
            Role::Professor => &self.professor,
            Role::Administrative => &self.administrative,
            Role::Employee => &self.employee,
            Role::MailHandler => &self.mail,
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let supervisor_path = custom_path.join("supervisor.toml");
            if supervisor_path.exists() {
                let content = std::fs::read_to_string(&supervisor_path)?;
                prompts.supervisor = toml::from_str(&content)?;
            }

            let agents_path = custom_path.join("agents.toml");
            if agents_path.exists() {
                let content = std::fs::read_to_string(&agents_path)?;
                prompts.agents = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
