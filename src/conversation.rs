//! Append-only conversation log shared between the supervisor and agents.

use crate::role::Role;
use crate::tools::ToolResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Who wrote an [`Turn::Agent`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    /// The router; the only author whose text reaches the end user.
    Supervisor,
    /// The agent serving a role.
    Agent(Role),
}

impl Author {
    pub fn name(&self) -> &'static str {
        match self {
            Author::Supervisor => "supervisor",
            Author::Agent(role) => role.agent_name(),
        }
    }
}

/// A single entry in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Turn {
    User {
        text: String,
    },
    Agent {
        author: Author,
        text: String,
    },
    ToolCall {
        call_id: Uuid,
        tool_name: String,
        arguments: Value,
    },
    ToolResult {
        call_id: Uuid,
        tool_name: String,
        result: ToolResult,
    },
}

/// Ordered log of turns. Entries can be appended but never edited or removed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::User { text: text.into() });
    }

    pub fn push_agent(&mut self, author: Author, text: impl Into<String>) {
        self.turns.push(Turn::Agent {
            author,
            text: text.into(),
        });
    }

    /// Append a tool call and its result as one adjacent pair.
    ///
    /// This is the only way to record tool activity, so a call is always
    /// immediately followed by its result.
    pub fn push_tool_exchange(&mut self, tool_name: &str, arguments: Value, result: ToolResult) {
        let call_id = Uuid::new_v4();
        self.turns.push(Turn::ToolCall {
            call_id,
            tool_name: tool_name.to_string(),
            arguments,
        });
        self.turns.push(Turn::ToolResult {
            call_id,
            tool_name: tool_name.to_string(),
            result,
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Text of the most recent user turn.
    pub fn latest_user_text(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|turn| match turn {
            Turn::User { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// The reply to show the end user: the latest non-empty supervisor turn.
    pub fn latest_reply(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|turn| match turn {
            Turn::Agent {
                author: Author::Supervisor,
                text,
            } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        })
    }

    /// Turns an end user may see: their own messages and supervisor replies.
    pub fn visible(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|turn| {
            matches!(
                turn,
                Turn::User { .. }
                    | Turn::Agent {
                        author: Author::Supervisor,
                        ..
                    }
            )
        })
    }

    /// Number of tool calls recorded from index `from` onwards.
    pub fn tool_calls_since(&self, from: usize) -> usize {
        self.turns
            .iter()
            .skip(from)
            .filter(|turn| matches!(turn, Turn::ToolCall { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolFailure, ToolPayload};
    use serde_json::json;

    #[test]
    fn test_tool_exchange_is_adjacent_pair() {
        let mut conversation = Conversation::new();
        conversation.push_user("subí el apunte");
        conversation.push_tool_exchange(
            "gestionar_material",
            json!({"materia": "Física", "archivo": "tp.pdf", "accion": "subir"}),
            ToolResult::success(ToolPayload::Text("ok".to_string())),
        );

        match &conversation.turns()[1..] {
            [Turn::ToolCall { call_id: a, tool_name: n1, .. }, Turn::ToolResult { call_id: b, tool_name: n2, .. }] =>
            {
                assert_eq!(a, b);
                assert_eq!(n1, n2);
            }
            other => panic!("Unexpected turns: {:?}", other),
        }
        assert_eq!(conversation.tool_calls_since(0), 1);
        assert_eq!(conversation.tool_calls_since(2), 0);
    }

    #[test]
    fn test_latest_reply_skips_agents_and_blank_text() {
        let mut conversation = Conversation::new();
        assert_eq!(conversation.latest_reply(), None);

        conversation.push_user("hola");
        conversation.push_agent(Author::Supervisor, "¿Sos alumno, profesor o administrativo?");
        conversation.push_user("alumno");
        conversation.push_agent(Author::Agent(Role::Student), "needs dni");
        conversation.push_agent(Author::Supervisor, "   ");

        assert_eq!(
            conversation.latest_reply(),
            Some("¿Sos alumno, profesor o administrativo?")
        );
        assert_eq!(conversation.latest_user_text(), Some("alumno"));
    }

    #[test]
    fn test_visible_hides_internal_turns() {
        let mut conversation = Conversation::new();
        conversation.push_user("publicá el aviso");
        conversation.push_tool_exchange(
            "crear_post_linkedin",
            json!({"titulo": "a", "contenido": "b"}),
            ToolResult::failure(ToolFailure::transport("HTTP 500")),
        );
        conversation.push_agent(Author::Agent(Role::Administrative), "failed");
        conversation.push_agent(Author::Supervisor, "No pude publicarlo.");

        let visible: Vec<_> = conversation.visible().collect();
        assert_eq!(visible.len(), 2);
        assert_eq!(conversation.len(), 5);
    }

    #[test]
    fn test_turn_serialization_tags() {
        let turn = Turn::Agent {
            author: Author::Agent(Role::Student),
            text: "hi".to_string(),
        };
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["type"], "agent");
        assert_eq!(value["author"]["agent"], "student");
        assert_eq!(Author::Agent(Role::Student).name(), "student_agent");
    }
}
