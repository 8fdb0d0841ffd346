//! Per-user session state owned by the supervisor during an invocation.

use super::role_agent::AgentReport;
use crate::conversation::Conversation;
use crate::role::Role;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Where the supervisor is within an invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterState {
    /// No role yet; the latest user turn is inspected for one.
    AwaitingRole,
    /// Role known; pick its agent.
    Routing,
    /// Control is with the role agent for one activation.
    AwaitingToolCompletion,
    /// The agent reported; phrase the user-facing reply.
    Responding(AgentReport),
}

/// One user's conversation plus routing state.
///
/// Sessions are never shared: the caller holds `&mut Session` for the whole
/// invocation.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    conversation: Conversation,
    role: Option<Role>,
    declared: bool,
    state: RouterState,
    pending: bool,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl Session {
    /// Start a session, optionally with a role declared out of band.
    pub(crate) fn new(declared_role: Option<Role>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            conversation: Conversation::new(),
            role: declared_role,
            declared: declared_role.is_some(),
            state: if declared_role.is_some() {
                RouterState::Routing
            } else {
                RouterState::AwaitingRole
            },
            pending: false,
            created_at: now,
            last_active: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub(crate) fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    /// The resolved role, if any. Once set it never changes.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Whether the role came from outside the conversation.
    pub fn is_declared(&self) -> bool {
        self.declared
    }

    pub fn state(&self) -> &RouterState {
        &self.state
    }

    /// Whether a user turn is waiting to be answered.
    pub fn has_pending_input(&self) -> bool {
        self.pending
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Record a user message and arm the state machine.
    pub fn begin(&mut self, text: &str) {
        self.conversation.push_user(text);
        self.pending = true;
        self.last_active = Utc::now();
        self.state = if self.role.is_some() {
            RouterState::Routing
        } else {
            RouterState::AwaitingRole
        };
    }

    pub(crate) fn resolve_role(&mut self, role: Role) {
        if self.role.is_none() {
            self.role = Some(role);
        }
    }

    pub(crate) fn set_state(&mut self, state: RouterState) {
        self.state = state;
    }

    /// Close the invocation; the next step needs a new user turn.
    pub(crate) fn finish(&mut self, next: RouterState) {
        self.state = next;
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_state_follows_declaration() {
        let declared = Session::new(Some(Role::Professor));
        assert_eq!(declared.state(), &RouterState::Routing);
        assert!(declared.is_declared());

        let open = Session::new(None);
        assert_eq!(open.state(), &RouterState::AwaitingRole);
        assert!(!open.has_pending_input());
    }

    #[test]
    fn test_role_resolves_once() {
        let mut session = Session::new(None);
        session.resolve_role(Role::Student);
        session.resolve_role(Role::Administrative);
        assert_eq!(session.role(), Some(Role::Student));
        assert!(!session.is_declared());
    }

    #[test]
    fn test_begin_arms_pending_input() {
        let mut session = Session::new(None);
        session.begin("hola");
        assert!(session.has_pending_input());
        assert_eq!(session.conversation().latest_user_text(), Some("hola"));

        session.finish(RouterState::AwaitingRole);
        assert!(!session.has_pending_input());
    }
}
