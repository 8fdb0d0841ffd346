//! Supervisor and role agents.
//!
//! A [`Supervisor`] owns the routing state machine. For every user turn it
//! resolves the persona, hands the conversation to that persona's
//! [`RoleAgent`] for a single activation, and writes the only reply the user
//! sees. Language model access goes through the [`ChatModel`] trait.

mod model;
mod role_agent;
mod session;
mod supervisor;

pub use model::{ChatModel, CompletionRequest, ModelReply, RequestedCall, ToolDefinition};
pub use role_agent::{AgentReport, RoleAgent};
pub use session::{RouterState, Session};
pub use supervisor::{Reply, Step, Supervisor};
