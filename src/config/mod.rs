//! Configuration module for Relevo.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts, SupervisorPrompts};
pub use settings::{
    GeneralSettings, ModelSettings, PromptSettings, RouterSettings, ServerSettings, Settings,
    WebhookSettings,
};
