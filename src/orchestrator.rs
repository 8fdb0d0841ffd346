//! Wiring for Relevo.
//!
//! Turns [`Settings`] into a ready [`Supervisor`]: model backend, tool
//! registry, webhook client and prompts. Everything is resolved up front so a
//! broken configuration fails at startup rather than mid-conversation.

use crate::agent::{ChatModel, Supervisor};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::openai::{ModelConfig, OpenAiChatModel};
use crate::tools::{HttpTransport, ToolRegistry, Transport, WebhookClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build a supervisor talking to the configured model and real webhooks.
///
/// `model_override` replaces `model.model` for this run only.
pub fn build_supervisor(settings: &Settings, model_override: Option<String>) -> Result<Supervisor> {
    let mut model_config = ModelConfig::from_settings(&settings.model)?;
    if let Some(model) = model_override {
        model_config.model = model;
    }
    info!("Using model {} at {}", model_config.model, model_config.api_base);

    let model: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::new(&model_config)?);
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new());

    build_supervisor_with(settings, model, transport)
}

/// Build a supervisor around the given model and transport.
pub fn build_supervisor_with(
    settings: &Settings,
    model: Arc<dyn ChatModel>,
    transport: Arc<dyn Transport>,
) -> Result<Supervisor> {
    let registry = Arc::new(build_registry(settings)?);

    let prompts = Arc::new(Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?);

    let webhooks = WebhookClient::with_timeout(
        transport,
        Duration::from_secs(settings.webhooks.timeout_secs),
    );

    info!(
        "Serving the {} deployment with {} tool(s)",
        registry.deployment(),
        registry.iter().count()
    );

    Ok(Supervisor::new(registry, model, webhooks, prompts))
}

/// Bind the deployment's tools to their configured endpoints.
pub fn build_registry(settings: &Settings) -> Result<ToolRegistry> {
    ToolRegistry::build(settings.router.deployment, &settings.webhooks.endpoints)
}
