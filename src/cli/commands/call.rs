//! Call command - invoke one webhook tool directly.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::RelevoError;
use crate::orchestrator::build_registry;
use crate::tools::{HttpTransport, ToolResult, WebhookClient};
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Validate the arguments, call the tool's endpoint and print the result.
pub async fn run_call(tool: &str, args: Option<&str>, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::CallTool, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'relevo doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let registry = build_registry(settings)?;
    let spec = registry.get(tool).ok_or_else(|| {
        let known = registry
            .iter()
            .map(|(_, spec)| spec.name)
            .collect::<Vec<_>>()
            .join(", ");
        RelevoError::InvalidInput(format!("Unknown tool '{}' (available: {})", tool, known))
    })?;

    let arguments = parse_arguments(args)?;

    let webhooks = WebhookClient::with_timeout(
        Arc::new(HttpTransport::new()),
        Duration::from_secs(settings.webhooks.timeout_secs),
    );

    let spinner = Output::spinner(&format!("Calling {}...", spec.name));
    let result = webhooks.invoke(spec, &arguments).await;
    spinner.finish_and_clear();

    println!("{}", serde_json::to_string_pretty(&result)?);
    match &result {
        ToolResult::Success { .. } => Output::success("Tool call succeeded."),
        ToolResult::Failure { failure } => Output::warning(&format!("Tool call failed: {}", failure)),
    }

    Ok(())
}

/// Parse the CLI argument string; nothing means `{}`.
fn parse_arguments(raw: Option<&str>) -> crate::error::Result<Value> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(serde_json::from_str(raw)?),
        None => Ok(Value::Object(Default::default())),
    }
}
