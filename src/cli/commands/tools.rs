//! Tools command - list the deployment's tools.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::build_registry;
use crate::tools::FieldKind;
use anyhow::Result;
use console::style;

/// List every tool of the configured deployment, grouped by role.
pub fn run_tools(settings: &Settings) -> Result<()> {
    let registry = build_registry(settings)?;

    Output::header(&format!("Tools ({} deployment)", registry.deployment()));

    for role in registry.deployment().roles() {
        println!("\n{}", style(role.display_name()).bold());
        for spec in registry.tools_for(*role) {
            Output::tool(spec.name, spec.endpoint.as_str(), spec.description);
            for field in spec.fields {
                let kind = match field.kind {
                    FieldKind::Text => "text".to_string(),
                    FieldKind::TextList => "list of text".to_string(),
                    FieldKind::OneOf(options) => options.join(" | "),
                };
                println!("      {} {}", style(field.name).cyan(), style(kind).dim());
            }
        }
    }

    println!();
    Ok(())
}
