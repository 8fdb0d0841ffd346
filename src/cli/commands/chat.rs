//! Interactive chat command.

use super::UNAVAILABLE_REPLY;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::build_supervisor;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::warn;

/// Run the interactive chat command.
pub async fn run_chat(role: Option<String>, model: Option<String>, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Converse, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'relevo doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let declared = match role.as_deref() {
        Some(raw) => Some(settings.check_role(raw)?),
        None => settings.declared_role()?,
    };

    let supervisor = build_supervisor(&settings, model)?;
    let mut session = supervisor.start_session(declared)?;

    println!("\n{}", style("Relevo Chat").bold().cyan());
    match declared {
        Some(role) => Output::kv("Rol", role.display_name()),
        None => Output::kv("Roles", &supervisor.deployment().role_list()),
    }
    println!(
        "{}\n",
        style("Type your request, or 'exit' to quit. Use 'clear' to start over.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("Vos:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session = supervisor.start_session(declared)?;
            Output::info("Conversation cleared.");
            continue;
        }

        let spinner = Output::spinner("Pensando...");
        let result = supervisor.handle(&mut session, input).await;
        spinner.finish_and_clear();

        match result {
            Ok(reply) => Output::reply("Relevo", &reply.text),
            Err(e) => {
                warn!("Invocation failed: {}", e);
                Output::reply("Relevo", UNAVAILABLE_REPLY);
            }
        }
    }

    Ok(())
}
