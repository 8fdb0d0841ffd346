//! Doctor command - verify credentials and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::openai::read_api_key;
use crate::tools::{parse_endpoint, CATALOG};
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Relevo Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Model").bold());
    let model_checks = vec![check_api_key(settings), check_api_base(settings)];
    print_all(&model_checks);
    checks.extend(model_checks);

    println!();

    println!("{}", style("Routing").bold());
    let role_check = check_declared_role(settings);
    role_check.print();
    checks.push(role_check);

    println!();

    println!(
        "{}",
        style(format!("Webhooks ({} deployment)", settings.router.deployment)).bold()
    );
    let endpoint_checks = check_endpoints(settings);
    print_all(&endpoint_checks);
    checks.extend(endpoint_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Relevo.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Relevo is ready to use.");
    }

    Ok(())
}

fn print_all(checks: &[CheckResult]) {
    for check in checks {
        check.print();
    }
}

/// Check that the model credential is present.
fn check_api_key(settings: &Settings) -> CheckResult {
    let var = &settings.model.api_key_env;
    match read_api_key(var) {
        Ok(key) if key.chars().count() > 12 => {
            let head: String = key.chars().take(7).collect();
            let tail: String = key.chars().skip(key.chars().count() - 4).collect();
            CheckResult::ok(var, &format!("configured ({}...{})", head, tail))
        }
        Ok(_) => CheckResult::warning(
            var,
            "set but looks too short",
            "Expected a full API key",
        ),
        Err(_) => CheckResult::error(var, "not set", &format!("Set with: export {}='sk-...'", var)),
    }
}

fn check_api_base(settings: &Settings) -> CheckResult {
    match url::Url::parse(&settings.model.api_base) {
        Ok(_) => CheckResult::ok(
            "API base",
            &format!("{} ({})", settings.model.api_base, settings.model.model),
        ),
        Err(e) => CheckResult::error(
            "API base",
            &format!("invalid URL: {}", e),
            "Fix with: relevo config set model.api_base https://...",
        ),
    }
}

/// Check the declared role against the deployment.
fn check_declared_role(settings: &Settings) -> CheckResult {
    let deployment = settings.router.deployment;
    match settings.declared_role() {
        Ok(Some(role)) => CheckResult::ok(
            "Role",
            &format!("declared as {} ({} deployment)", role, deployment),
        ),
        Ok(None) => CheckResult::ok(
            "Role",
            &format!("inferred per conversation ({})", deployment.role_list()),
        ),
        Err(e) => CheckResult::error(
            "Role",
            &e.to_string(),
            &format!("Use one of: {}", deployment.role_list()),
        ),
    }
}

/// Check that every tool of the deployment has a usable endpoint.
fn check_endpoints(settings: &Settings) -> Vec<CheckResult> {
    let deployment = settings.router.deployment;
    CATALOG
        .iter()
        .filter(|t| deployment.supports(t.role))
        .map(|template| {
            let hint = format!(
                "Set with: relevo config set webhooks.endpoints.{} https://...",
                template.name
            );
            match settings.webhooks.endpoints.get(template.name) {
                None => CheckResult::error(template.name, "no endpoint configured", &hint),
                Some(raw) => match parse_endpoint(template.name, raw) {
                    Ok(url) => CheckResult::ok(template.name, url.as_str()),
                    Err(e) => CheckResult::error(template.name, &e.to_string(), &hint),
                },
            }
        })
        .collect()
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: relevo config edit",
        )
    }
}
