//! Configuration settings for Relevo.

use crate::error::{RelevoError, Result};
use crate::role::{Deployment, Role};
use crate::tools::DEFAULT_WEBHOOK_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub router: RouterSettings,
    pub webhooks: WebhookSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Language model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Chat model used by the supervisor and every agent.
    pub model: String,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Routing settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RouterSettings {
    /// Which set of agents this process serves.
    pub deployment: Deployment,
    /// Role declared for every session (e.g. "alumno"). Unset means infer
    /// from the conversation or ask.
    pub role: Option<String>,
}

/// Webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Tool name → endpoint URL.
    pub endpoints: HashMap<String, String>,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        let endpoints = [
            (
                "add_employee_learning_status",
                "https://hook.us1.make.com/glaoqvgpbznxve282fplcv4ubzt1bqcg",
            ),
            (
                "create_one_mail_draft",
                "https://hook.us1.make.com/ttuc08gt5xsckmp4dkw4zn224avxqpu4",
            ),
        ]
        .into_iter()
        .map(|(tool, url)| (tool.to_string(), url.to_string()))
        .collect();

        Self {
            timeout_secs: DEFAULT_WEBHOOK_TIMEOUT_SECS,
            endpoints,
        }
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Seconds a session may sit idle before it is dropped. 0 keeps
    /// sessions until they are deleted.
    pub session_ttl_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            session_ttl_secs: 3600,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| RelevoError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("relevo")
            .join("config.toml")
    }

    /// The declared role, checked against the deployment.
    pub fn declared_role(&self) -> Result<Option<Role>> {
        self.router
            .role
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .map(|raw| self.check_role(raw))
            .transpose()
    }

    /// Parse a role name and make sure this deployment serves it.
    pub fn check_role(&self, raw: &str) -> Result<Role> {
        let role: Role = raw.parse()?;
        if !self.router.deployment.supports(role) {
            return Err(RelevoError::Config(format!(
                "Role '{}' is not served by the {} deployment (expected one of: {})",
                raw,
                self.router.deployment,
                self.router.deployment.role_list()
            )));
        }
        Ok(role)
    }

    /// Set a value by dotted key, e.g. `model.model` or
    /// `webhooks.endpoints.consultar_faltas`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parse_u64 = |v: &str| {
            v.parse::<u64>()
                .map_err(|_| RelevoError::Config(format!("'{}' expects a number, got '{}'", key, v)))
        };

        match key.split('.').collect::<Vec<_>>().as_slice() {
            ["general", "log_level"] => self.general.log_level = value.to_string(),
            ["model", "model"] => self.model.model = value.to_string(),
            ["model", "api_base"] => self.model.api_base = value.to_string(),
            ["model", "api_key_env"] => self.model.api_key_env = value.to_string(),
            ["model", "timeout_secs"] => self.model.timeout_secs = parse_u64(value)?,
            ["router", "deployment"] => {
                self.router.deployment = value.parse().map_err(RelevoError::Config)?
            }
            ["router", "role"] => {
                self.router.role = Some(value.to_string()).filter(|v| !v.is_empty())
            }
            ["webhooks", "timeout_secs"] => self.webhooks.timeout_secs = parse_u64(value)?,
            ["webhooks", "endpoints", tool] => {
                if crate::tools::template(tool).is_none() {
                    return Err(RelevoError::Config(format!("Unknown tool: {}", tool)));
                }
                crate::tools::parse_endpoint(tool, value)?;
                self.webhooks
                    .endpoints
                    .insert(tool.to_string(), value.to_string());
            }
            ["server", "session_ttl_secs"] => {
                self.server.session_ttl_secs = parse_u64(value)?
            }
            ["prompts", "custom_dir"] => {
                self.prompts.custom_dir = Some(value.to_string()).filter(|v| !v.is_empty())
            }
            ["prompts", "variables", name] => {
                self.prompts
                    .variables
                    .insert(name.to_string(), value.to_string());
            }
            _ => return Err(RelevoError::Config(format!("Unknown setting: {}", key))),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.model.model, "gpt-4o");
        assert_eq!(settings.model.api_key_env, "OPENAI_API_KEY");
        assert_eq!(settings.webhooks.timeout_secs, 10);
        assert_eq!(settings.router.deployment, Deployment::University);
        assert!(settings.webhooks.endpoints.contains_key("create_one_mail_draft"));
        assert_eq!(settings.declared_role().unwrap(), None);
        assert_eq!(settings.server.session_ttl_secs, 3600);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [router]
            deployment = "workplace"
            role = "empleado"

            [webhooks.endpoints]
            consultar_faltas = "https://hooks.example.com/faltas"
            "#,
        )
        .unwrap();

        assert_eq!(settings.router.deployment, Deployment::Workplace);
        assert_eq!(settings.declared_role().unwrap(), Some(Role::Employee));
        assert_eq!(settings.webhooks.timeout_secs, 10);
        assert_eq!(settings.model.model, "gpt-4o");
        assert_eq!(
            settings.webhooks.endpoints.get("consultar_faltas").map(String::as_str),
            Some("https://hooks.example.com/faltas")
        );
    }

    #[test]
    fn test_declared_role_must_fit_deployment() {
        let mut settings = Settings::default();
        settings.router.role = Some("empleado".to_string());
        assert!(settings.declared_role().is_err());

        settings.router.role = Some("alumno".to_string());
        assert_eq!(settings.declared_role().unwrap(), Some(Role::Student));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.set("router.role", "profesor").unwrap();
        settings
            .set("webhooks.endpoints.gestionar_material", "https://hooks.example.com/material")
            .unwrap();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.router.role.as_deref(), Some("profesor"));
        assert_eq!(
            loaded.webhooks.endpoints.get("gestionar_material").map(String::as_str),
            Some("https://hooks.example.com/material")
        );
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(settings.model.timeout_secs, 300);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut settings = Settings::default();
        assert!(settings.set("model.timeout_secs", "soon").is_err());
        assert!(settings.set("webhooks.endpoints.nope", "https://x.example").is_err());
        assert!(settings.set("webhooks.endpoints.consultar_faltas", "file:///tmp").is_err());
        assert!(settings.set("router.deployment", "casino").is_err());
        assert!(settings.set("colors.theme", "dark").is_err());

        assert!(settings.set("server.session_ttl_secs", "-5").is_err());

        settings.set("router.deployment", "workplace").unwrap();
        assert_eq!(settings.router.deployment, Deployment::Workplace);
        settings.set("server.session_ttl_secs", "0").unwrap();
        assert_eq!(settings.server.session_ttl_secs, 0);
    }
}
