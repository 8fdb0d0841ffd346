//! Error types for Relevo.

use thiserror::Error;

/// Library-level error type for Relevo operations.
///
/// Webhook failures are not errors: they travel as [`crate::tools::ToolResult`]
/// data. Everything here aborts the current invocation.
#[derive(Error, Debug)]
pub enum RelevoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Language model error: {0}")]
    Model(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

/// Result type alias for Relevo operations.
pub type Result<T> = std::result::Result<T, RelevoError>;
