//! Tool outcomes, carried as data rather than errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// What a webhook returned on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum ToolPayload {
    /// A 2xx response whose body parsed as JSON, unmodified.
    Json(Value),
    /// A 2xx response whose body was not JSON.
    Text(String),
}

impl ToolPayload {
    /// Render the payload for a model prompt.
    pub fn to_prompt_string(&self) -> String {
        match self {
            ToolPayload::Json(value) => value.to_string(),
            ToolPayload::Text(text) => text.clone(),
        }
    }
}

/// Why a tool invocation did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolFailure {
    /// An argument failed validation; nothing was sent.
    #[error("invalid_argument: {field}: {reason}")]
    InvalidArgument { field: String, reason: String },
    /// Non-2xx status or network error.
    #[error("transport_error: {message}")]
    TransportError { message: String },
}

impl ToolFailure {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolFailure::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        ToolFailure::TransportError {
            message: message.into(),
        }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ToolFailure::InvalidArgument { .. } => "invalid_argument",
            ToolFailure::TransportError { .. } => "transport_error",
        }
    }
}

/// Outcome of a single webhook invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Success { payload: ToolPayload },
    Failure { failure: ToolFailure },
}

impl ToolResult {
    pub fn success(payload: ToolPayload) -> Self {
        ToolResult::Success { payload }
    }

    pub fn failure(failure: ToolFailure) -> Self {
        ToolResult::Failure { failure }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    pub fn failure_ref(&self) -> Option<&ToolFailure> {
        match self {
            ToolResult::Failure { failure } => Some(failure),
            ToolResult::Success { .. } => None,
        }
    }

    /// JSON sent back to the agent model as the tool message content.
    pub fn to_model_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_display_carries_code() {
        assert_eq!(
            ToolFailure::invalid("tipo", "must be one of: alumno_regular, examen, analitico")
                .to_string(),
            "invalid_argument: tipo: must be one of: alumno_regular, examen, analitico"
        );
        assert_eq!(
            ToolFailure::transport("HTTP 500: boom").to_string(),
            "transport_error: HTTP 500: boom"
        );
    }

    #[test]
    fn test_failure_codes() {
        assert_eq!(ToolFailure::invalid("dni", "expected text").code(), "invalid_argument");
        assert_eq!(ToolFailure::transport("HTTP 500").code(), "transport_error");
    }

    #[test]
    fn test_model_content_shape() {
        let result = ToolResult::success(ToolPayload::Json(json!({"faltas": 2})));
        let content: Value = serde_json::from_str(&result.to_model_content()).unwrap();
        assert_eq!(content["status"], "success");
        assert_eq!(content["payload"]["kind"], "json");
        assert_eq!(content["payload"]["body"]["faltas"], 2);

        let result = ToolResult::failure(ToolFailure::invalid("accion", "not allowed"));
        let content: Value = serde_json::from_str(&result.to_model_content()).unwrap();
        assert_eq!(content["status"], "failure");
        assert_eq!(content["failure"]["kind"], "invalid_argument");
        assert_eq!(content["failure"]["field"], "accion");
    }
}
