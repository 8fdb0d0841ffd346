//! Webhook tool invocation: validate, post once, classify.

use super::result::{ToolFailure, ToolPayload, ToolResult};
use super::spec::ToolSpec;
use super::transport::{Transport, TransportResponse};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default webhook timeout.
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Invokes tools over a shared transport. Never returns an error: every
/// outcome is a [`ToolResult`].
#[derive(Clone)]
pub struct WebhookClient {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl WebhookClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_timeout(transport, Duration::from_secs(DEFAULT_WEBHOOK_TIMEOUT_SECS))
    }

    pub fn with_timeout(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Invoke a tool with model-supplied arguments. No retries.
    pub async fn invoke(&self, spec: &ToolSpec, arguments: &Value) -> ToolResult {
        let body = match spec.validate(arguments) {
            Ok(body) => Value::Object(body),
            Err(failure) => {
                warn!("Rejected arguments for {}: {}", spec.name, failure);
                return ToolResult::failure(failure);
            }
        };

        info!("Calling webhook {}", spec.name);

        match self
            .transport
            .post_json(&spec.endpoint, &body, self.timeout)
            .await
        {
            Ok(response) => classify(spec.name, response),
            Err(e) => {
                warn!("Webhook {} unreachable: {}", spec.name, e);
                ToolResult::failure(ToolFailure::transport(e.to_string()))
            }
        }
    }
}

/// Map an HTTP response to a tool result.
fn classify(tool: &str, response: TransportResponse) -> ToolResult {
    if !response.is_success() {
        warn!("Webhook {} answered HTTP {}", tool, response.status);
        return ToolResult::failure(ToolFailure::transport(format!(
            "HTTP {}: {}",
            response.status,
            preview(&response.body, 200)
        )));
    }

    match serde_json::from_str::<Value>(&response.body) {
        Ok(json) => ToolResult::success(ToolPayload::Json(json)),
        Err(_) => ToolResult::success(ToolPayload::Text(response.body)),
    }
}

fn preview(body: &str, max_chars: usize) -> String {
    let mut out: String = body.chars().take(max_chars).collect();
    if body.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{spec_for, StubTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_enum_violation_makes_no_call() {
        let transport = Arc::new(StubTransport::json(200, json!({"ok": true})));
        let client = WebhookClient::new(transport.clone());
        let spec = spec_for("add_employee_learning_status");

        let result = client
            .invoke(
                &spec,
                &json!({"nombre": "Ana", "apellido": "Paz", "sector": "IT", "capacitacion": "TAL VEZ"}),
            )
            .await;

        match result.failure_ref() {
            Some(ToolFailure::InvalidArgument { field, .. }) => assert_eq!(field, "capacitacion"),
            other => panic!("Expected invalid_argument, got {:?}", other),
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_json_body_returned_unmodified() {
        let payload = json!({"dni": "44852795", "faltas": [{"materia": "Estadística", "cantidad": 3}]});
        let transport = Arc::new(StubTransport::json(200, payload.clone()));
        let client = WebhookClient::new(transport.clone());

        let result = client
            .invoke(
                &spec_for("consultar_faltas"),
                &json!({"dni": "44852795", "materias": ["Estadística"]}),
            )
            .await;

        assert_eq!(result, ToolResult::success(ToolPayload::Json(payload)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_non_json_body_wrapped_as_text() {
        let transport = Arc::new(StubTransport::text(200, "Accepted"));
        let client = WebhookClient::new(transport);

        let result = client
            .invoke(
                &spec_for("create_one_mail_draft"),
                &json!({"mail": "ana@example.com", "asunto": "Hola", "contenido": "Saludos"}),
            )
            .await;

        assert_eq!(result, ToolResult::success(ToolPayload::Text("Accepted".to_string())));
    }

    #[tokio::test]
    async fn test_non_2xx_is_transport_error() {
        let transport = Arc::new(StubTransport::text(500, "Internal Server Error"));
        let client = WebhookClient::new(transport);

        let result = client
            .invoke(
                &spec_for("crear_post_linkedin"),
                &json!({"titulo": "Inscripciones", "contenido": "Abiertas"}),
            )
            .await;

        let failure = result.failure_ref().unwrap();
        assert_eq!(failure.code(), "transport_error");
        assert!(failure.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_network_error_is_transport_error() {
        let transport = Arc::new(StubTransport::unreachable());
        let client = WebhookClient::new(transport.clone());

        let result = client
            .invoke(&spec_for("enviar_recordatorio_horas_siu"), &json!({}))
            .await;

        assert_eq!(result.failure_ref().map(|f| f.code()), Some("transport_error"));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_consultar_faltas_is_idempotent() {
        let transport = Arc::new(StubTransport::json(200, json!({"faltas": 2})));
        let client = WebhookClient::new(transport.clone());
        let spec = spec_for("consultar_faltas");
        let args = json!({"dni": "44852795", "materias": ["Estadística", "Álgebra"]});

        let first = client.invoke(&spec, &args).await;
        let second = client.invoke(&spec, &args).await;

        assert!(first.is_success());
        assert_eq!(first, second);
        let bodies = transport.bodies();
        assert_eq!(bodies[0], bodies[1]);
    }

    #[tokio::test]
    async fn test_no_argument_tool_posts_empty_object() {
        let transport = Arc::new(StubTransport::json(200, json!({"enviados": 41})));
        let client = WebhookClient::new(transport.clone());

        let result = client
            .invoke(&spec_for("enviar_recordatorio_horas_siu"), &Value::Null)
            .await;

        assert!(result.is_success());
        assert_eq!(transport.bodies(), vec![json!({})]);
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("abc", 5), "abc");
        assert_eq!(preview("abcdef", 3), "abc...");
    }
}
