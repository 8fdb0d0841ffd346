//! Webhook tools: the closed catalog, argument validation and the single
//! outbound POST each tool performs.
//!
//! Failures never escape this module as errors. Validation problems and
//! transport problems both come back as [`ToolResult::Failure`] data.

mod catalog;
mod result;
mod spec;
mod transport;
mod webhook;

pub use catalog::{parse_endpoint, template, ToolRegistry, CATALOG};
pub use result::{ToolFailure, ToolPayload, ToolResult};
pub use spec::{FieldKind, FieldSpec, ToolSpec, ToolTemplate};
pub use transport::{HttpTransport, Transport, TransportResponse};
pub use webhook::{WebhookClient, DEFAULT_WEBHOOK_TIMEOUT_SECS};
