//! CLI command implementations.

mod call;
mod chat;
mod config;
mod doctor;
mod serve;
mod tools;

pub use call::run_call;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::run_serve;
pub use tools::run_tools;

/// Shown instead of any backend error text.
pub(crate) const UNAVAILABLE_REPLY: &str =
    "Lo siento, no pude procesar tu pedido en este momento. Probá de nuevo en unos minutos.";
