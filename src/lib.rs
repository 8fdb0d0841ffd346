//! Relevo - Role-based conversational routing
//!
//! A supervisor that works out who the user is, hands the conversation to the
//! agent for that role, lets the agent call at most one webhook-backed tool,
//! and phrases the outcome for the user.
//!
//! # Overview
//!
//! Relevo allows you to:
//! - Serve a university (alumno, profesor, administrativo) or a workplace
//!   (empleado, correo) deployment from one binary
//! - Bind every tool to a configurable webhook endpoint
//! - Chat from the terminal or over a small HTTP API
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings and prompt templates
//! - `role` - Roles, deployments and role inference
//! - `tools` - Tool catalog, argument validation and webhook calls
//! - `conversation` - Append-only conversation log
//! - `agent` - Role agents, sessions and the supervisor state machine
//! - `openai` - Chat model backend
//! - `orchestrator` - Wiring from settings to a ready supervisor
//!
//! # Example
//!
//! ```rust,no_run
//! use relevo::config::Settings;
//! use relevo::orchestrator::build_supervisor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let supervisor = build_supervisor(&settings, None)?;
//!
//!     let mut session = supervisor.start_session(settings.declared_role()?)?;
//!     let reply = supervisor
//!         .handle(&mut session, "Soy alumno, DNI 44852795, ¿cuántas faltas tengo en Estadística?")
//!         .await?;
//!     println!("{}", reply.text);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod role;
pub mod tools;

#[cfg(test)]
mod testing;

pub use error::{RelevoError, Result};
