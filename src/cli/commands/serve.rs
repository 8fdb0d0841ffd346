//! HTTP API server for integration with other systems.
//!
//! Exposes sessions over REST: open a session, post user messages, read the
//! visible transcript and close it again. Sessions live in memory only and
//! are dropped once idle for longer than `server.session_ttl_secs`.

use super::UNAVAILABLE_REPLY;
use crate::agent::{Session, Supervisor};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::conversation::{Author, Turn};
use crate::error::RelevoError;
use crate::orchestrator::build_supervisor;
use crate::role::Role;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    supervisor: Supervisor,
    default_role: Option<Role>,
    /// None keeps sessions until deleted.
    session_ttl: Option<TimeDelta>,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl AppState {
    fn new(supervisor: Supervisor, default_role: Option<Role>, session_ttl_secs: u64) -> Self {
        let session_ttl = i64::try_from(session_ttl_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(TimeDelta::try_seconds);
        Self {
            supervisor,
            default_role,
            session_ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Drop sessions idle for longer than the TTL. Returns how many went.
    ///
    /// A session whose lock is held is mid-invocation and always kept.
    async fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let Some(ttl) = self.session_ttl else {
            return 0;
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => now - session.last_active() <= ttl,
            Err(_) => true,
        });
        before - sessions.len()
    }

    async fn session(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        let id = Uuid::parse_str(id).ok()?;
        self.sessions.read().await.get(&id).cloned()
    }
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Converse, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'relevo doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let default_role = settings.declared_role()?;
    let supervisor = build_supervisor(&settings, None)?;
    let deployment = supervisor.deployment();
    let state = Arc::new(AppState::new(
        supervisor,
        default_role,
        settings.server.session_ttl_secs,
    ));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Relevo API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Deployment", &deployment.to_string());
    Output::kv(
        "Session TTL",
        &match settings.server.session_ttl_secs {
            0 => "none".to_string(),
            secs => format!("{}s", secs),
        },
    );
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Tools", "GET    /tools");
    Output::kv("Open session", "POST   /sessions");
    Output::kv("Send message", "POST   /sessions/{id}/messages");
    Output::kv("Transcript", "GET    /sessions/{id}/messages");
    Output::kv("Close session", "DELETE /sessions/{id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", axum::routing::delete(delete_session))
        .route(
            "/sessions/{id}/messages",
            post(post_message).get(get_messages),
        )
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize, Default)]
struct CreateSessionRequest {
    /// Role declared out of band, e.g. "alumno".
    #[serde(default)]
    role: Option<String>,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
    role: Option<String>,
}

#[derive(Deserialize)]
struct MessageRequest {
    text: String,
}

#[derive(Serialize)]
struct MessageResponse {
    reply: String,
    awaiting_role: bool,
}

#[derive(Serialize)]
struct TranscriptResponse {
    session_id: Uuid,
    role: Option<String>,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
    messages: Vec<TranscriptEntry>,
}

#[derive(Serialize)]
struct TranscriptEntry {
    from: &'static str,
    text: String,
}

#[derive(Serialize)]
struct ToolsResponse {
    deployment: String,
    tools: Vec<ToolInfo>,
}

#[derive(Serialize)]
struct ToolInfo {
    name: &'static str,
    role: String,
    agent: &'static str,
    description: &'static str,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn session_not_found(id: &str) -> axum::response::Response {
    error_response(
        StatusCode::NOT_FOUND,
        RelevoError::SessionNotFound(id.to_string()).to_string(),
    )
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_tools(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let registry = state.supervisor.registry();
    Json(ToolsResponse {
        deployment: registry.deployment().to_string(),
        tools: registry
            .iter()
            .map(|(role, spec)| ToolInfo {
                name: spec.name,
                role: role.display_name().to_string(),
                agent: role.agent_name(),
                description: spec.description,
                parameters: spec.parameters_schema(),
            })
            .collect(),
    })
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateSessionRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let declared = match req.role.as_deref().filter(|r| !r.trim().is_empty()) {
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        },
        None => state.default_role,
    };

    let session = match state.supervisor.start_session(declared) {
        Ok(session) => session,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let evicted = state.evict_idle(Utc::now()).await;
    if evicted > 0 {
        info!("Dropped {} idle session(s)", evicted);
    }

    let id = session.id();
    state
        .sessions
        .write()
        .await
        .insert(id, Arc::new(Mutex::new(session)));
    info!("Opened session {}", id);

    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: id,
            role: declared.map(|r| r.display_name().to_string()),
        }),
    )
        .into_response()
}

async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> impl IntoResponse {
    let Some(session) = state.session(&id).await else {
        return session_not_found(&id);
    };

    if req.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message text is empty");
    }

    // One invocation at a time per session.
    let mut session = session.lock().await;
    match state.supervisor.handle(&mut session, &req.text).await {
        Ok(reply) => Json(MessageResponse {
            reply: reply.text,
            awaiting_role: reply.awaiting_role,
        })
        .into_response(),
        Err(e) => {
            warn!("Invocation failed for session {}: {}", id, e);
            error_response(StatusCode::BAD_GATEWAY, UNAVAILABLE_REPLY)
        }
    }
}

async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Some(session) = state.session(&id).await else {
        return session_not_found(&id);
    };

    let session = session.lock().await;
    let messages = session
        .conversation()
        .visible()
        .filter_map(|turn| match turn {
            Turn::User { text } => Some(TranscriptEntry {
                from: "user",
                text: text.clone(),
            }),
            Turn::Agent {
                author: Author::Supervisor,
                text,
            } => Some(TranscriptEntry {
                from: "assistant",
                text: text.clone(),
            }),
            _ => None,
        })
        .collect();

    Json(TranscriptResponse {
        session_id: session.id(),
        role: session.role().map(|r| r.display_name().to_string()),
        created_at: session.created_at(),
        last_active: session.last_active(),
        messages,
    })
    .into_response()
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let removed = match Uuid::parse_str(&id) {
        Ok(uuid) => state.sessions.write().await.remove(&uuid),
        Err(_) => None,
    };

    match removed {
        Some(_) => {
            info!("Closed session {}", id);
            StatusCode::NO_CONTENT.into_response()
        }
        None => session_not_found(&id),
    }
}
