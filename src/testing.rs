//! Test doubles for the model and transport seams.

use crate::agent::{ChatModel, CompletionRequest, ModelReply};
use crate::error::{RelevoError, Result};
use crate::role::Deployment;
use crate::tools::{template, ToolRegistry, ToolSpec, Transport, TransportResponse, CATALOG};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

fn endpoint_for(tool: &str) -> String {
    format!("https://hooks.example.com/{}", tool)
}

/// A catalog tool bound to a fake endpoint.
pub fn spec_for(name: &str) -> ToolSpec {
    let template = template(name).unwrap_or_else(|| panic!("no such tool: {}", name));
    ToolSpec::bind(template, Url::parse(&endpoint_for(name)).unwrap())
}

/// A registry with every tool of the deployment bound to a fake endpoint.
pub fn registry_for(deployment: Deployment) -> ToolRegistry {
    let endpoints: HashMap<String, String> = CATALOG
        .iter()
        .map(|t| (t.name.to_string(), endpoint_for(t.name)))
        .collect();
    ToolRegistry::build(deployment, &endpoints).unwrap()
}

/// Model that plays back canned replies and records every request.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ModelReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
    fail: bool,
}

impl ScriptedModel {
    pub fn new(replies: Vec<ModelReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<ModelReply> {
        self.requests.lock().unwrap().push(request);
        if self.fail {
            return Err(RelevoError::Model("backend unavailable".to_string()));
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RelevoError::Model("script exhausted".to_string()))
    }
}

/// Transport that answers every POST the same way and records it.
pub struct StubTransport {
    response: Option<TransportResponse>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl StubTransport {
    pub fn json(status: u16, body: Value) -> Self {
        Self::text(status, &body.to_string())
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            response: Some(TransportResponse {
                status,
                body: body.to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every request fails as if the host refused the connection.
    pub fn unreachable() -> Self {
        Self {
            response: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.calls.lock().unwrap().iter().map(|(_, b)| b.clone()).collect()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn post_json(
        &self,
        endpoint: &Url,
        body: &Value,
        _timeout: Duration,
    ) -> Result<TransportResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), body.clone()));
        self.response.clone().ok_or_else(|| {
            RelevoError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))
        })
    }
}
