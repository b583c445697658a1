//! 事件与日志协作者：外部事件处理器和错误日志记录器。
//!
//! Events, listeners and logging collaborators.
//!
//! The pipeline reports its progress through three independent channels:
//!
//! | Channel | Gate | Receiver |
//! |---------|------|----------|
//! | internal event | `enable_events` | [`crate::plugins::ClientHooks::on_event`] |
//! | external event | `enable_events` + attached handler | [`EventHandler`] |
//! | listener | `enable_listeners` | [`crate::types::HttpItemListener`] on the request |
//!
//! [`ApiLogger`] is never called by the pipeline itself; callers forward
//! errors to it explicitly through [`crate::ApiClient::log_error`].

use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{error, info};

use crate::types::{ApiRequest, ApiResponse};
use crate::Error;

/// Pipeline notification points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    PreExecute,
    ExecutionSuccess,
    ExecutionError,
    PostExecute,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PreExecute => "api.pre_execute",
            EventType::ExecutionSuccess => "api.execution_success",
            EventType::ExecutionError => "api.execution_error",
            EventType::PostExecute => "api.post_execute",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listener hook points on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerType {
    PreExecute,
    PostExecute,
}

/// Which kind of event object the event factory should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Reserved; the factory produces nothing for it.
    Internal,
    External,
}

/// Structured notification delivered to an [`EventHandler`].
#[derive(Debug)]
pub struct ApiEvent<'a> {
    name: String,
    request: &'a dyn ApiRequest,
    response: Option<&'a ApiResponse>,
}

impl<'a> ApiEvent<'a> {
    pub fn new(
        name: impl Into<String>,
        request: &'a dyn ApiRequest,
        response: Option<&'a ApiResponse>,
    ) -> Self {
        Self {
            name: name.into(),
            request,
            response,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request(&self) -> &'a dyn ApiRequest {
        self.request
    }

    pub fn response(&self) -> Option<&'a ApiResponse> {
        self.response
    }
}

/// Receiver of external events.
pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: &ApiEvent<'_>);
}

/// Out-of-band error logger.
pub trait ApiLogger: Send + Sync {
    fn log_error(&self, error: &Error);
}

/// Owned snapshot of an event, as kept by [`InMemoryEventHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub name: String,
    pub method: String,
    pub endpoint: String,
    pub status: Option<u16>,
}

/// In-memory handler for testing.
#[derive(Debug, Default)]
pub struct InMemoryEventHandler {
    events: RwLock<Vec<RecordedEvent>>,
}

impl InMemoryEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.name).collect()
    }

    pub fn clear(&self) {
        self.events
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventHandler for InMemoryEventHandler {
    fn handle_event(&self, event: &ApiEvent<'_>) {
        let recorded = RecordedEvent {
            name: event.name().to_string(),
            method: event.request().method().to_string(),
            endpoint: event.request().endpoint().to_string(),
            status: event.response().map(|r| r.status_code),
        };
        self.events
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(recorded);
    }
}

/// Logs every external event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventHandler;

impl EventHandler for TracingEventHandler {
    fn handle_event(&self, event: &ApiEvent<'_>) {
        info!(
            event = event.name(),
            method = event.request().method(),
            endpoint = event.request().endpoint(),
            status = event.response().map(|r| r.status_code),
            "api event"
        );
    }
}

/// Logs errors at `error` level through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ApiLogger for TracingLogger {
    fn log_error(&self, err: &Error) {
        error!(error = %err, "api-unit error");
    }
}
