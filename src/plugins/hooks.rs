//! Hook system.

use std::sync::Arc;

use crate::telemetry::EventType;
use crate::types::{ApiRequest, ApiResponse, CallParams};

/// Strategy invoked at fixed points of the request pipeline.
///
/// Both hooks default to no-ops; implement only what you need.
pub trait ClientHooks: Send + Sync {
    /// Called before the request factory runs.
    fn pre_build_request(&self, _params: &CallParams) {}

    /// Internal event callback; only called when events are enabled.
    fn on_event(&self, _event: EventType, _request: &dyn ApiRequest, _response: Option<&ApiResponse>) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl ClientHooks for NoopHooks {}

pub fn noop_hooks() -> Arc<dyn ClientHooks> {
    Arc::new(NoopHooks)
}

/// Internal event hook backed by a closure.
pub struct FnEventHook<F> {
    func: F,
}

impl<F> FnEventHook<F>
where
    F: Fn(EventType, &dyn ApiRequest, Option<&ApiResponse>) + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> ClientHooks for FnEventHook<F>
where
    F: Fn(EventType, &dyn ApiRequest, Option<&ApiResponse>) + Send + Sync,
{
    fn on_event(&self, event: EventType, request: &dyn ApiRequest, response: Option<&ApiResponse>) {
        (self.func)(event, request, response)
    }
}
