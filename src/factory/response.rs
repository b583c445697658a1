use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::plugins::ConstructorCatalog;
use crate::types::{ApiResponse, Payload};

/// Type key of the built-in [`CanonicalReasonDecorator`].
pub const CANONICAL_REASON_DECORATOR: &str = "canonical_reason";

/// Override applied to every response the factory produces.
pub trait ResponseDecorator: Send + Sync {
    fn decorate(&self, response: &mut ApiResponse);
}

pub type DecoratorCatalog = ConstructorCatalog<Arc<dyn ResponseDecorator>>;

pub fn default_decorator_catalog() -> DecoratorCatalog {
    ConstructorCatalog::new("response decorator").with_builtin(
        CANONICAL_REASON_DECORATOR,
        |_: &Value| Ok(Arc::new(CanonicalReasonDecorator) as Arc<dyn ResponseDecorator>),
    )
}

/// Fills an empty reason phrase with the canonical one for the status.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalReasonDecorator;

impl ResponseDecorator for CanonicalReasonDecorator {
    fn decorate(&self, response: &mut ApiResponse) {
        if !response.reason_phrase.is_empty() {
            return;
        }
        if let Some(reason) = StatusCode::from_u16(response.status_code)
            .ok()
            .and_then(|s| s.canonical_reason())
        {
            response.reason_phrase = reason.to_string();
        }
    }
}

#[derive(Clone, Default)]
pub struct ResponseFactory {
    decorator: Option<Arc<dyn ResponseDecorator>>,
}

impl ResponseFactory {
    pub fn new(decorator: Option<Arc<dyn ResponseDecorator>>) -> Self {
        Self { decorator }
    }

    pub fn create(
        &self,
        status_code: u16,
        reason_phrase: &str,
        message: &str,
        content: Option<Payload>,
        custom_data: Option<Value>,
    ) -> ApiResponse {
        let mut response = ApiResponse {
            status_code,
            reason_phrase: reason_phrase.to_string(),
            message: message.to_string(),
            content,
            custom_data,
        };
        if let Some(decorator) = &self.decorator {
            decorator.decorate(&mut response);
        }
        response
    }

    pub fn has_decorator(&self) -> bool {
        self.decorator.is_some()
    }
}

impl fmt::Debug for ResponseFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFactory")
            .field("decorated", &self.has_decorator())
            .finish()
    }
}
