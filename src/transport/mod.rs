//! Transport layer: the executor contract and the HTTP implementation.

pub mod http;
pub mod options;

pub use http::{HttpTransport, HttpTransportConfig, MethodSemantics, PreparedCall, ProxyConfig};
pub use options::{OptionKey, OptionValue, TransportOptions};

use std::sync::Arc;

use crate::types::{ApiRequest, Payload, STATUS_INTERNAL_ERROR};

/// Executes a built request and reports the raw outcome.
///
/// Implementations never panic or return `Err`: every failure is reported
/// through [`TransportResult::failure`].
pub trait Transport: Send + Sync {
    fn execute(&self, request: &dyn ApiRequest) -> TransportResult;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &dyn ApiRequest) -> TransportResult {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &dyn ApiRequest) -> TransportResult {
        (**self).execute(request)
    }
}

/// Raw outcome of a transport execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResult {
    pub status: u16,
    pub content: Option<Payload>,
    /// True when the call failed at the transport layer. HTTP error statuses
    /// are not transport errors.
    pub error: bool,
    pub message: String,
}

impl TransportResult {
    /// A completed execution. A reported status of 0 is coerced to 500.
    pub fn success(status: u16, content: Option<Payload>) -> Self {
        Self {
            status: if status == 0 { STATUS_INTERNAL_ERROR } else { status },
            content,
            error: false,
            message: String::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_INTERNAL_ERROR,
            content: None,
            error: true,
            message: message.into(),
        }
    }

    pub fn from_error(err: &TransportError) -> Self {
        let detail = err.to_string();
        let detail = if detail.trim().is_empty() {
            "Unknown".to_string()
        } else {
            detail
        };
        Self::failure(format!("Transport error: {}", detail))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid method \"{0}\"")]
    InvalidMethod(String),

    #[error("invalid header \"{0}\"")]
    InvalidHeader(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("{0}")]
    Other(String),
}
