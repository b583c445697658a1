//! Core type definitions: payloads, requests and responses.

pub mod payload;
pub mod request;
pub mod response;

pub use payload::Payload;
pub use request::{ApiParams, ApiRequest, CallParams, HttpApiRequest, HttpItemListener};
pub use response::{ApiResponse, STATUS_INTERNAL_ERROR};
