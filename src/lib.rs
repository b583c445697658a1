//! # api-unit
//!
//! 可扩展的出站 API 客户端：请求管线、模拟与响应规范化插件、事件通知和 HTTP 传输。
//!
//! Extensible outbound API client. A logical call description flows through
//! a fixed pipeline: request construction, mock interception, transport
//! dispatch, response normalization and event/listener notification.
//!
//! ## Overview
//!
//! - **Never faults mid-call**: [`ApiClient::request`] always returns an
//!   [`ApiResponse`]; internal and transport failures become status 500 with
//!   a descriptive message.
//! - **Keyed plugins**: mocks and normalizers live in insertion-ordered
//!   registries with unique keys; the first matching entry wins.
//! - **Constructor catalogs**: requests, mocks, normalizers, response
//!   decorators and gateway clients are created from string type keys.
//! - **Synchronous**: one blocking transport handle per call, released on
//!   every exit path.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use api_unit::{ApiClient, CallParams, ClientConfig};
//! use serde_json::json;
//!
//! fn main() -> api_unit::Result<()> {
//!     let mut client = ApiClient::builder()
//!         .api_param("base_url", "https://api.example.com")
//!         .config(ClientConfig::new().with_mocks(true))
//!         .build()?;
//!     client.add_mock(
//!         "static",
//!         &json!({"name": "users", "pattern": "^/users", "content": {"users": []}}),
//!     )?;
//!     client.initialize()?;
//!
//!     let response = client.request(CallParams::new("get", "/users").with_query("page", "1"));
//!     assert_eq!(response.status_code, 200);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client orchestrator, builder and configuration |
//! | [`plugins`] | Constructor catalogs, registries, mocks, normalizers, hooks |
//! | [`factory`] | Request, response and event factories |
//! | [`transport`] | Transport contract, option model and blocking HTTP transport |
//! | [`telemetry`] | Events, event handlers and error loggers |
//! | [`types`] | Payloads, requests and responses |
//! | `gateway` | Named client container (feature `gateway`) |

pub mod client;
pub mod factory;
pub mod plugins;
pub mod telemetry;
pub mod transport;
pub mod types;

#[cfg(feature = "gateway")]
pub mod gateway;

pub use client::{ApiClient, ApiClientBuilder, ClientConfig};
pub use plugins::{ApiMock, ClientHooks, ResponseNormalizer, StaticMock};
pub use telemetry::{ApiEvent, ApiLogger, EventHandler, EventType};
pub use transport::{HttpTransport, HttpTransportConfig, Transport, TransportResult};
pub use types::{ApiRequest, ApiResponse, CallParams, HttpApiRequest, Payload};

#[cfg(feature = "gateway")]
pub use gateway::ApiGateway;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
