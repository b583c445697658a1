//! Client orchestrator: configuration, registration surface and the request
//! execution pipeline.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod config;
pub mod core;
mod execution;

pub use self::builder::{ApiClientBuilder, JSON_NORMALIZER_TYPE, STATIC_MOCK_TYPE};
pub use self::config::ClientConfig;
pub use self::core::{ApiClient, MockCatalog, NormalizerCatalog};
