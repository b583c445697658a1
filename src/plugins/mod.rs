//! Plugin system: constructor catalogs, keyed registries, mocks, normalizers
//! and pipeline hooks.

mod catalog;
mod hooks;
mod mock;
mod normalizer;
mod pattern;
mod registry;

pub use catalog::{Constructor, ConstructorCatalog};
pub use hooks::{noop_hooks, ClientHooks, FnEventHook, NoopHooks};
pub use mock::{ApiMock, StaticMock};
pub use normalizer::{FnNormalizer, JsonContentNormalizer, ResponseNormalizer};
pub use pattern::EndpointPattern;
pub use registry::{PluginRegistry, RegistryEntry};

pub type MockRegistry = PluginRegistry<dyn ApiMock>;
pub type NormalizerRegistry = PluginRegistry<dyn ResponseNormalizer>;
