use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::client::config::ClientConfig;
use crate::factory::{DecoratorCatalog, EventFactory, RequestFactory, ResponseFactory};
use crate::plugins::{
    ApiMock, ClientHooks, ConstructorCatalog, MockRegistry, NormalizerRegistry, ResponseNormalizer,
};
use crate::telemetry::{ApiLogger, EventHandler};
use crate::transport::Transport;
use crate::types::ApiParams;
use crate::{Error, Result};

pub type MockCatalog = ConstructorCatalog<Box<dyn ApiMock>>;
pub type NormalizerCatalog = ConstructorCatalog<Box<dyn ResponseNormalizer>>;

/// Client orchestrating the request pipeline.
///
/// A client starts uninitialized and rejects every call with a 500 response
/// until [`ApiClient::initialize`] succeeds. Independently it can be disabled
/// with [`ApiClient::set_enabled`].
pub struct ApiClient {
    pub(crate) api_params: ApiParams,
    /// Configuration applied by the next `initialize`.
    pub(crate) pending_config: ClientConfig,
    /// Configuration in effect.
    pub(crate) config: ClientConfig,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) hooks: Arc<dyn ClientHooks>,
    pub(crate) event_handler: Option<Arc<dyn EventHandler>>,
    pub(crate) logger: Option<Arc<dyn ApiLogger>>,
    pub(crate) request_factory: RequestFactory,
    pub(crate) response_factory: ResponseFactory,
    pub(crate) event_factory: EventFactory,
    pub(crate) request_type: String,
    pub(crate) request_args: Value,
    pub(crate) response_decorator: Option<(String, Value)>,
    pub(crate) decorator_types: DecoratorCatalog,
    pub(crate) mock_types: MockCatalog,
    pub(crate) normalizer_types: NormalizerCatalog,
    pub(crate) mocks: MockRegistry,
    pub(crate) normalizers: NormalizerRegistry,
    pub(crate) operational: bool,
    pub(crate) enabled: bool,
}

impl ApiClient {
    pub fn builder() -> crate::client::builder::ApiClientBuilder {
        crate::client::builder::ApiClientBuilder::new()
    }

    /// Apply the pending configuration and resolve the response decorator,
    /// then mark the client operational.
    ///
    /// Fails only for an unresolvable decorator; the client then stays in its
    /// previous state.
    pub fn initialize(&mut self) -> Result<()> {
        let decorator = match &self.response_decorator {
            Some((key, args)) => Some(self.decorator_types.instantiate(key, args)?),
            None => None,
        };

        self.config = self.pending_config.clone().with_env_overrides();
        self.response_factory = ResponseFactory::new(decorator);
        self.operational = true;

        info!(
            request_type = self.request_type.as_str(),
            enable_mocks = self.config.enable_mocks,
            enable_events = self.config.enable_events,
            enable_listeners = self.config.enable_listeners,
            mocks = self.mocks.len(),
            normalizers = self.normalizers.len(),
            "api client initialized"
        );
        Ok(())
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Configuration in effect.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replace the configuration; it takes effect at the next `initialize`.
    pub fn set_client_config(&mut self, config: ClientConfig) {
        self.pending_config = config;
    }

    pub fn set_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.event_handler = Some(handler);
    }

    pub fn set_logger(&mut self, logger: Arc<dyn ApiLogger>) {
        self.logger = Some(logger);
    }

    pub fn set_hooks(&mut self, hooks: Arc<dyn ClientHooks>) {
        self.hooks = hooks;
    }

    /// Forward an error to the attached logger, if any.
    pub fn log_error(&self, err: &Error) {
        if let Some(logger) = &self.logger {
            logger.log_error(err);
        }
    }

    pub fn api_params(&self) -> &ApiParams {
        &self.api_params
    }

    pub fn request_factory(&self) -> &RequestFactory {
        &self.request_factory
    }

    pub fn response_factory(&self) -> &ResponseFactory {
        &self.response_factory
    }

    pub fn mocks(&self) -> &MockRegistry {
        &self.mocks
    }

    pub fn normalizers(&self) -> &NormalizerRegistry {
        &self.normalizers
    }

    /// Instantiate a normalizer of type `type_key` and register it under its
    /// rule.
    pub fn register_normalizer(&mut self, type_key: &str, args: &Value) -> Result<()> {
        let normalizer = self.normalizer_types.instantiate(type_key, args)?;
        self.normalizers.register(Arc::from(normalizer))
    }

    pub fn register_normalizer_instance<N>(&mut self, normalizer: N) -> Result<()>
    where
        N: ResponseNormalizer + 'static,
    {
        self.normalizers.register(Arc::new(normalizer))
    }

    pub fn unregister_normalizer(&mut self, rule: &str) -> bool {
        self.normalizers.unregister(rule)
    }

    /// Instantiate a mock of type `type_key`, run its `build` hook and
    /// register it under its name.
    pub fn add_mock(&mut self, type_key: &str, args: &Value) -> Result<()> {
        let mock = self.mock_types.instantiate(type_key, args)?;
        self.store_mock(mock)
    }

    pub fn add_mock_instance<M>(&mut self, mock: M) -> Result<()>
    where
        M: ApiMock + 'static,
    {
        self.store_mock(Box::new(mock))
    }

    pub fn remove_mock(&mut self, name: &str) -> bool {
        self.mocks.unregister(name)
    }

    fn store_mock(&mut self, mut mock: Box<dyn ApiMock>) -> Result<()> {
        self.mocks.check_insertable(mock.name())?;
        mock.build()?;
        self.mocks.register(Arc::from(mock))
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("operational", &self.operational)
            .field("enabled", &self.enabled)
            .field("config", &self.config)
            .field("request_type", &self.request_type)
            .field("mocks", &self.mocks)
            .field("normalizers", &self.normalizers)
            .finish()
    }
}
