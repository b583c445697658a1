use serde_json::Value;
use std::sync::Arc;

use super::config::ClientConfig;
use super::core::{ApiClient, MockCatalog, NormalizerCatalog};
use crate::error::ErrorContext;
use crate::factory::{
    default_decorator_catalog, default_request_catalog, DecoratorCatalog, EventFactory,
    RequestCatalog, RequestFactory, ResponseDecorator, ResponseFactory, HTTP_REQUEST_TYPE,
};
use crate::plugins::{
    noop_hooks, ApiMock, ClientHooks, ConstructorCatalog, JsonContentNormalizer, MockRegistry,
    NormalizerRegistry, ResponseNormalizer, StaticMock,
};
use crate::telemetry::{ApiLogger, EventHandler};
use crate::transport::{HttpTransport, HttpTransportConfig, Transport};
use crate::types::{ApiParams, ApiRequest};
use crate::{Error, Result};

/// Type key of the built-in [`StaticMock`].
pub const STATIC_MOCK_TYPE: &str = "static";
/// Type key of the built-in [`JsonContentNormalizer`].
pub const JSON_NORMALIZER_TYPE: &str = "json";

fn default_mock_catalog() -> MockCatalog {
    ConstructorCatalog::new("mock").with_builtin(STATIC_MOCK_TYPE, |args: &Value| {
        Ok(Box::new(StaticMock::from_args(args)?) as Box<dyn ApiMock>)
    })
}

fn default_normalizer_catalog() -> NormalizerCatalog {
    ConstructorCatalog::new("normalizer").with_builtin(JSON_NORMALIZER_TYPE, |args: &Value| {
        Ok(Box::new(JsonContentNormalizer::from_args(args)?) as Box<dyn ResponseNormalizer>)
    })
}

/// Builder for [`ApiClient`].
///
/// The built client is not operational until
/// [`ApiClient::initialize`] is called.
pub struct ApiClientBuilder {
    api_params: ApiParams,
    config: ClientConfig,
    transport: Option<Box<dyn Transport>>,
    transport_config: Option<HttpTransportConfig>,
    hooks: Arc<dyn ClientHooks>,
    event_handler: Option<Arc<dyn EventHandler>>,
    logger: Option<Arc<dyn ApiLogger>>,
    request_types: RequestCatalog,
    request_type: String,
    request_args: Value,
    mock_types: MockCatalog,
    normalizer_types: NormalizerCatalog,
    decorator_types: DecoratorCatalog,
    response_decorator: Option<(String, Value)>,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self {
            api_params: ApiParams::new(),
            config: ClientConfig::default(),
            transport: None,
            transport_config: None,
            hooks: noop_hooks(),
            event_handler: None,
            logger: None,
            request_types: default_request_catalog(),
            request_type: HTTP_REQUEST_TYPE.to_string(),
            request_args: Value::Null,
            mock_types: default_mock_catalog(),
            normalizer_types: default_normalizer_catalog(),
            decorator_types: default_decorator_catalog(),
            response_decorator: None,
        }
    }

    /// Replace the global API parameters handed to every request's `setup`.
    pub fn api_params(mut self, params: ApiParams) -> Self {
        self.api_params = params;
        self
    }

    pub fn api_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.api_params.insert(key.into(), value.into());
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom transport. Takes precedence over `transport_config`.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Configure the default HTTP transport.
    ///
    /// Without it the transport reads `API_UNIT_*` environment variables.
    pub fn transport_config(mut self, config: HttpTransportConfig) -> Self {
        self.transport_config = Some(config);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ClientHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn ApiLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Register an additional request type.
    pub fn request_type<F>(mut self, key: impl Into<String>, constructor: F) -> Result<Self>
    where
        F: Fn(&Value) -> Result<Box<dyn ApiRequest>> + Send + Sync + 'static,
    {
        self.request_types.register(key, constructor)?;
        Ok(self)
    }

    /// Request type used by [`ApiClient::request`]. Defaults to `"http"`.
    pub fn default_request_type(mut self, key: impl Into<String>) -> Self {
        self.request_type = key.into();
        self
    }

    /// Constructor arguments for the default request type.
    pub fn request_args(mut self, args: Value) -> Self {
        self.request_args = args;
        self
    }

    pub fn mock_type<F>(mut self, key: impl Into<String>, constructor: F) -> Result<Self>
    where
        F: Fn(&Value) -> Result<Box<dyn ApiMock>> + Send + Sync + 'static,
    {
        self.mock_types.register(key, constructor)?;
        Ok(self)
    }

    pub fn normalizer_type<F>(mut self, key: impl Into<String>, constructor: F) -> Result<Self>
    where
        F: Fn(&Value) -> Result<Box<dyn ResponseNormalizer>> + Send + Sync + 'static,
    {
        self.normalizer_types.register(key, constructor)?;
        Ok(self)
    }

    pub fn decorator_type<F>(mut self, key: impl Into<String>, constructor: F) -> Result<Self>
    where
        F: Fn(&Value) -> Result<Arc<dyn ResponseDecorator>> + Send + Sync + 'static,
    {
        self.decorator_types.register(key, constructor)?;
        Ok(self)
    }

    /// Decorate every response with the decorator registered under `key`.
    /// Resolved by [`ApiClient::initialize`].
    pub fn response_decorator(mut self, key: impl Into<String>, args: Value) -> Self {
        self.response_decorator = Some((key.into(), args));
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        if !self.request_types.contains(&self.request_type) {
            return Err(Error::configuration_with_context(
                format!("unknown request type \"{}\"", self.request_type),
                ErrorContext::new()
                    .with_field_path("request_type")
                    .with_details(format!("known: {:?}", self.request_types.keys())),
            ));
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let config = self
                    .transport_config
                    .unwrap_or_else(HttpTransportConfig::from_env);
                config.default_options.validate()?;
                Box::new(HttpTransport::new(config))
            }
        };

        Ok(ApiClient {
            request_factory: RequestFactory::new(self.api_params.clone(), self.request_types),
            api_params: self.api_params,
            pending_config: self.config.clone(),
            config: self.config,
            transport,
            hooks: self.hooks,
            event_handler: self.event_handler,
            logger: self.logger,
            response_factory: ResponseFactory::default(),
            event_factory: EventFactory::new(),
            request_type: self.request_type,
            request_args: self.request_args,
            response_decorator: self.response_decorator,
            decorator_types: self.decorator_types,
            mock_types: self.mock_types,
            normalizer_types: self.normalizer_types,
            mocks: MockRegistry::new(),
            normalizers: NormalizerRegistry::new(),
            operational: false,
            enabled: true,
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{OptionKey, TransportError, TransportOptions};
    use serde_json::json;

    #[test]
    fn unknown_default_request_type_is_rejected() {
        let err = ApiClientBuilder::new()
            .default_request_type("soap")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn duplicate_request_type_is_rejected() {
        let err = ApiClientBuilder::new()
            .request_type(HTTP_REQUEST_TYPE, |_: &Value| {
                Ok(Box::new(crate::types::HttpApiRequest::new()) as Box<dyn ApiRequest>)
            })
            .err()
            .unwrap();
        assert!(matches!(err, Error::DuplicateKey { .. }));
    }

    #[test]
    fn mistyped_default_transport_option_fails_the_build() {
        let config = HttpTransportConfig::new()
            .with_default_options(TransportOptions::new().with(OptionKey::TimeoutMs, "soon"));
        let err = ApiClientBuilder::new()
            .transport_config(config)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::InvalidOption(_))));
    }

    #[test]
    fn built_client_starts_uninitialized_and_enabled() {
        let client = ApiClientBuilder::new()
            .api_param("base_url", "https://api.example.com")
            .transport_config(HttpTransportConfig::new())
            .build()
            .unwrap();
        assert!(!client.is_operational());
        assert!(client.is_enabled());
        assert_eq!(
            client.api_params().get("base_url"),
            Some(&json!("https://api.example.com"))
        );
    }

    #[test]
    fn unknown_decorator_fails_initialize() {
        let mut client = ApiClientBuilder::new()
            .transport_config(HttpTransportConfig::new())
            .response_decorator("missing", Value::Null)
            .build()
            .unwrap();
        assert!(client.initialize().is_err());
        assert!(!client.is_operational());
    }
}
