//! 网关：管理多个具名客户端实例并广播协作者配置。
//!
//! Gateway: a container of named [`ApiClient`]s.
//!
//! Clients are created from a constructor catalog and keyed by the type key
//! they were created with, or by the name given to [`ApiGateway::insert`].

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::client::{ApiClient, ApiClientBuilder, ClientConfig};
use crate::error::ErrorContext;
use crate::plugins::ConstructorCatalog;
use crate::telemetry::{ApiLogger, EventHandler};
use crate::transport::HttpTransportConfig;
use crate::types::ApiParams;
use crate::{Error, Result};

/// Type key of the built-in client constructor.
pub const HTTP_CLIENT_TYPE: &str = "http";

pub type ClientCatalog = ConstructorCatalog<ApiClient>;

fn default_initialize() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
struct HttpClientArgs {
    #[serde(default)]
    api_params: ApiParams,
    #[serde(default)]
    config: ClientConfig,
    #[serde(default)]
    transport: Option<HttpTransportConfig>,
    #[serde(default = "default_initialize")]
    initialize: bool,
}

/// Catalog with the built-in `"http"` client type.
///
/// Args: `{ "api_params"?, "config"?, "transport"?, "initialize"? }`.
/// The client is initialized unless `initialize` is false.
pub fn default_client_catalog() -> ClientCatalog {
    ConstructorCatalog::new("client").with_builtin(HTTP_CLIENT_TYPE, |args: &Value| {
        let args: HttpClientArgs = if args.is_null() {
            HttpClientArgs {
                initialize: true,
                ..Default::default()
            }
        } else {
            serde_json::from_value(args.clone()).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid client arguments: {}", e),
                    ErrorContext::new().with_source(HTTP_CLIENT_TYPE),
                )
            })?
        };

        let mut builder = ApiClientBuilder::new()
            .api_params(args.api_params)
            .config(args.config);
        if let Some(transport) = args.transport {
            builder = builder.transport_config(transport);
        }
        let mut client = builder.build()?;
        if args.initialize {
            client.initialize()?;
        }
        Ok(client)
    })
}

#[derive(Debug)]
pub struct ApiGateway {
    catalog: ClientCatalog,
    clients: BTreeMap<String, ApiClient>,
    default: Option<String>,
}

impl ApiGateway {
    pub fn new() -> Self {
        Self::with_catalog(default_client_catalog())
    }

    pub fn with_catalog(catalog: ClientCatalog) -> Self {
        Self {
            catalog,
            clients: BTreeMap::new(),
            default: None,
        }
    }

    pub fn register_client_type<F>(&mut self, key: impl Into<String>, constructor: F) -> Result<()>
    where
        F: Fn(&Value) -> Result<ApiClient> + Send + Sync + 'static,
    {
        self.catalog.register(key, constructor)
    }

    /// Create a client of type `type_key` and store it under that key.
    pub fn add(&mut self, type_key: &str, args: &Value, set_default: bool) -> Result<&mut ApiClient> {
        if self.has(type_key) {
            return Err(Error::DuplicateKey {
                kind: "client",
                key: type_key.to_string(),
            });
        }
        let client = self.catalog.instantiate(type_key, args)?;
        self.insert(type_key, client, set_default)
    }

    /// Store an already built client under `name`.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        client: ApiClient,
        set_default: bool,
    ) -> Result<&mut ApiClient> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::configuration("cannot add a client with an empty name"));
        }
        if self.has(&name) {
            return Err(Error::DuplicateKey {
                kind: "client",
                key: name,
            });
        }

        debug!(client = name.as_str(), set_default, "client added to gateway");
        if set_default {
            self.default = Some(name.clone());
        }
        Ok(self.clients.entry(name).or_insert(client))
    }

    pub fn get(&self, name: &str) -> Option<&ApiClient> {
        self.clients.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ApiClient> {
        self.clients.get_mut(name)
    }

    /// Remove a client; returns whether it existed. Removing the default
    /// client leaves the gateway without one.
    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.clients.remove(name).is_some();
        if removed && self.default.as_deref() == Some(name) {
            self.default = None;
        }
        removed
    }

    pub fn has(&self, name: &str) -> bool {
        self.clients.contains_key(name)
    }

    /// Unknown names are ignored.
    pub fn set_default(&mut self, name: &str) {
        if self.has(name) {
            self.default = Some(name.to_string());
        }
    }

    pub fn default_client(&self) -> Option<&ApiClient> {
        self.default.as_deref().and_then(|name| self.clients.get(name))
    }

    pub fn default_client_mut(&mut self) -> Option<&mut ApiClient> {
        match self.default.as_deref() {
            Some(name) => self.clients.get_mut(name),
            None => None,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.clients.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Attach `logger` to the named clients, or to all of them when `names`
    /// is empty.
    pub fn set_logger(&mut self, logger: Arc<dyn ApiLogger>, names: &[&str]) {
        self.for_each_target(names, |client| client.set_logger(logger.clone()));
    }

    pub fn set_event_handler(&mut self, handler: Arc<dyn EventHandler>, names: &[&str]) {
        self.for_each_target(names, |client| client.set_event_handler(handler.clone()));
    }

    /// Takes effect at each client's next `initialize`.
    pub fn set_client_config(&mut self, config: &ClientConfig, names: &[&str]) {
        self.for_each_target(names, |client| client.set_client_config(config.clone()));
    }

    fn for_each_target(&mut self, names: &[&str], mut apply: impl FnMut(&mut ApiClient)) {
        if names.is_empty() {
            self.clients.values_mut().for_each(&mut apply);
            return;
        }
        for name in names {
            if let Some(client) = self.clients.get_mut(*name) {
                apply(client);
            }
        }
    }
}

impl Default for ApiGateway {
    fn default() -> Self {
        Self::new()
    }
}
