use serde_json::Value;
use std::sync::RwLock;
use tracing::debug;

use crate::plugins::ConstructorCatalog;
use crate::types::{ApiParams, ApiRequest, CallParams, HttpApiRequest};
use crate::{Error, Result};

/// Type key of the built-in [`HttpApiRequest`].
pub const HTTP_REQUEST_TYPE: &str = "http";

pub type RequestCatalog = ConstructorCatalog<Box<dyn ApiRequest>>;

/// Catalog pre-loaded with the built-in request types.
pub fn default_request_catalog() -> RequestCatalog {
    ConstructorCatalog::new("request").with_builtin(HTTP_REQUEST_TYPE, |args: &Value| {
        Ok(Box::new(HttpApiRequest::from_args(args)?) as Box<dyn ApiRequest>)
    })
}

/// Builds requests from constructor catalogs.
///
/// Failures never escape: `create` and `instantiate` return `None` and the
/// cause is kept for [`RequestFactory::last_error`].
#[derive(Debug)]
pub struct RequestFactory {
    api_params: ApiParams,
    catalog: RequestCatalog,
    last_error: RwLock<String>,
}

impl RequestFactory {
    pub fn new(api_params: ApiParams, catalog: RequestCatalog) -> Self {
        Self {
            api_params,
            catalog,
            last_error: RwLock::new(String::new()),
        }
    }

    /// Instantiate `type_key`, fill it from `params` (method uppercased),
    /// then run `setup` and `build`.
    pub fn create(
        &self,
        type_key: &str,
        args: &Value,
        params: CallParams,
    ) -> Option<Box<dyn ApiRequest>> {
        self.capture(self.try_create(type_key, args, Some(params)))
    }

    /// Instantiate a pre-configured request type and run `setup` and `build`
    /// only.
    pub fn instantiate(&self, type_key: &str, args: &Value) -> Option<Box<dyn ApiRequest>> {
        self.capture(self.try_create(type_key, args, None))
    }

    /// Cause of the most recent failed `create`/`instantiate`; empty after a
    /// success.
    pub fn last_error(&self) -> String {
        self.last_error
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn api_params(&self) -> &ApiParams {
        &self.api_params
    }

    pub fn catalog(&self) -> &RequestCatalog {
        &self.catalog
    }

    fn try_create(
        &self,
        type_key: &str,
        args: &Value,
        params: Option<CallParams>,
    ) -> Result<Box<dyn ApiRequest>> {
        if type_key.is_empty() {
            return Err(Error::build("Request type is empty"));
        }

        let mut request = self.catalog.instantiate(type_key, args)?;
        if let Some(mut params) = params {
            params.method = params.method.to_ascii_uppercase();
            *request.params_mut() = params;
        }
        request.setup(&self.api_params)?;
        request.build()?;
        Ok(request)
    }

    fn capture(&self, result: Result<Box<dyn ApiRequest>>) -> Option<Box<dyn ApiRequest>> {
        let mut last_error = self.last_error.write().unwrap_or_else(|e| e.into_inner());
        match result {
            Ok(request) => {
                last_error.clear();
                Some(request)
            }
            Err(err) => {
                debug!(error = %err, "request construction failed");
                *last_error = err.to_string();
                None
            }
        }
    }
}
