//! Request types: the logical call description and the request trait the
//! pipeline dispatches.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use super::payload::Payload;
use crate::error::ErrorContext;
use crate::transport::TransportOptions;
use crate::{Error, Result};

/// Global API parameters handed to every request's `setup` hook.
pub type ApiParams = serde_json::Map<String, Value>;

static ABSOLUTE_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("static regex is valid")
});

/// Logical description of an outbound call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallParams {
    pub method: String,
    pub endpoint: String,
    /// Query parameters, kept in insertion order.
    pub query: Vec<(String, String)>,
    pub body: Option<Payload>,
    pub headers: BTreeMap<String, String>,
    pub is_async: bool,
    /// Stored and echoed only; no transport consumes it.
    pub secured: bool,
    /// Opaque caller data, copied onto the resulting response.
    pub custom_data: Option<Value>,
}

impl CallParams {
    pub fn new(method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Payload>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    pub fn with_secured(mut self, secured: bool) -> Self {
        self.secured = secured;
        self
    }

    pub fn with_custom_data(mut self, data: Value) -> Self {
        self.custom_data = Some(data);
        self
    }
}

/// Optional per-item hooks fired by the pipeline when listeners are enabled.
///
/// A request opts in by returning itself from [`ApiRequest::listener`].
pub trait HttpItemListener {
    fn on_pre_execute(&mut self) {}
    fn on_post_execute(&mut self) {}
}

/// A request the client can dispatch.
///
/// Implementations are produced by constructors registered on the request
/// factory. The factory fills [`CallParams`], then calls `setup` and `build`
/// in that order.
pub trait ApiRequest: Send + fmt::Debug {
    fn params(&self) -> &CallParams;
    fn params_mut(&mut self) -> &mut CallParams;

    /// Receive the client's global API parameters.
    fn setup(&mut self, _api_params: &ApiParams) -> Result<()> {
        Ok(())
    }

    /// Transport-specific materialization (URI assembly and the like).
    fn build(&mut self) -> Result<()> {
        Ok(())
    }

    /// Target URI handed to the transport.
    fn uri(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.params().endpoint.as_str())
    }

    /// Per-request transport option overrides.
    fn options(&self) -> Option<&TransportOptions> {
        None
    }

    /// Listener capability; `None` means listener triggers are no-ops.
    fn listener(&mut self) -> Option<&mut dyn HttpItemListener> {
        None
    }

    fn method(&self) -> &str {
        &self.params().method
    }

    fn endpoint(&self) -> &str {
        &self.params().endpoint
    }

    fn is_async(&self) -> bool {
        self.params().is_async
    }

    fn custom_data(&self) -> Option<&Value> {
        self.params().custom_data.as_ref()
    }
}

#[derive(Debug, Default, Deserialize)]
struct HttpRequestArgs {
    #[serde(default)]
    options: TransportOptions,
    #[serde(default)]
    base_url: Option<String>,
}

/// Default request type for [`crate::transport::HttpTransport`].
///
/// Constructor args: `{ "options": { .. }, "base_url": ".." }`, both optional.
/// Without an explicit `base_url` the `base_url` API parameter is used.
#[derive(Debug, Clone, Default)]
pub struct HttpApiRequest {
    params: CallParams,
    base_url: Option<String>,
    options: TransportOptions,
    uri: String,
}

impl HttpApiRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn from_args(args: &Value) -> Result<Self> {
        let parsed: HttpRequestArgs = if args.is_null() {
            HttpRequestArgs::default()
        } else {
            serde_json::from_value(args.clone())?
        };
        Ok(Self {
            options: parsed.options,
            base_url: parsed.base_url,
            ..Default::default()
        })
    }

    fn compose_uri(&self) -> Result<String> {
        let endpoint = self.params.endpoint.as_str();
        let raw = if ABSOLUTE_URI.is_match(endpoint) {
            endpoint.to_string()
        } else if let Some(base) = &self.base_url {
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            )
        } else {
            return Err(Error::build_with_context(
                format!("relative endpoint \"{}\" without a base URL", endpoint),
                ErrorContext::new()
                    .with_field_path("api_params.base_url")
                    .with_source("http_request"),
            ));
        };

        let mut url = Url::parse(&raw).map_err(|e| {
            Error::build_with_context(
                format!("invalid request URI: {}", e),
                ErrorContext::new()
                    .with_field_path("request.uri")
                    .with_details(raw.clone())
                    .with_source("http_request"),
            )
        })?;

        if !self.params.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &self.params.query {
                pairs.append_pair(k, v);
            }
        }

        Ok(url.to_string())
    }
}

impl ApiRequest for HttpApiRequest {
    fn params(&self) -> &CallParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut CallParams {
        &mut self.params
    }

    fn setup(&mut self, api_params: &ApiParams) -> Result<()> {
        if self.base_url.is_none() {
            self.base_url = api_params
                .get("base_url")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        Ok(())
    }

    fn build(&mut self) -> Result<()> {
        self.uri = self.compose_uri()?;
        Ok(())
    }

    fn uri(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.uri.as_str())
    }

    fn options(&self) -> Option<&TransportOptions> {
        Some(&self.options)
    }
}
