use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::Proxy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::options::{OptionKey, TransportOptions};
use super::{Transport, TransportError, TransportResult};
use crate::types::{ApiRequest, Payload};

fn default_true() -> bool {
    true
}

/// Outbound proxy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
    /// `user:password`
    #[serde(default)]
    pub credentials: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ProxyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credentials: None,
            enabled: true,
        }
    }

    pub fn with_credentials(mut self, credentials: impl Into<String>) -> Self {
        self.credentials = Some(credentials.into());
        self
    }
}

/// Client-level transport defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    #[serde(default)]
    pub default_options: TransportOptions,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
}

impl HttpTransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridable from the environment:
    /// - `API_UNIT_HTTP_TIMEOUT_SECS`
    /// - `API_UNIT_PROXY_URL`, `API_UNIT_PROXY_USERPWD`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = env::var("API_UNIT_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config
                .default_options
                .set(OptionKey::TimeoutMs, secs.saturating_mul(1000));
        }

        if let Ok(url) = env::var("API_UNIT_PROXY_URL") {
            if !url.trim().is_empty() {
                let mut proxy = ProxyConfig::new(url);
                proxy.credentials = env::var("API_UNIT_PROXY_USERPWD").ok();
                config.proxy = Some(proxy);
            }
        }

        config
    }

    pub fn with_default_options(mut self, options: TransportOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }
}

/// How the outbound call treats its method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSemantics {
    Get,
    Post,
    /// Method string passed through verbatim.
    Custom,
}

/// A request reduced to plain data, ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall {
    pub url: String,
    pub method: String,
    pub semantics: MethodSemantics,
    /// One `key:value` line per header.
    pub headers: Vec<String>,
    pub body: Option<Bytes>,
    /// Proxy settings overlaid with the merged client/request options.
    pub options: TransportOptions,
}

/// Blocking HTTP executor.
///
/// Each execution acquires its own client handle and drops it before
/// returning, so nothing is pooled across calls.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    config: HttpTransportConfig,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(HttpTransportConfig::from_env())
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Reduce a request to a [`PreparedCall`] without touching the network.
    pub fn prepare(&self, request: &dyn ApiRequest) -> PreparedCall {
        let merged = match request.options() {
            Some(overrides) => self.config.default_options.merged(overrides),
            None => self.config.default_options.clone(),
        };

        let params = request.params();
        let method = params.method.to_ascii_uppercase();
        let mut call = PreparedCall {
            url: request.uri().into_owned(),
            method: method.clone(),
            semantics: MethodSemantics::Custom,
            headers: format_headers(&params.headers),
            body: None,
            options: TransportOptions::new(),
        };

        match method.as_str() {
            "GET" => call.semantics = MethodSemantics::Get,
            "POST" => {
                call.semantics = MethodSemantics::Post;
                call.method = "POST".to_string();
                call.body = params.body.as_ref().map(Payload::to_bytes);
            }
            "PUT" => call.body = params.body.as_ref().map(Payload::to_bytes),
            _ => {}
        }

        // Proxy first: a generic option targeting the same key still wins.
        let mut effective = TransportOptions::new();
        if let Some(proxy) = self.config.proxy.as_ref().filter(|p| p.enabled) {
            effective.set(OptionKey::Proxy, proxy.url.clone());
            if let Some(credentials) = &proxy.credentials {
                effective.set(OptionKey::ProxyCredentials, credentials.clone());
            }
        }
        call.options = effective.merged(&merged);

        call
    }

    fn send(&self, call: &PreparedCall) -> Result<(u16, Bytes), TransportError> {
        let client = build_client(&call.options)?;

        let method = match call.semantics {
            MethodSemantics::Get => reqwest::Method::GET,
            MethodSemantics::Post => reqwest::Method::POST,
            MethodSemantics::Custom => reqwest::Method::from_bytes(call.method.as_bytes())
                .map_err(|_| TransportError::InvalidMethod(call.method.clone()))?,
        };

        let mut builder = client.request(method, call.url.as_str());
        for line in &call.headers {
            let (name, value) = parse_header_line(line)?;
            builder = builder.header(name, value);
        }
        if let Some(body) = &call.body {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?;
        Ok((status, body))
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &dyn ApiRequest) -> TransportResult {
        let call = self.prepare(request);

        let verbose = call
            .options
            .get(OptionKey::Verbose)
            .and_then(|v| v.expect_bool(OptionKey::Verbose).ok())
            .unwrap_or(false);
        if verbose {
            debug!(?call, "prepared http call");
        }

        let start = Instant::now();
        match self.send(&call) {
            Ok((status, body)) => {
                info!(
                    http_status = status,
                    method = call.method.as_str(),
                    url = call.url.as_str(),
                    bytes = body.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "http call completed"
                );
                TransportResult::success(status, Some(Payload::Bytes(body)))
            }
            Err(err) => {
                warn!(
                    error = %err,
                    method = call.method.as_str(),
                    url = call.url.as_str(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "http call failed"
                );
                TransportResult::from_error(&err)
            }
        }
    }
}

/// Render headers as `key:value` lines.
pub fn format_headers(headers: &BTreeMap<String, String>) -> Vec<String> {
    headers.iter().map(|(k, v)| format!("{}:{}", k, v)).collect()
}

fn parse_header_line(line: &str) -> Result<(HeaderName, HeaderValue), TransportError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| TransportError::InvalidHeader(line.to_string()))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|_| TransportError::InvalidHeader(line.to_string()))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|_| TransportError::InvalidHeader(line.to_string()))?;
    Ok((name, value))
}

fn build_client(options: &TransportOptions) -> Result<reqwest::blocking::Client, TransportError> {
    let mut builder = reqwest::blocking::Client::builder();
    let mut follow_redirects = None;
    let mut max_redirects = None;
    let mut proxy_url = None;
    let mut proxy_credentials = None;

    for (key, value) in options.iter() {
        let key = *key;
        match key {
            OptionKey::TimeoutMs => {
                builder = builder.timeout(Duration::from_millis(value.expect_u64(key)?));
            }
            OptionKey::ConnectTimeoutMs => {
                builder = builder.connect_timeout(Duration::from_millis(value.expect_u64(key)?));
            }
            OptionKey::FollowRedirects => follow_redirects = Some(value.expect_bool(key)?),
            OptionKey::MaxRedirects => max_redirects = Some(value.expect_u64(key)?),
            OptionKey::Proxy => proxy_url = Some(value.expect_str(key)?.to_string()),
            OptionKey::ProxyCredentials => {
                proxy_credentials = Some(value.expect_str(key)?.to_string())
            }
            OptionKey::UserAgent => builder = builder.user_agent(value.expect_str(key)?.to_string()),
            OptionKey::AcceptInvalidCerts => {
                builder = builder.danger_accept_invalid_certs(value.expect_bool(key)?);
            }
            OptionKey::Verbose => {
                value.expect_bool(key)?;
            }
        }
    }

    if follow_redirects == Some(false) {
        builder = builder.redirect(Policy::none());
    } else if let Some(max) = max_redirects {
        builder = builder.redirect(Policy::limited(max as usize));
    }

    if let Some(url) = proxy_url {
        let mut proxy = Proxy::all(url.as_str())?;
        if let Some(credentials) = proxy_credentials {
            let (user, password) = credentials
                .split_once(':')
                .unwrap_or((credentials.as_str(), ""));
            proxy = proxy.basic_auth(user, password);
        }
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}
