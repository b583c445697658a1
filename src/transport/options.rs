//! Transport option bags and their merge rule.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::TransportError;

/// Known transport options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKey {
    TimeoutMs,
    ConnectTimeoutMs,
    FollowRedirects,
    MaxRedirects,
    Proxy,
    /// `user:password` for the proxy.
    ProxyCredentials,
    UserAgent,
    AcceptInvalidCerts,
    /// Log the fully prepared call before sending it.
    Verbose,
}

impl OptionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::TimeoutMs => "timeout_ms",
            OptionKey::ConnectTimeoutMs => "connect_timeout_ms",
            OptionKey::FollowRedirects => "follow_redirects",
            OptionKey::MaxRedirects => "max_redirects",
            OptionKey::Proxy => "proxy",
            OptionKey::ProxyCredentials => "proxy_credentials",
            OptionKey::UserAgent => "user_agent",
            OptionKey::AcceptInvalidCerts => "accept_invalid_certs",
            OptionKey::Verbose => "verbose",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(u64),
    Text(String),
}

impl OptionValue {
    pub(crate) fn expect_bool(&self, key: OptionKey) -> Result<bool, TransportError> {
        match self {
            OptionValue::Bool(b) => Ok(*b),
            OptionValue::Int(n) => Ok(*n != 0),
            OptionValue::Text(_) => Err(invalid(key, "a boolean")),
        }
    }

    pub(crate) fn expect_u64(&self, key: OptionKey) -> Result<u64, TransportError> {
        match self {
            OptionValue::Int(n) => Ok(*n),
            _ => Err(invalid(key, "an integer")),
        }
    }

    pub(crate) fn expect_str(&self, key: OptionKey) -> Result<&str, TransportError> {
        match self {
            OptionValue::Text(s) => Ok(s.as_str()),
            _ => Err(invalid(key, "a string")),
        }
    }
}

fn invalid(key: OptionKey, expected: &str) -> TransportError {
    TransportError::InvalidOption(format!("option \"{}\" expects {}", key.as_str(), expected))
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<u64> for OptionValue {
    fn from(n: u64) -> Self {
        OptionValue::Int(n)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

/// Ordered option bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportOptions(BTreeMap<OptionKey, OptionValue>);

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: OptionKey, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: OptionKey, value: impl Into<OptionValue>) {
        self.0.insert(key, value.into());
    }

    pub fn get(&self, key: OptionKey) -> Option<&OptionValue> {
        self.0.get(&key)
    }

    pub fn remove(&mut self, key: OptionKey) -> Option<OptionValue> {
        self.0.remove(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OptionKey, &OptionValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check every value has the kind its key expects.
    pub fn validate(&self) -> Result<(), TransportError> {
        for (key, value) in self.iter() {
            let key = *key;
            match key {
                OptionKey::TimeoutMs | OptionKey::ConnectTimeoutMs | OptionKey::MaxRedirects => {
                    value.expect_u64(key)?;
                }
                OptionKey::FollowRedirects | OptionKey::AcceptInvalidCerts | OptionKey::Verbose => {
                    value.expect_bool(key)?;
                }
                OptionKey::Proxy | OptionKey::ProxyCredentials | OptionKey::UserAgent => {
                    value.expect_str(key)?;
                }
            }
        }
        Ok(())
    }

    /// Overlay `overrides` on top of `self`; on a key collision `overrides` wins.
    pub fn merged(&self, overrides: &TransportOptions) -> TransportOptions {
        let mut out = self.clone();
        for (k, v) in overrides.iter() {
            out.0.insert(*k, v.clone());
        }
        out
    }
}
