//! Response normalizers: transforms applied to successful responses.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;

use super::pattern::EndpointPattern;
use super::registry::RegistryEntry;
use crate::types::{ApiResponse, Payload};
use crate::Result;

pub trait ResponseNormalizer: Send + Sync {
    /// Registry key.
    fn rule(&self) -> &str;
    fn matches(&self, endpoint: &str) -> bool;
    fn normalize(&self, response: ApiResponse) -> ApiResponse;
}

impl RegistryEntry for dyn ResponseNormalizer {
    const KIND: &'static str = "normalizer";
    const KEY_FIELD: &'static str = "rule";

    fn registry_key(&self) -> &str {
        self.rule()
    }

    fn matches_endpoint(&self, endpoint: &str) -> bool {
        self.matches(endpoint)
    }
}

#[derive(Debug, Deserialize)]
struct PatternArgs {
    rule: String,
    pattern: String,
}

/// Decodes raw or textual content into `Payload::Json`.
///
/// Constructor args (type key `"json"`): `{ "rule", "pattern" }`. Content
/// that does not parse is left as it was.
#[derive(Debug, Clone)]
pub struct JsonContentNormalizer {
    rule: String,
    pattern: EndpointPattern,
}

impl JsonContentNormalizer {
    pub fn new(rule: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Self {
            rule: rule.into(),
            pattern: EndpointPattern::new(pattern)?,
        })
    }

    pub fn from_args(args: &Value) -> Result<Self> {
        let parsed: PatternArgs = serde_json::from_value(args.clone())?;
        Self::new(parsed.rule, &parsed.pattern)
    }
}

impl ResponseNormalizer for JsonContentNormalizer {
    fn rule(&self) -> &str {
        &self.rule
    }

    fn matches(&self, endpoint: &str) -> bool {
        self.pattern.is_match(endpoint)
    }

    fn normalize(&self, mut response: ApiResponse) -> ApiResponse {
        let parsed = match &response.content {
            Some(content) if !content.is_json() && !content.is_empty() => content.to_json(),
            _ => return response,
        };
        match parsed {
            Ok(value) => response.content = Some(Payload::Json(value)),
            Err(e) => debug!(rule = self.rule.as_str(), error = %e, "content left undecoded"),
        }
        response
    }
}

/// Normalizer backed by a closure.
pub struct FnNormalizer<F> {
    rule: String,
    pattern: EndpointPattern,
    func: F,
}

impl<F> FnNormalizer<F>
where
    F: Fn(ApiResponse) -> ApiResponse + Send + Sync,
{
    pub fn new(rule: impl Into<String>, pattern: &str, func: F) -> Result<Self> {
        Ok(Self {
            rule: rule.into(),
            pattern: EndpointPattern::new(pattern)?,
            func,
        })
    }
}

impl<F> ResponseNormalizer for FnNormalizer<F>
where
    F: Fn(ApiResponse) -> ApiResponse + Send + Sync,
{
    fn rule(&self) -> &str {
        &self.rule
    }

    fn matches(&self, endpoint: &str) -> bool {
        self.pattern.is_match(endpoint)
    }

    fn normalize(&self, response: ApiResponse) -> ApiResponse {
        (self.func)(response)
    }
}

impl<F> fmt::Debug for FnNormalizer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnNormalizer")
            .field("rule", &self.rule)
            .field("pattern", &self.pattern)
            .finish()
    }
}
