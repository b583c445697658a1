//! Mocks: canned results served instead of a transport call.

use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

use super::pattern::EndpointPattern;
use super::registry::RegistryEntry;
use crate::error::ErrorContext;
use crate::types::Payload;
use crate::{Error, Result};

pub trait ApiMock: Send + Sync {
    /// Registry key.
    fn name(&self) -> &str;
    fn matches(&self, endpoint: &str) -> bool;
    fn status(&self) -> u16;
    fn content(&self) -> Option<Payload>;

    /// Runs once at registration, after the key checks passed.
    fn build(&mut self) -> Result<()> {
        Ok(())
    }
}

impl RegistryEntry for dyn ApiMock {
    const KIND: &'static str = "mock";
    const KEY_FIELD: &'static str = "name";

    fn registry_key(&self) -> &str {
        self.name()
    }

    fn matches_endpoint(&self, endpoint: &str) -> bool {
        self.matches(endpoint)
    }
}

fn default_status() -> u16 {
    200
}

#[derive(Debug, Deserialize)]
struct StaticMockArgs {
    name: String,
    pattern: String,
    #[serde(default = "default_status")]
    status: u16,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    content_file: Option<PathBuf>,
}

/// Mock answering every matching endpoint with a fixed status and content.
///
/// Constructor args (type key `"static"`):
/// `{ "name", "pattern", "status"?, "content"?, "content_file"? }`.
/// `content_file` is read when the mock is registered.
#[derive(Debug, Clone)]
pub struct StaticMock {
    name: String,
    pattern: EndpointPattern,
    status: u16,
    content: Option<Payload>,
    content_file: Option<PathBuf>,
}

impl StaticMock {
    pub fn new(name: impl Into<String>, pattern: &str, status: u16) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            pattern: EndpointPattern::new(pattern)?,
            status,
            content: None,
            content_file: None,
        })
    }

    pub fn with_content(mut self, content: impl Into<Payload>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_content_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.content_file = Some(path.into());
        self
    }

    pub fn from_args(args: &Value) -> Result<Self> {
        let parsed: StaticMockArgs = serde_json::from_value(args.clone())?;
        let mut mock = Self::new(parsed.name, &parsed.pattern, parsed.status)?;
        mock.content = parsed.content.map(Payload::from_value);
        mock.content_file = parsed.content_file;
        Ok(mock)
    }
}

impl ApiMock for StaticMock {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, endpoint: &str) -> bool {
        self.pattern.is_match(endpoint)
    }

    fn status(&self) -> u16 {
        self.status
    }

    fn content(&self) -> Option<Payload> {
        self.content.clone()
    }

    fn build(&mut self) -> Result<()> {
        if let Some(path) = &self.content_file {
            let text = std::fs::read_to_string(path).map_err(|e| {
                Error::configuration_with_context(
                    format!("cannot read mock content: {}", e),
                    ErrorContext::new()
                        .with_field_path("mock.content_file")
                        .with_details(path.display().to_string())
                        .with_source(self.name.clone()),
                )
            })?;
            self.content = Some(Payload::Text(text));
        }
        Ok(())
    }
}
