use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Result;

fn default_true() -> bool {
    true
}

/// Client behavior switches, applied when the client is initialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_true")]
    pub enable_listeners: bool,
    #[serde(default)]
    pub enable_events: bool,
    #[serde(default)]
    pub enable_mocks: bool,
    #[serde(default)]
    pub debug_mode: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            enable_listeners: true,
            enable_events: false,
            enable_mocks: false,
            debug_mode: false,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listeners(mut self, enable: bool) -> Self {
        self.enable_listeners = enable;
        self
    }

    pub fn with_events(mut self, enable: bool) -> Self {
        self.enable_events = enable;
        self
    }

    pub fn with_mocks(mut self, enable: bool) -> Self {
        self.enable_mocks = enable;
        self
    }

    pub fn with_debug(mut self, enable: bool) -> Self {
        self.debug_mode = enable;
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read failures surface as [`Error::Io`](crate::Error::Io), bad content as
    /// a YAML error.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Overlay switches set in the environment:
    /// - `API_UNIT_ENABLE_LISTENERS`
    /// - `API_UNIT_ENABLE_EVENTS`
    /// - `API_UNIT_ENABLE_MOCKS`
    /// - `API_UNIT_DEBUG`
    ///
    /// `1`/`true` enable, `0`/`false` disable; anything else is ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).and_then(|v| parse_flag(&v));
        if let Some(v) = flag("API_UNIT_ENABLE_LISTENERS") {
            self.enable_listeners = v;
        }
        if let Some(v) = flag("API_UNIT_ENABLE_EVENTS") {
            self.enable_events = v;
        }
        if let Some(v) = flag("API_UNIT_ENABLE_MOCKS") {
            self.enable_mocks = v;
        }
        if let Some(v) = flag("API_UNIT_DEBUG") {
            self.debug_mode = v;
        }
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
