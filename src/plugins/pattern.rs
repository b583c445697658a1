use regex::Regex;
use std::fmt;

use crate::error::ErrorContext;
use crate::{Error, Result};

/// Regex predicate over endpoints.
#[derive(Clone)]
pub struct EndpointPattern(Regex);

impl EndpointPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern).map(Self).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid endpoint pattern: {}", e),
                ErrorContext::new()
                    .with_field_path("pattern")
                    .with_details(pattern.to_string()),
            )
        })
    }

    pub fn is_match(&self, endpoint: &str) -> bool {
        self.0.is_match(endpoint)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for EndpointPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EndpointPattern").field(&self.as_str()).finish()
    }
}
