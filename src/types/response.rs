use serde_json::Value;

use super::payload::Payload;

/// Status reported for internal and transport failures.
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Normalized outcome of a call. Always produced, never a fault.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub reason_phrase: String,
    /// Failure description; usually empty on success.
    pub message: String,
    pub content: Option<Payload>,
    /// Copied verbatim from the originating request.
    pub custom_data: Option<Value>,
}

impl ApiResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            reason_phrase: String::new(),
            message: String::new(),
            content: None,
            custom_data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_internal_error(&self) -> bool {
        self.status_code == STATUS_INTERNAL_ERROR
    }

    /// Content parsed as JSON, if any and if it parses.
    pub fn json(&self) -> Option<Value> {
        self.content.as_ref().and_then(|c| c.to_json().ok())
    }

    /// Content as text (lossy for raw bytes).
    pub fn text(&self) -> Option<String> {
        self.content.as_ref().map(|c| c.as_text().into_owned())
    }
}

impl Default for ApiResponse {
    fn default() -> Self {
        Self::new(STATUS_INTERNAL_ERROR)
    }
}
