//! Opaque call payloads.

use bytes::Bytes;
use serde_json::Value;
use std::borrow::Cow;

/// Request body or response content.
///
/// The pipeline never looks inside a payload; the transport turns it into
/// bytes and normalizers are free to reinterpret it.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw bytes, as received from the wire.
    Bytes(Bytes),
    Text(String),
    Json(Value),
}

impl Payload {
    /// Encode the payload for the wire. JSON values are serialized compactly.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Payload::Bytes(b) => b.clone(),
            Payload::Text(s) => Bytes::from(s.clone()),
            Payload::Json(v) => Bytes::from(v.to_string()),
        }
    }

    /// Text view of the payload. Raw bytes are decoded lossily.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Payload::Bytes(b) => String::from_utf8_lossy(b),
            Payload::Text(s) => Cow::Borrowed(s.as_str()),
            Payload::Json(v) => Cow::Owned(v.to_string()),
        }
    }

    /// Parse the payload as JSON (a no-op clone for `Payload::Json`).
    pub fn to_json(&self) -> crate::Result<Value> {
        match self {
            Payload::Json(v) => Ok(v.clone()),
            Payload::Bytes(b) => Ok(serde_json::from_slice(b)?),
            Payload::Text(s) => Ok(serde_json::from_str(s)?),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Payload::Json(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Bytes(b) => b.len(),
            Payload::Text(s) => s.len(),
            Payload::Json(v) => v.to_string().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a payload from a configuration value: strings stay text, anything
    /// else is kept as JSON.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Payload::Text(s),
            other => Payload::Json(other),
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Payload::Json(v)
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Bytes(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_payload_encodes_compactly() {
        let p = Payload::Json(json!({"a": 1}));
        assert_eq!(p.to_bytes(), Bytes::from_static(br#"{"a":1}"#));
        assert_eq!(p.as_text(), r#"{"a":1}"#);
    }

    #[test]
    fn raw_bytes_parse_as_json() {
        let p = Payload::from(br#"{"ok":true}"#.to_vec());
        assert_eq!(p.to_json().unwrap(), json!({"ok": true}));
        assert!(Payload::from("not json").to_json().is_err());
    }

    #[test]
    fn from_value_keeps_strings_as_text() {
        assert_eq!(Payload::from_value(json!("hi")), Payload::Text("hi".into()));
        assert!(Payload::from_value(json!([1, 2])).is_json());
    }
}
