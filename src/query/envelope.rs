//! Response envelope for the query interface

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Headers attached to every query response.
pub const RESPONSE_HEADERS: [(&str, &str); 4] = [
    ("Content-Type", "application/json"),
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type, Authorization"),
];

/// Status, headers and JSON body of a query response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub headers: BTreeMap<&'static str, &'static str>,
    pub body: Value,
}

impl ResponseEnvelope {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            headers: RESPONSE_HEADERS.into_iter().collect(),
            body,
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    /// A 5xx envelope carrying `{"error": message}`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(500, serde_json::json!({ "error": message.into() }))
    }

    /// The `error` field of the body, if any.
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&'static str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_envelope() {
        let envelope = ResponseEnvelope::failure("store unavailable");
        assert_eq!(envelope.status_code, 500);
        assert_eq!(envelope.error(), Some("store unavailable"));
        assert_eq!(envelope.header("access-control-allow-origin"), Some("*"));
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(ResponseEnvelope::ok(json!({"status": "healthy"}))).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["body"]["status"], "healthy");
        assert_eq!(value["headers"]["Content-Type"], "application/json");
    }
}
