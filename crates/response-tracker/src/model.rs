//! Entries retained in the tracker's logs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded HTTP response relevant to the tracked API host.
///
/// Entries are never mutated after insertion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub url: String,
    pub method: String,
    pub status: u16,
    pub timestamp: DateTime<Utc>,
    /// Header names and values exactly as received.
    pub headers: HashMap<String, String>,
    /// Derived: status in [200, 299].
    pub is_ok: bool,
    pub status_text: String,
    /// Parsed JSON payload, present only when body capture is on, the
    /// content type indicates JSON, and parsing succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Set when JSON parsing failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_error: Option<String>,
    /// Raw text preserved for diagnostics when JSON parsing failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
}

impl ResponseEntry {
    /// Case-insensitive header lookup over names stored as received.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// One recorded network-level request failure relevant to the tracked
/// API host.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailureEntry {
    pub url: String,
    pub method: String,
    /// Failure reason as reported by the runtime.
    pub failure: String,
    pub timestamp: DateTime<Utc>,
}

/// Internal error recovered while processing an event; diagnostic only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObservationError {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let entry = ResponseEntry {
            url: "https://fakestoreapi.com/products".to_string(),
            method: "GET".to_string(),
            status: 200,
            timestamp: Utc::now(),
            headers,
            is_ok: true,
            status_text: "OK".to_string(),
            body: None,
            body_error: None,
            body_text: None,
        };
        assert_eq!(entry.header("content-type"), Some("application/json"));
        assert_eq!(entry.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(entry.header("etag"), None);
    }
}
