//! Default response settings applied by the transport layer.

use crate::rule::ResponseDefinition;
use serde::{Deserialize, Serialize};

/// A single header as an ordered name/value pair.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

/// Values filled into unset fields of a dispatched response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DefaultResponse {
    /// Status used when a response does not set one
    #[serde(default = "default_status")]
    pub status: u16,

    /// `Content-Type` added when a response does not carry one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Headers added when a response has no header of that name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderPair>,
}

fn default_status() -> u16 {
    crate::rule::DEFAULT_STATUS
}

impl Default for DefaultResponse {
    fn default() -> Self {
        Self {
            status: default_status(),
            content_type: None,
            headers: Vec::new(),
        }
    }
}

impl DefaultResponse {
    /// Copy of `response` with every unset field taken from these defaults.
    ///
    /// The registered definition itself is never modified.
    pub fn apply(&self, response: &ResponseDefinition) -> ResponseDefinition {
        let mut merged = response.clone();
        if response.explicit_status().is_none() {
            merged = merged.with_status(self.status);
        }
        if let Some(content_type) = &self.content_type {
            if !response.headers().contains_key("content-type") {
                merged = merged.with_header("Content-Type", content_type.as_str());
            }
        }
        for header in &self.headers {
            if !response.headers().contains_key(&header.name) {
                merged = merged.with_header(header.name.as_str(), header.value.as_str());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> DefaultResponse {
        DefaultResponse {
            status: 404,
            content_type: Some("application/json".to_string()),
            headers: vec![
                HeaderPair {
                    name: "X-Served-By".to_string(),
                    value: "decoy".to_string(),
                },
                HeaderPair {
                    name: "Cache-Control".to_string(),
                    value: "no-store".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_fills_unset_fields() {
        let merged = defaults().apply(&ResponseDefinition::new().with_body("{}"));
        assert_eq!(merged.explicit_status(), Some(404));
        assert_eq!(merged.headers().get("content-type"), Some("application/json"));
        assert_eq!(merged.headers().get("x-served-by"), Some("decoy"));
        assert_eq!(merged.body().as_ref(), b"{}");
    }

    #[test]
    fn test_keeps_explicit_fields() {
        let response = ResponseDefinition::new()
            .with_status(201)
            .with_header("content-type", "text/plain")
            .with_header("Cache-Control", "max-age=60");
        let merged = defaults().apply(&response);

        assert_eq!(merged.status_code(), 201);
        assert_eq!(merged.headers().get_all("Content-Type"), ["text/plain"]);
        assert_eq!(merged.headers().get_all("cache-control"), ["max-age=60"]);
        assert_eq!(merged.headers().get("X-Served-By"), Some("decoy"));
        // Original untouched
        assert!(response.headers().get("X-Served-By").is_none());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let parsed: DefaultResponse = serde_yaml::from_str("content_type: text/plain").unwrap();
        assert_eq!(parsed.status, 200);
        assert_eq!(parsed.content_type.as_deref(), Some("text/plain"));
        assert!(parsed.headers.is_empty());
    }
}
