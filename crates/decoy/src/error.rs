//! Error types for registration, dispatch, verification and serving.

use std::net::SocketAddr;
use thiserror::Error;

/// A stub rule could not be registered.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistrationError {
    #[error("invalid rule: a rule needs at least one response")]
    EmptyResponses,
    #[error("invalid rule: predicates must be a list (use an empty list to match every request)")]
    MissingPredicates,
    #[error("invalid rule: bad pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("invalid rule: bad response body: {0}")]
    InvalidBody(String),
}

impl RegistrationError {
    pub fn pattern(pattern: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Mismatch report for a single rule, used when nothing matched.
#[derive(Debug, Clone, PartialEq)]
pub struct NearMiss {
    pub rule_index: usize,
    pub rule_id: Option<String>,
    pub mismatch: String,
}

/// No registered rule matched an inbound request.
///
/// Fatal for that request only; the repository is left untouched.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("no stub rule matched {method} {target}")]
pub struct NoMatchingRule {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    target: String,
    pub near_misses: Vec<NearMiss>,
}

impl NoMatchingRule {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        query: Option<String>,
        near_misses: Vec<NearMiss>,
    ) -> Self {
        let path = path.into();
        let target = match &query {
            Some(q) if !q.is_empty() => format!("{path}?{q}"),
            _ => path.clone(),
        };
        Self {
            method: method.into(),
            path,
            query,
            target,
            near_misses,
        }
    }

    /// Multi-line report listing why each registered rule rejected the request.
    pub fn diagnostic(&self) -> String {
        let mut out = format!("{self}\n");
        if self.near_misses.is_empty() {
            out.push_str("no rules are registered\n");
            return out;
        }
        for miss in &self.near_misses {
            match &miss.rule_id {
                Some(id) => out.push_str(&format!("rule #{} ({id}):\n", miss.rule_index)),
                None => out.push_str(&format!("rule #{}:\n", miss.rule_index)),
            }
            out.push_str(&miss.mismatch);
            out.push('\n');
        }
        out
    }
}

/// Verification against the request history failed or could not run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum VerificationError {
    /// The observed count did not satisfy the expectation.
    #[error("{message}")]
    Failure { message: String },
    /// Recording was switched off at some point in this session, so the
    /// history cannot tell "no requests" apart from "not recorded".
    #[error("cannot verify requests: request recording was disabled in this session")]
    RecordingDisabled,
    #[error("expected request count must not be negative, got {0}")]
    NegativeCount(i64),
}

/// The embedded HTTP server could not be started or stopped.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server is not running")]
    NotRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_matching_rule_display() {
        let err = NoMatchingRule::new("GET", "/b", Some("x=1".to_string()), vec![]);
        assert_eq!(err.to_string(), "no stub rule matched GET /b?x=1");

        let err = NoMatchingRule::new("POST", "/b", None, vec![]);
        assert_eq!(err.to_string(), "no stub rule matched POST /b");
    }

    #[test]
    fn test_no_matching_rule_diagnostic() {
        let err = NoMatchingRule::new(
            "GET",
            "/b",
            None,
            vec![NearMiss {
                rule_index: 0,
                rule_id: Some("users".to_string()),
                mismatch: "    path equal to \"/a\" but was \"/b\"".to_string(),
            }],
        );
        let text = err.diagnostic();
        assert!(text.starts_with("no stub rule matched GET /b\n"));
        assert!(text.contains("rule #0 (users):\n"));
        assert!(text.contains("path equal to \"/a\" but was \"/b\""));
    }

    #[test]
    fn test_invalid_pattern_message() {
        let err = regex::Regex::new("(unclosed").unwrap_err();
        let converted = RegistrationError::pattern("(unclosed", err);
        assert!(converted.to_string().starts_with("invalid rule: bad pattern \"(unclosed\""));
    }
}
