//! Canned response definitions.

use crate::request::MultiMap;
use bytes::Bytes;
use std::time::Duration;

/// Status used when a definition leaves it unset and no default applies.
pub const DEFAULT_STATUS: u16 = 200;

/// A response a rule can hand out.
///
/// Immutable once registered. Fields left unset (status, headers) are
/// filled in by the transport layer from its defaults, never by the rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDefinition {
    status: Option<u16>,
    headers: MultiMap,
    body: Bytes,
    delay: Duration,
}

impl Default for ResponseDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseDefinition {
    /// Empty response with no explicit status, no headers and no delay.
    pub fn new() -> Self {
        Self {
            status: None,
            headers: MultiMap::headers(),
            body: Bytes::new(),
            delay: Duration::ZERO,
        }
    }

    /// `200 OK` with an explicit status.
    pub fn ok() -> Self {
        Self::new().with_status(DEFAULT_STATUS)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Append a header; repeated names are kept in order.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Status to send, falling back to 200.
    pub fn status_code(&self) -> u16 {
        self.status.unwrap_or(DEFAULT_STATUS)
    }

    /// Status as registered, `None` when left for defaults to fill in.
    pub fn explicit_status(&self) -> Option<u16> {
        self.status
    }

    pub fn headers(&self) -> &MultiMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
