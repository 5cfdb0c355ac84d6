//! Immutable snapshot of an inbound request.
//!
//! A [`Request`] is built exactly once per inbound exchange from raw transport
//! data and is never modified afterwards. The same value is used for rule
//! matching and for the request history.

mod multimap;

pub use multimap::{parse_query_string, MultiMap};

use bytes::Bytes;
use std::borrow::Cow;

/// Inbound HTTP request as seen by the matching engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: String,
    path: String,
    raw_query: Option<String>,
    query: MultiMap,
    headers: MultiMap,
    body: Bytes,
    encoding: Option<String>,
}

impl Request {
    /// Start building a request for `method` and `path`.
    pub fn builder(method: impl Into<String>, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, path)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string as received, without the leading `?`.
    pub fn query_string(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    pub fn query(&self) -> &MultiMap {
        &self.query
    }

    pub fn headers(&self) -> &MultiMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Character encoding of the body (the `charset` of `Content-Type` unless
    /// set explicitly).
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Body decoded as text using the request encoding.
    ///
    /// ISO-8859-1 bodies are mapped byte to char; everything else is decoded
    /// as UTF-8 with replacement characters for invalid sequences.
    pub fn body_text(&self) -> Cow<'_, str> {
        match self.encoding.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("iso-8859-1") | Some("latin1") | Some("latin-1") => {
                Cow::Owned(self.body.iter().map(|&b| char::from(b)).collect())
            }
            _ => String::from_utf8_lossy(&self.body),
        }
    }
}

/// Builder for [`Request`]; consumed by [`RequestBuilder::build`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: String,
    path: String,
    raw_query: Option<String>,
    query: MultiMap,
    headers: MultiMap,
    body: Bytes,
    encoding: Option<String>,
}

impl RequestBuilder {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            raw_query: None,
            query: MultiMap::new(),
            headers: MultiMap::headers(),
            body: Bytes::new(),
            encoding: None,
        }
    }

    /// Set the raw query string; parameters are parsed from it.
    pub fn raw_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        let query = query.strip_prefix('?').map(str::to_string).unwrap_or(query);
        self.query = parse_query_string(&query);
        self.raw_query = Some(query);
        self
    }

    /// Append a single query parameter.
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        let encoded = format!(
            "{}={}",
            urlencoding::encode(&key),
            urlencoding::encode(&value)
        );
        self.raw_query = Some(match self.raw_query.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
            _ => encoded,
        });
        self.query.append(key, value);
        self
    }

    /// Append a header value; repeated names keep every value in order.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn build(self) -> Request {
        let encoding = self
            .encoding
            .or_else(|| self.headers.get("content-type").and_then(charset_of));
        Request {
            method: self.method,
            path: self.path,
            raw_query: self.raw_query,
            query: self.query,
            headers: self.headers,
            body: self.body,
            encoding,
        }
    }
}

/// Extract the `charset` parameter from a `Content-Type` value.
fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}
