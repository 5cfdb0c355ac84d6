//! Predicates over a single request field.

use super::string_matcher::ValueMatcher;
use super::Predicate;
use crate::error::RegistrationError;
use crate::request::Request;
use serde_json_path::JsonPath;
use std::borrow::Cow;

/// Longest field value quoted verbatim in a mismatch report.
const MAX_QUOTED_LEN: usize = 120;

/// The part of a request a [`FieldPredicate`] inspects.
#[derive(Debug, Clone)]
pub enum Field {
    Method,
    Path,
    /// Header by name, compared case-insensitively
    Header(String),
    /// Query parameter by name, compared exactly
    Query(String),
    /// Body decoded as text; an empty body is absent
    Body,
    /// First node selected by an RFC 9535 JSON path over the body
    JsonPath { expr: String, path: JsonPath },
}

impl Field {
    fn label(&self) -> String {
        match self {
            Field::Method => "method".to_string(),
            Field::Path => "path".to_string(),
            Field::Header(name) => format!("header {name:?}"),
            Field::Query(name) => format!("query parameter {name:?}"),
            Field::Body => "body".to_string(),
            Field::JsonPath { expr, .. } => format!("body at {expr}"),
        }
    }

    /// Values of this field in `request`; empty when the field is missing.
    fn values<'r>(&self, request: &'r Request) -> Vec<Cow<'r, str>> {
        match self {
            Field::Method => vec![Cow::Borrowed(request.method())],
            Field::Path => vec![Cow::Borrowed(request.path())],
            Field::Header(name) => request
                .headers()
                .get_all(name)
                .iter()
                .map(|v| Cow::Borrowed(v.as_str()))
                .collect(),
            Field::Query(name) => request
                .query()
                .get_all(name)
                .iter()
                .map(|v| Cow::Borrowed(v.as_str()))
                .collect(),
            Field::Body if request.body().is_empty() => Vec::new(),
            Field::Body => vec![request.body_text()],
            Field::JsonPath { path, .. } => {
                let Ok(json) = serde_json::from_str::<serde_json::Value>(&request.body_text())
                else {
                    return Vec::new();
                };
                let nodes = path.query(&json);
                nodes
                    .iter()
                    .next()
                    .map(|node| match node {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .map(Cow::Owned)
                    .into_iter()
                    .collect()
            }
        }
    }
}

/// Matches one request field against a [`ValueMatcher`].
///
/// Multi-valued fields (headers, query parameters) match when any value
/// matches. A missing field is presented to the matcher as `None`.
#[derive(Debug, Clone)]
pub struct FieldPredicate {
    field: Field,
    matcher: ValueMatcher,
    case_sensitive: bool,
}

impl FieldPredicate {
    pub fn new(field: Field, matcher: ValueMatcher) -> Self {
        Self {
            field,
            matcher,
            case_sensitive: true,
        }
    }

    /// Compare values ignoring case (regex matchers are unaffected).
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    pub fn with_case_sensitivity(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn field(&self) -> &Field {
        &self.field
    }
}

impl Predicate<Request> for FieldPredicate {
    fn matches(&self, request: &Request) -> bool {
        let values = self.field.values(request);
        if values.is_empty() {
            return self.matcher.matches(None, self.case_sensitive);
        }
        values
            .iter()
            .any(|v| self.matcher.matches(Some(v.as_ref()), self.case_sensitive))
    }

    fn describe(&self) -> String {
        format!("{} {}", self.field.label(), self.matcher.describe())
    }

    fn describe_mismatch(&self, request: &Request) -> String {
        let values = self.field.values(request);
        let actual = match values.as_slice() {
            [] => "was absent".to_string(),
            [single] => format!("was {}", quote(single)),
            many => format!(
                "was [{}]",
                many.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", ")
            ),
        };
        format!("{} but {actual}", self.describe())
    }
}

fn quote(value: &str) -> String {
    if value.chars().count() > MAX_QUOTED_LEN {
        let truncated: String = value.chars().take(MAX_QUOTED_LEN).collect();
        format!("{truncated:?}...")
    } else {
        format!("{value:?}")
    }
}

/// Method equality; methods always compare case-insensitively.
pub fn method(name: &str) -> FieldPredicate {
    FieldPredicate::new(Field::Method, ValueMatcher::equals(name)).case_insensitive()
}

pub fn path(matcher: ValueMatcher) -> FieldPredicate {
    FieldPredicate::new(Field::Path, matcher)
}

/// Exact path equality.
pub fn path_eq(value: &str) -> FieldPredicate {
    path(ValueMatcher::equals(value))
}

pub fn header(name: &str, matcher: ValueMatcher) -> FieldPredicate {
    FieldPredicate::new(Field::Header(name.to_string()), matcher)
}

pub fn query_param(name: &str, matcher: ValueMatcher) -> FieldPredicate {
    FieldPredicate::new(Field::Query(name.to_string()), matcher)
}

/// Match the body as text. A request without a body has no body value, so
/// only [`ValueMatcher::absent`] matches it.
pub fn body(matcher: ValueMatcher) -> FieldPredicate {
    FieldPredicate::new(Field::Body, matcher)
}

/// Match the first node selected by `expr` in a JSON body.
///
/// String nodes are compared by content, other nodes by their JSON text.
pub fn json_path(expr: &str, matcher: ValueMatcher) -> Result<FieldPredicate, RegistrationError> {
    let path = JsonPath::parse(expr).map_err(|e| RegistrationError::pattern(expr, e))?;
    Ok(FieldPredicate::new(
        Field::JsonPath {
            expr: expr.to_string(),
            path,
        },
        matcher,
    ))
}
