//! Declarative stub definitions and their compilation into rules.

use crate::error::RegistrationError;
use crate::predicate::{
    all_of, any_of, body, header, json_path, method, not, path, query_param, FieldPredicate,
    PredicateSet, RequestPredicate, StringMatcher, ValueMatcher,
};
use crate::rule::ResponseDefinition;
use crate::server::HeaderPair;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Options that modify predicate matching behavior.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredicateOptions {
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    /// Negate the match result (NOT operator)
    #[serde(default, skip_serializing_if = "is_false")]
    pub not: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn default_case_sensitive() -> bool {
    true
}

impl Default for PredicateOptions {
    fn default() -> Self {
        Self {
            case_sensitive: default_case_sensitive(),
            not: false,
        }
    }
}

/// Header or query parameter matcher.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum FieldMatcher {
    /// Exact match: `{ name: "X-Api-Key", value: "secret" }`
    Simple {
        name: String,
        value: String,
        #[serde(flatten, default)]
        options: PredicateOptions,
    },

    /// Matches if ANY of the operators match
    Or {
        name: String,
        or: Vec<StringMatcher>,
        #[serde(flatten, default)]
        options: PredicateOptions,
    },

    /// Single operator: `{ name: "Accept", contains: "json" }`
    Full {
        name: String,
        #[serde(flatten)]
        matcher: StringMatcher,
        #[serde(flatten, default)]
        options: PredicateOptions,
    },
}

impl FieldMatcher {
    pub fn name(&self) -> &str {
        match self {
            FieldMatcher::Simple { name, .. } => name,
            FieldMatcher::Or { name, .. } => name,
            FieldMatcher::Full { name, .. } => name,
        }
    }

    fn compile(
        &self,
        build: fn(&str, ValueMatcher) -> FieldPredicate,
    ) -> Result<RequestPredicate, RegistrationError> {
        match self {
            FieldMatcher::Simple {
                name,
                value,
                options,
            } => {
                let field = build(name, ValueMatcher::equals(value.as_str()))
                    .with_case_sensitivity(options.case_sensitive);
                let field: RequestPredicate = Arc::new(field);
                Ok(negate_if(options.not, field))
            }
            FieldMatcher::Or { name, or, options } => {
                let alternatives = or
                    .iter()
                    .map(|m| {
                        let compiled = ValueMatcher::compile(m)?;
                        let field =
                            build(name, compiled).with_case_sensitivity(options.case_sensitive);
                        Ok(Arc::new(field) as RequestPredicate)
                    })
                    .collect::<Result<Vec<_>, RegistrationError>>()?;
                let any: RequestPredicate = Arc::new(any_of(alternatives));
                Ok(negate_if(options.not, any))
            }
            FieldMatcher::Full {
                name,
                matcher,
                options,
            } => {
                let field = build(name, ValueMatcher::compile(matcher)?)
                    .with_case_sensitivity(options.case_sensitive);
                let field: RequestPredicate = Arc::new(field);
                Ok(negate_if(options.not, field))
            }
        }
    }
}

fn negate_if(negate: bool, predicate: RequestPredicate) -> RequestPredicate {
    if negate {
        Arc::new(not(predicate)) as RequestPredicate
    } else {
        predicate
    }
}

/// JSON path body matcher: `{ path: "$.order.id", equals: "7" }`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct JsonPathMatcher {
    pub path: String,
    #[serde(flatten)]
    pub matcher: StringMatcher,
}

/// One predicate entry of a stub; every field present must match.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredicateConfig {
    /// HTTP method, compared case-insensitively
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<StringMatcher>,

    /// Header matchers (all must match)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<FieldMatcher>,

    /// Query parameter matchers (all must match)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<FieldMatcher>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<StringMatcher>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<JsonPathMatcher>,

    /// Applies to path, body and JSON path matchers, and `not` to the whole entry
    #[serde(flatten, default)]
    pub options: PredicateOptions,
}

impl PredicateConfig {
    /// Compile into request predicates; a negated entry compiles to one predicate.
    pub fn compile(&self) -> Result<Vec<RequestPredicate>, RegistrationError> {
        let case_sensitive = self.options.case_sensitive;
        let mut compiled: Vec<RequestPredicate> = Vec::new();

        if let Some(name) = &self.method {
            compiled.push(Arc::new(method(name)));
        }
        if let Some(matcher) = &self.path {
            let field = path(ValueMatcher::compile(matcher)?).with_case_sensitivity(case_sensitive);
            compiled.push(Arc::new(field));
        }
        for matcher in &self.headers {
            compiled.push(matcher.compile(header)?);
        }
        for matcher in &self.query {
            compiled.push(matcher.compile(query_param)?);
        }
        if let Some(matcher) = &self.body {
            let field = body(ValueMatcher::compile(matcher)?).with_case_sensitivity(case_sensitive);
            compiled.push(Arc::new(field));
        }
        if let Some(jp) = &self.json_path {
            let field = json_path(&jp.path, ValueMatcher::compile(&jp.matcher)?)?
                .with_case_sensitivity(case_sensitive);
            compiled.push(Arc::new(field));
        }

        if self.options.not {
            let negated: RequestPredicate = Arc::new(not(all_of(compiled)));
            return Ok(vec![negated]);
        }
        Ok(compiled)
    }
}

/// One canned response of a stub.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseConfig {
    /// Left unset, the server default status applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderPair>,

    /// Body text, sent as UTF-8
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Raw body bytes, base64 encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_base64: Option<String>,

    #[serde(default)]
    pub delay_ms: u64,
}

impl ResponseConfig {
    pub fn compile(&self) -> Result<ResponseDefinition, RegistrationError> {
        let mut response = ResponseDefinition::new().with_delay(Duration::from_millis(self.delay_ms));
        if let Some(status) = self.status {
            response = response.with_status(status);
        }
        for h in &self.headers {
            response = response.with_header(h.name.as_str(), h.value.as_str());
        }

        match (&self.body, &self.body_base64) {
            (Some(_), Some(_)) => {
                return Err(RegistrationError::InvalidBody(
                    "body and bodyBase64 are mutually exclusive".to_string(),
                ))
            }
            (Some(text), None) => response = response.with_body(text.clone()),
            (None, Some(encoded)) => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(encoded)
                    .map_err(|e| RegistrationError::InvalidBody(format!("invalid bodyBase64: {e}")))?;
                response = response.with_body(bytes);
            }
            (None, None) => {}
        }
        Ok(response)
    }
}

fn match_everything() -> Option<Vec<PredicateConfig>> {
    Some(Vec::new())
}

/// A declarative stub rule.
///
/// Omitting `predicates` matches every request; an explicit `null` is rejected.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StubConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default = "match_everything")]
    pub predicates: Option<Vec<PredicateConfig>>,

    #[serde(default)]
    pub responses: Vec<ResponseConfig>,
}

/// A stub ready to be registered.
#[derive(Debug, Clone)]
pub struct CompiledStub {
    pub id: Option<String>,
    pub predicates: PredicateSet,
    pub responses: Vec<ResponseDefinition>,
}

impl StubConfig {
    pub fn compile(&self) -> Result<CompiledStub, RegistrationError> {
        let Some(predicates) = &self.predicates else {
            return Err(RegistrationError::MissingPredicates);
        };
        if self.responses.is_empty() {
            return Err(RegistrationError::EmptyResponses);
        }

        let mut set = PredicateSet::new();
        for predicate in predicates {
            set.extend(predicate.compile()?);
        }
        let responses = self
            .responses
            .iter()
            .map(ResponseConfig::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledStub {
            id: self.id.clone(),
            predicates: set,
            responses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;

    fn stub(yaml: &str) -> StubConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_omitted_predicates_match_everything() {
        let compiled = stub("responses: [{status: 204}]").compile().unwrap();
        assert!(compiled.predicates.is_empty());
        assert!(compiled
            .predicates
            .matches(&Request::builder("DELETE", "/x").build()));
        assert_eq!(compiled.responses[0].status_code(), 204);
    }

    #[test]
    fn test_null_predicates_rejected() {
        let err = stub("predicates: null\nresponses: [{status: 200}]")
            .compile()
            .unwrap_err();
        assert_eq!(err, RegistrationError::MissingPredicates);
    }

    #[test]
    fn test_missing_responses_rejected() {
        let err = stub("predicates: []").compile().unwrap_err();
        assert_eq!(err, RegistrationError::EmptyResponses);
    }

    #[test]
    fn test_full_predicate_entry() {
        let compiled = stub(
            r#"
id: create-order
predicates:
  - method: post
    path: { startsWith: /orders }
    headers:
      - { name: Content-Type, contains: json }
      - { name: X-Tenant, value: acme }
    query:
      - name: dry_run
        or: [{ equals: "true" }, { equals: "1" }]
    jsonPath: { path: "$.item", equals: widget }
responses:
  - status: 201
    headers:
      - { name: Location, value: /orders/1 }
    body: '{"id":1}'
"#,
        )
        .compile()
        .unwrap();

        assert_eq!(compiled.id.as_deref(), Some("create-order"));
        assert_eq!(compiled.predicates.len(), 6);

        let request = Request::builder("POST", "/orders")
            .raw_query("dry_run=1")
            .header("content-type", "application/json")
            .header("X-Tenant", "acme")
            .body(r#"{"item":"widget"}"#)
            .build();
        assert!(compiled.predicates.matches(&request));

        let other = Request::builder("POST", "/orders")
            .header("content-type", "application/json")
            .header("X-Tenant", "acme")
            .body(r#"{"item":"widget"}"#)
            .build();
        assert!(!compiled.predicates.matches(&other));

        let response = &compiled.responses[0];
        assert_eq!(response.status_code(), 201);
        assert_eq!(response.headers().get("location"), Some("/orders/1"));
        assert_eq!(response.body().as_ref(), br#"{"id":1}"#);
    }

    #[test]
    fn test_case_insensitive_and_not() {
        let compiled = stub(
            r#"
predicates:
  - path: { equals: /Health }
    caseSensitive: false
  - headers: [{ name: X-Debug, exists: true }]
    not: true
responses: [{}]
"#,
        )
        .compile()
        .unwrap();

        let plain = Request::builder("GET", "/health").build();
        assert!(compiled.predicates.matches(&plain));

        let debug = Request::builder("GET", "/health").header("X-Debug", "1").build();
        assert!(!compiled.predicates.matches(&debug));
    }

    #[test]
    fn test_simple_field_entry_honours_options() {
        let compiled = stub(
            r#"
predicates:
  - headers:
      - { name: X-Env, value: prod, not: true }
      - { name: X-Tenant, value: ACME, caseSensitive: false }
responses: [{}]
"#,
        )
        .compile()
        .unwrap();

        let staging = Request::builder("GET", "/")
            .header("X-Env", "staging")
            .header("X-Tenant", "acme")
            .build();
        assert!(compiled.predicates.matches(&staging));

        let prod = Request::builder("GET", "/")
            .header("X-Env", "prod")
            .header("X-Tenant", "acme")
            .build();
        assert!(!compiled.predicates.matches(&prod));
        assert!(compiled.predicates.describe().contains("not (header \"X-Env\" equal to \"prod\")"));
    }

    #[test]
    fn test_json_form_of_path_and_body_operators() {
        let config: StubConfig = serde_json::from_str(
            r#"{"predicates": [{"path": {"equals": "/a"}, "body": {"contains": "ping"}}],
                "responses": [{"status": 202}]}"#,
        )
        .unwrap();
        let compiled = config.compile().unwrap();

        let request = Request::builder("POST", "/a").body("ping pong").build();
        assert!(compiled.predicates.matches(&request));
        assert_eq!(compiled.responses[0].status_code(), 202);
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = serde_yaml::from_str::<StubConfig>(
            "predicates: [{path: {resembles: /a}}]\nresponses: [{}]",
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected one of equals"), "{err}");
    }

    #[test]
    fn test_body_base64_and_delay() {
        let compiled = stub("responses: [{bodyBase64: AAEC/w==, delayMs: 50}]")
            .compile()
            .unwrap();
        let response = &compiled.responses[0];
        assert_eq!(response.body().as_ref(), &[0x00, 0x01, 0x02, 0xff]);
        assert_eq!(response.delay(), Duration::from_millis(50));
        assert_eq!(response.explicit_status(), None);
    }

    #[test]
    fn test_invalid_bodies_rejected() {
        let err = stub("responses: [{body: x, bodyBase64: eA==}]").compile().unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidBody(_)));

        let err = stub("responses: [{bodyBase64: '***'}]").compile().unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidBody(_)));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = stub("predicates: [{path: {matches: '(unclosed'}}]\nresponses: [{}]")
            .compile()
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidPattern { .. }));
    }
}
