//! String matching operators and their compiled form.

use crate::error::RegistrationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// String matching operator as written in stub configuration.
///
/// Written as a single-key map: `{equals: x}`, `{contains: x}`,
/// `{startsWith: x}`, `{endsWith: x}`, `{matches: regex}` or `{exists: bool}`.
/// The same shape is accepted from YAML and JSON, and also when the operator
/// key sits next to other keys of a flattened entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(try_from = "OperatorKeys", into = "OperatorKeys")]
pub enum StringMatcher {
    Equals(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Matches(String),
    Exists(bool),
}

/// Wire shape of [`StringMatcher`]: every operator key optional, exactly one set.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct OperatorKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    equals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    starts_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ends_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    matches: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
}

impl TryFrom<OperatorKeys> for StringMatcher {
    type Error = String;

    fn try_from(keys: OperatorKeys) -> Result<Self, Self::Error> {
        let mut found = Vec::with_capacity(1);
        if let Some(v) = keys.equals {
            found.push(StringMatcher::Equals(v));
        }
        if let Some(v) = keys.contains {
            found.push(StringMatcher::Contains(v));
        }
        if let Some(v) = keys.starts_with {
            found.push(StringMatcher::StartsWith(v));
        }
        if let Some(v) = keys.ends_with {
            found.push(StringMatcher::EndsWith(v));
        }
        if let Some(v) = keys.matches {
            found.push(StringMatcher::Matches(v));
        }
        if let Some(v) = keys.exists {
            found.push(StringMatcher::Exists(v));
        }

        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err("expected one of equals, contains, startsWith, endsWith, matches, exists".into()),
            n => Err(format!("expected a single string operator, found {n}")),
        }
    }
}

impl From<StringMatcher> for OperatorKeys {
    fn from(matcher: StringMatcher) -> Self {
        let mut keys = OperatorKeys::default();
        match matcher {
            StringMatcher::Equals(v) => keys.equals = Some(v),
            StringMatcher::Contains(v) => keys.contains = Some(v),
            StringMatcher::StartsWith(v) => keys.starts_with = Some(v),
            StringMatcher::EndsWith(v) => keys.ends_with = Some(v),
            StringMatcher::Matches(v) => keys.matches = Some(v),
            StringMatcher::Exists(v) => keys.exists = Some(v),
        }
        keys
    }
}

/// How a textual expectation is compared against a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
}

impl TextOp {
    fn holds(self, value: &str, expected: &str) -> bool {
        match self {
            TextOp::Equals => value == expected,
            TextOp::Contains => value.contains(expected),
            TextOp::StartsWith => value.starts_with(expected),
            TextOp::EndsWith => value.ends_with(expected),
        }
    }

    fn verb(self) -> &'static str {
        match self {
            TextOp::Equals => "equal to",
            TextOp::Contains => "containing",
            TextOp::StartsWith => "starting with",
            TextOp::EndsWith => "ending with",
        }
    }
}

/// Compiled string matcher used at match time.
///
/// Text operators keep the expected value in its original and lowercased
/// forms, so case-insensitive matching only folds the incoming value.
#[derive(Debug, Clone)]
pub enum ValueMatcher {
    Text {
        op: TextOp,
        expected: String,
        folded: String,
    },
    Regex(Arc<Regex>),
    Exists(bool),
}

impl ValueMatcher {
    pub fn compile(matcher: &StringMatcher) -> Result<Self, RegistrationError> {
        match matcher {
            StringMatcher::Equals(v) => Ok(Self::equals(v.as_str())),
            StringMatcher::Contains(v) => Ok(Self::contains(v.as_str())),
            StringMatcher::StartsWith(v) => Ok(Self::starts_with(v.as_str())),
            StringMatcher::EndsWith(v) => Ok(Self::ends_with(v.as_str())),
            StringMatcher::Matches(pattern) => Self::regex(pattern),
            StringMatcher::Exists(exists) => Ok(ValueMatcher::Exists(*exists)),
        }
    }

    fn text(op: TextOp, expected: impl Into<String>) -> Self {
        let expected = expected.into();
        let folded = expected.to_lowercase();
        ValueMatcher::Text {
            op,
            expected,
            folded,
        }
    }

    pub fn equals(value: impl Into<String>) -> Self {
        Self::text(TextOp::Equals, value)
    }

    pub fn contains(value: impl Into<String>) -> Self {
        Self::text(TextOp::Contains, value)
    }

    pub fn starts_with(value: impl Into<String>) -> Self {
        Self::text(TextOp::StartsWith, value)
    }

    pub fn ends_with(value: impl Into<String>) -> Self {
        Self::text(TextOp::EndsWith, value)
    }

    pub fn regex(pattern: &str) -> Result<Self, RegistrationError> {
        let regex = Regex::new(pattern).map_err(|e| RegistrationError::pattern(pattern, e))?;
        Ok(ValueMatcher::Regex(Arc::new(regex)))
    }

    pub fn present() -> Self {
        ValueMatcher::Exists(true)
    }

    pub fn absent() -> Self {
        ValueMatcher::Exists(false)
    }

    /// Check a value against this matcher.
    ///
    /// `value` is `None` when the field is missing. Only `exists` can match a
    /// missing field. Regex matching ignores `case_sensitive`; use `(?i)` in
    /// the pattern instead.
    pub fn matches(&self, value: Option<&str>, case_sensitive: bool) -> bool {
        match (self, value) {
            (ValueMatcher::Exists(should_exist), v) => *should_exist == v.is_some(),
            (_, None) => false,
            (ValueMatcher::Regex(regex), Some(v)) => regex.is_match(v),
            (ValueMatcher::Text { op, expected, .. }, Some(v)) if case_sensitive => {
                op.holds(v, expected)
            }
            (ValueMatcher::Text { op, folded, .. }, Some(v)) => {
                op.holds(&v.to_lowercase(), folded)
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ValueMatcher::Text { op, expected, .. } => format!("{} {:?}", op.verb(), expected),
            ValueMatcher::Regex(regex) => format!("matching /{}/", regex.as_str()),
            ValueMatcher::Exists(true) => "present".to_string(),
            ValueMatcher::Exists(false) => "absent".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals() {
        let matcher = ValueMatcher::equals("test");

        assert!(matcher.matches(Some("test"), true));
        assert!(!matcher.matches(Some("TEST"), true));
        assert!(matcher.matches(Some("TEST"), false));
        assert!(!matcher.matches(None, true));
    }

    #[test]
    fn test_prefix_suffix_contains() {
        assert!(ValueMatcher::starts_with("/api").matches(Some("/api/v1"), true));
        assert!(!ValueMatcher::starts_with("/api").matches(Some("/v1/api"), true));
        assert!(ValueMatcher::ends_with(".json").matches(Some("/data.JSON"), false));
        assert!(!ValueMatcher::ends_with(".json").matches(Some("/data.JSON"), true));
        assert!(ValueMatcher::contains("api").matches(Some("my-api-service"), true));
        assert!(ValueMatcher::contains("Api").matches(Some("MY-API-SERVICE"), false));
    }

    #[test]
    fn test_regex() {
        let matcher = ValueMatcher::regex(r"^/api/v\d+/").unwrap();

        assert!(matcher.matches(Some("/api/v1/users"), true));
        assert!(!matcher.matches(Some("/api/users"), true));
        assert!(!matcher.matches(None, true));
    }

    #[test]
    fn test_invalid_regex_is_registration_error() {
        let err = ValueMatcher::regex("(unclosed").unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_exists() {
        assert!(ValueMatcher::present().matches(Some(""), true));
        assert!(!ValueMatcher::present().matches(None, true));
        assert!(ValueMatcher::absent().matches(None, true));
        assert!(!ValueMatcher::absent().matches(Some("x"), true));
    }

    #[test]
    fn test_describe() {
        assert_eq!(ValueMatcher::equals("/a").describe(), "equal to \"/a\"");
        assert_eq!(ValueMatcher::contains("x").describe(), "containing \"x\"");
        assert_eq!(ValueMatcher::regex("^a+$").unwrap().describe(), "matching /^a+$/");
        assert_eq!(ValueMatcher::absent().describe(), "absent");
    }

    #[test]
    fn test_operator_keys_from_json_and_yaml() {
        let matcher: StringMatcher = serde_json::from_str(r#"{"equals": "test"}"#).unwrap();
        assert_eq!(matcher, StringMatcher::Equals("test".to_string()));

        let matcher: StringMatcher = serde_json::from_str(r#"{"matches": "^/api/v\\d+"}"#).unwrap();
        assert_eq!(matcher, StringMatcher::Matches(r"^/api/v\d+".to_string()));

        let matcher: StringMatcher = serde_yaml::from_str("{ startsWith: /api }").unwrap();
        assert_eq!(matcher, StringMatcher::StartsWith("/api".to_string()));

        let matcher: StringMatcher = serde_yaml::from_str("exists: false").unwrap();
        assert_eq!(matcher, StringMatcher::Exists(false));
    }

    #[test]
    fn test_operator_keys_require_exactly_one() {
        assert!(serde_json::from_str::<StringMatcher>("{}").is_err());
        assert!(serde_json::from_str::<StringMatcher>(r#"{"equals": "a", "contains": "b"}"#).is_err());
    }

    #[test]
    fn test_operator_serializes_as_single_key() {
        let json = serde_json::to_string(&StringMatcher::EndsWith(".xml".into())).unwrap();
        assert_eq!(json, r#"{"endsWith":".xml"}"#);
    }

    #[test]
    fn test_compile_from_config() {
        let compiled = ValueMatcher::compile(&StringMatcher::EndsWith(".xml".into())).unwrap();
        assert!(compiled.matches(Some("feed.xml"), true));
    }
}
