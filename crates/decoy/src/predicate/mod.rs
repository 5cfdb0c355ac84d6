//! Request predicates and the AND-combinator used by rules and verification.
//!
//! A [`Predicate`] is a boolean condition with a human-readable description
//! and a mismatch explanation. Rules and verification calls hold a
//! [`PredicateSet`], which matches a request only if every member matches.
//!
//! # Module Structure
//!
//! - `string_matcher` - String operators (equals, contains, startsWith, ...) and their compiled,
//!   case-folding form
//! - `field` - Predicates over a single request field (method, path, header, query, body)
//! - `logical` - NOT / OR / AND combinators and closure predicates
//! - `count` - Predicates over request counts used by verification

mod count;
mod field;
mod logical;
mod string_matcher;

pub use count::CountMatcher;
pub use field::{
    body, header, json_path, method, path, path_eq, query_param, Field, FieldPredicate,
};
pub use logical::{all_of, any_of, custom, not, AllOf, AnyOf, Custom, Not};
pub use string_matcher::{StringMatcher, TextOp, ValueMatcher};

use crate::request::Request;
use std::fmt;
use std::sync::Arc;

/// Indentation applied to each line of a mismatch report.
pub const MISMATCH_INDENT: &str = "    ";

/// A condition over `T` that can explain itself.
pub trait Predicate<T: ?Sized>: Send + Sync {
    /// Whether `item` satisfies the condition. Must not mutate shared state.
    fn matches(&self, item: &T) -> bool;

    /// Description of the condition, e.g. `path equal to "/a"`.
    fn describe(&self) -> String;

    /// Why `item` does not satisfy the condition.
    fn describe_mismatch(&self, item: &T) -> String;
}

impl<T: ?Sized, P: Predicate<T> + ?Sized> Predicate<T> for Arc<P> {
    fn matches(&self, item: &T) -> bool {
        (**self).matches(item)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn describe_mismatch(&self, item: &T) -> String {
        (**self).describe_mismatch(item)
    }
}

/// Shared, type-erased request predicate.
pub type RequestPredicate = Arc<dyn Predicate<Request>>;

/// Ordered set of request predicates combined with logical AND.
///
/// Evaluation order is insertion order, so descriptions and mismatch
/// reports are stable across calls.
#[derive(Clone, Default)]
pub struct PredicateSet {
    predicates: Vec<RequestPredicate>,
}

impl PredicateSet {
    /// An empty set; matches every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate, builder style.
    pub fn with(mut self, predicate: impl Predicate<Request> + 'static) -> Self {
        self.predicates.push(Arc::new(predicate));
        self
    }

    pub fn push(&mut self, predicate: RequestPredicate) {
        self.predicates.push(predicate);
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestPredicate> {
        self.predicates.iter()
    }

    /// True iff every predicate matches; vacuously true when empty.
    pub fn matches(&self, request: &Request) -> bool {
        self.predicates.iter().all(|p| p.matches(request))
    }

    /// Descriptions joined with `AND`, or `no conditions` when empty.
    pub fn describe(&self) -> String {
        if self.predicates.is_empty() {
            return "no conditions".to_string();
        }
        self.predicates
            .iter()
            .map(|p| p.describe())
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Indented mismatch text of every failing predicate, joined with `" AND\n"`.
    ///
    /// Empty when the request matches.
    pub fn describe_mismatch(&self, request: &Request) -> String {
        self.predicates
            .iter()
            .filter(|p| !p.matches(request))
            .map(|p| format!("{MISMATCH_INDENT}{}", p.describe_mismatch(request)))
            .collect::<Vec<_>>()
            .join(" AND\n")
    }
}

impl fmt::Debug for PredicateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PredicateSet").field(&self.describe()).finish()
    }
}

impl FromIterator<RequestPredicate> for PredicateSet {
    fn from_iter<I: IntoIterator<Item = RequestPredicate>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

impl Extend<RequestPredicate> for PredicateSet {
    fn extend<I: IntoIterator<Item = RequestPredicate>>(&mut self, iter: I) {
        self.predicates.extend(iter);
    }
}

impl Predicate<Request> for PredicateSet {
    fn matches(&self, item: &Request) -> bool {
        PredicateSet::matches(self, item)
    }

    fn describe(&self) -> String {
        PredicateSet::describe(self)
    }

    fn describe_mismatch(&self, item: &Request) -> String {
        PredicateSet::describe_mismatch(self, item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(path: &str) -> Request {
        Request::builder("GET", path).build()
    }

    #[test]
    fn test_empty_set_matches_everything() {
        let set = PredicateSet::new();
        assert!(set.matches(&get("/anything")));
        assert!(set.matches(&Request::builder("DELETE", "/").body("x").build()));
        assert_eq!(set.describe(), "no conditions");
        assert_eq!(set.describe_mismatch(&get("/")), "");
    }

    #[test]
    fn test_all_predicates_must_match() {
        let set = PredicateSet::new()
            .with(method("GET"))
            .with(path_eq("/a"));

        assert!(set.matches(&get("/a")));
        assert!(!set.matches(&get("/b")));
        assert!(!set.matches(&Request::builder("POST", "/a").build()));
    }

    #[test]
    fn test_describe_joins_with_and() {
        let set = PredicateSet::new()
            .with(method("GET"))
            .with(path_eq("/a"));
        assert_eq!(
            set.describe(),
            "method equal to \"GET\" AND path equal to \"/a\""
        );
    }

    #[test]
    fn test_describe_mismatch_lists_only_failures_in_order() {
        let set = PredicateSet::new()
            .with(method("POST"))
            .with(path_eq("/a"))
            .with(header("X-Id", ValueMatcher::present()));

        let report = set.describe_mismatch(&get("/a"));
        assert_eq!(
            report,
            "    method equal to \"POST\" but was \"GET\" AND\n    header \"X-Id\" present but was absent"
        );
        // Stable across calls
        assert_eq!(report, set.describe_mismatch(&get("/a")));
    }
}
